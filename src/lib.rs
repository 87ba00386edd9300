//! ocr-hook: asynchronous webhook delivery for OCR/PDF results
//!
//! A library for delivering finished processing results to configured
//! HTTP targets, with per-target timeouts, retry with backoff, and an
//! in-memory record of every delivery outcome.

pub mod config;
pub mod delivery;
pub mod target;
pub mod time;
pub mod webhook;
