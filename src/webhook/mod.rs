//! Transport layer for outbound webhook calls.
//!
//! - Request/response values ([`HttpRequest`], [`HttpResponse`])
//! - The client seam ([`HttpClient`]) and its reqwest implementation
//!   ([`ReqwestClient`])
//! - Transport errors ([`HttpError`])
//!
//! Nothing here knows about targets, retries or outcomes; see
//! [`crate::delivery`] for that.

mod client;
mod error;
mod http;


pub use client::{ReqwestClient, USER_AGENT};
pub use error::HttpError;
pub use http::{HttpClient, HttpRequest, HttpResponse};
