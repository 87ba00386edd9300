//! Standard JSON envelope for OCR and PDF results.
//!
//! Producers that do not need a custom body can wrap their raw result in a
//! [`ResultEnvelope`], which adds a timestamp, the combined text and a small
//! metadata block.

use std::time::SystemTime;

use serde::Serialize;
use serde_json::{Value, json};

use super::DeliveryPayload;

/// Value of the envelope's `source` field.
pub const SOURCE: &str = "paddleocr-microservice";

/// Whether the processed file was a PDF or an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Image,
}

impl FileType {
    /// `Pdf` for names ending in `.pdf` (any case), `Image` otherwise.
    #[must_use]
    pub fn from_filename(filename: Option<&str>) -> Self {
        match filename {
            Some(name) if name.to_ascii_lowercase().ends_with(".pdf") => Self::Pdf,
            _ => Self::Image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeMetadata {
    pub text_count: u64,
    pub processing_method: String,
    pub file_type: FileType,
}

/// A processing result wrapped for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope {
    #[serde(serialize_with = "crate::time::serialize_rfc3339")]
    pub timestamp: SystemTime,
    pub source: &'static str,
    pub filename: Option<String>,
    pub ocr_result: Value,
    pub full_text_content: String,
    pub metadata: EnvelopeMetadata,
}

impl ResultEnvelope {
    /// Wraps `ocr_result`, deriving the combined text and metadata from it.
    #[must_use]
    pub fn new(ocr_result: Value, filename: Option<&str>, timestamp: SystemTime) -> Self {
        let metadata = EnvelopeMetadata {
            text_count: ocr_result
                .get("text_count")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            processing_method: ocr_result
                .get("processing_method")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            file_type: FileType::from_filename(filename),
        };

        Self {
            timestamp,
            source: SOURCE,
            filename: filename.map(str::to_string),
            full_text_content: full_text(&ocr_result),
            ocr_result,
            metadata,
        }
    }

    /// Converts the envelope into a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the envelope cannot be represented as
    /// JSON.
    pub fn into_payload(self) -> Result<DeliveryPayload, serde_json::Error> {
        DeliveryPayload::json(&self)
    }
}

/// Combined text of a result.
///
/// Joins every string `text` field in `results` with single spaces. Falls
/// back to a precomputed `full_text_content` (PDF results carry one) when
/// that yields nothing.
#[must_use]
pub fn full_text(ocr_result: &Value) -> String {
    let joined = ocr_result
        .get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|r| r.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    if !joined.is_empty() {
        return joined;
    }

    ocr_result
        .get("full_text_content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// A small OCR result used for test deliveries.
#[must_use]
pub fn sample_result() -> Value {
    json!({
        "success": true,
        "filename": "test_sample.jpg",
        "text_count": 2,
        "results": [
            {
                "text": "Test OCR Result",
                "confidence": 0.95,
                "bbox": [[[0, 0], [100, 0], [100, 20], [0, 20]]]
            },
            {
                "text": "Sample Text",
                "confidence": 0.87,
                "bbox": [[[0, 30], [80, 30], [80, 50], [0, 50]]]
            }
        ]
    })
}
