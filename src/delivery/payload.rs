//! What gets delivered, and the identifier that ties it to its outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Content type used for JSON payloads.
pub const APPLICATION_JSON: &str = "application/json";

/// An opaque result record handed over by the producer.
///
/// The delivery core never looks inside beyond serializing it; JSON payloads
/// are also exposed to body templates as `payload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryPayload {
    /// A JSON document, sent as `application/json`.
    Json(serde_json::Value),
    /// Pre-serialized bytes with their own content type.
    Raw {
        /// `Content-Type` header value
        content_type: String,
        /// Request body
        body: Vec<u8>,
    },
}

impl DeliveryPayload {
    /// Serializes any value into a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `value` cannot be represented as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Json)
    }

    /// Wraps pre-serialized bytes.
    #[must_use]
    pub fn raw(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::Raw {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Declared content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        match self {
            Self::Json(_) => APPLICATION_JSON,
            Self::Raw { content_type, .. } => content_type,
        }
    }

    /// Serialized request body.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Json(value) => value.to_string().into_bytes(),
            Self::Raw { body, .. } => body.clone(),
        }
    }

    /// The JSON document, if this is a JSON payload.
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Raw { .. } => None,
        }
    }
}

impl From<serde_json::Value> for DeliveryPayload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Opaque string linking a processing result to its delivery outcomes.
///
/// Sent to receivers in the `X-Correlation-Id` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a random v4 UUID identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
