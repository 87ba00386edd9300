//! Raw, deserializable target definitions.
//!
//! Configuration files and inline per-call overrides describe targets with
//! plain strings and numbers. [`TargetDefinition::resolve`] fills gaps from
//! [`TargetDefaults`] and validates the result into a [`WebhookTarget`].

use std::collections::BTreeMap;
use std::time::Duration;

use http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use http::HeaderMap;
use serde::Deserialize;
use url::Url;

use super::{Backoff, RegistryError, RetryPolicy, TargetMethod, WebhookTarget};

/// Values applied to every target that does not set them itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDefaults {
    /// HTTP method
    pub method: Option<String>,

    /// Per-attempt deadline in milliseconds
    pub timeout_ms: Option<u64>,

    /// Maximum attempts including the first
    pub retry_max_attempts: Option<u32>,

    /// Base retry delay in milliseconds
    pub retry_delay_ms: Option<u64>,

    /// Backoff mode
    pub backoff: Option<Backoff>,

    /// Headers merged under each target's own headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// One target as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDefinition {
    /// Unique target name
    pub name: String,

    /// Receiver URL
    pub url: String,

    /// HTTP method: POST, GET or PUT
    pub method: Option<String>,

    /// Extra headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Bearer token for the `Authorization` header
    pub bearer: Option<String>,

    /// Per-attempt deadline in milliseconds
    pub timeout_ms: Option<u64>,

    /// Maximum attempts including the first
    pub retry_max_attempts: Option<u32>,

    /// Base retry delay in milliseconds
    pub retry_delay_ms: Option<u64>,

    /// Backoff mode
    pub backoff: Option<Backoff>,

    /// Handlebars body template
    pub body_template: Option<String>,

    /// Whether broadcast deliveries include this target (default: true)
    pub enabled: Option<bool>,
}

impl TargetDefinition {
    /// Creates a definition with only a name and URL set.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            method: None,
            headers: BTreeMap::new(),
            bearer: None,
            timeout_ms: None,
            retry_max_attempts: None,
            retry_delay_ms: None,
            backoff: None,
            body_template: None,
            enabled: None,
        }
    }

    /// Builds a validated target, taking unset fields from `defaults`.
    ///
    /// Precedence per field: this definition, then `defaults`, then the
    /// built-in defaults of [`WebhookTarget`] and [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidConfiguration`] for a malformed URL,
    /// method, header, zero timeout, zero attempts or a bad template.
    pub fn resolve(&self, defaults: &TargetDefaults) -> Result<WebhookTarget, RegistryError> {
        let invalid = |reason: String| RegistryError::invalid(&self.name, reason);

        let url = Url::parse(&self.url)
            .map_err(|e| invalid(format!("invalid url '{}': {e}", self.url)))?;

        let method = self
            .method
            .as_deref()
            .or(defaults.method.as_deref())
            .map(str::parse::<TargetMethod>)
            .transpose()
            .map_err(invalid)?
            .unwrap_or_default();

        let headers = self.resolve_headers(defaults).map_err(invalid)?;

        let timeout = self
            .timeout_ms
            .or(defaults.timeout_ms)
            .map_or(WebhookTarget::DEFAULT_TIMEOUT, Duration::from_millis);

        let max_attempts = self
            .retry_max_attempts
            .or(defaults.retry_max_attempts)
            .unwrap_or(RetryPolicy::DEFAULT_MAX_ATTEMPTS);

        if max_attempts < RetryPolicy::MIN_MAX_ATTEMPTS {
            return Err(invalid("retry_max_attempts must be at least 1".to_string()));
        }

        let retry_policy = RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_delay(
                self.retry_delay_ms
                    .or(defaults.retry_delay_ms)
                    .map_or(RetryPolicy::DEFAULT_DELAY, Duration::from_millis),
            )
            .with_backoff(self.backoff.or(defaults.backoff).unwrap_or_default());

        let mut target = WebhookTarget::new(&self.name, url)
            .with_method(method)
            .with_headers(headers)
            .with_timeout(timeout)
            .with_retry_policy(retry_policy)
            .with_enabled(self.enabled.unwrap_or(true));

        if let Some(ref template) = self.body_template {
            target = target.with_body_template(template);
        }

        target.validate()?;
        Ok(target)
    }

    fn resolve_headers(&self, defaults: &TargetDefaults) -> Result<HeaderMap, String> {
        let mut headers = HeaderMap::new();

        // Defaults first so the target's own headers win.
        for (name, value) in defaults.headers.iter().chain(&self.headers) {
            headers.insert(parse_header_name(name)?, parse_header_value(name, value)?);
        }

        if let Some(ref token) = self.bearer {
            let value = parse_header_value("Authorization", &format!("Bearer {token}"))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }
}

/// Parses a header name.
///
/// # Errors
///
/// Returns a reason string if the name contains invalid characters.
pub fn parse_header_name(name: &str) -> Result<HeaderName, String> {
    name.parse::<HeaderName>()
        .map_err(|e| format!("invalid header name '{name}': {e}"))
}

/// Parses a header value.
///
/// # Errors
///
/// Returns a reason string if the value contains control characters.
pub fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, String> {
    HeaderValue::from_str(value).map_err(|e| format!("invalid value for header '{name}': {e}"))
}
