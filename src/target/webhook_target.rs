//! The validated, immutable description of one delivery target.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use http::HeaderMap;
use serde::{Serialize, Serializer};
use url::Url;

use super::{RegistryError, RetryPolicy, template};

/// HTTP methods a target may be called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetMethod {
    /// `POST` (default)
    #[default]
    Post,
    /// `GET`
    Get,
    /// `PUT`
    Put,
}

impl TargetMethod {
    /// The equivalent `http` crate method.
    #[must_use]
    pub const fn as_http(self) -> http::Method {
        match self {
            Self::Post => http::Method::POST,
            Self::Get => http::Method::GET,
            Self::Put => http::Method::PUT,
        }
    }
}

impl fmt::Display for TargetMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_http().as_str())
    }
}

impl FromStr for TargetMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POST" => Ok(Self::Post),
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            _ => Err(format!("unsupported method '{s}': expected POST, GET, or PUT")),
        }
    }
}

/// A configured external HTTP endpoint.
///
/// Constructed with [`WebhookTarget::new`] and the `with_*` builders, then
/// handed to a [`Registry`](super::Registry), which validates it and shares
/// it read-only with every delivery stream.
///
/// # Example
///
/// ```
/// use ocr_hook::target::{RetryPolicy, TargetMethod, WebhookTarget};
/// use std::time::Duration;
/// use url::Url;
///
/// let target = WebhookTarget::new("n8n", Url::parse("https://n8n.example.com/hook").unwrap())
///     .with_method(TargetMethod::Put)
///     .with_timeout(Duration::from_secs(10))
///     .with_retry_policy(RetryPolicy::new().with_max_attempts(5));
///
/// assert!(target.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    name: String,
    url: Url,
    method: TargetMethod,
    headers: HeaderMap,
    timeout: Duration,
    retry_policy: RetryPolicy,
    body_template: Option<String>,
    enabled: bool,
}

impl WebhookTarget {
    /// Default per-attempt deadline (30 seconds).
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates an enabled POST target with default timeout and retry policy.
    #[must_use]
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            method: TargetMethod::default(),
            headers: HeaderMap::new(),
            timeout: Self::DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
            body_template: None,
            enabled: true,
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub const fn with_method(mut self, method: TargetMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the static headers sent on every attempt.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the per-attempt deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets a Handlebars body template that replaces the raw payload.
    #[must_use]
    pub fn with_body_template(mut self, template: impl Into<String>) -> Self {
        self.body_template = Some(template.into());
        self
    }

    /// Enables or disables the target.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Target name, unique within a registry.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receiver URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> TargetMethod {
        self.method
    }

    /// Static headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Per-attempt deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Body template, if any.
    #[must_use]
    pub fn body_template(&self) -> Option<&str> {
        self.body_template.as_deref()
    }

    /// Whether broadcast deliveries include this target.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Checks the invariants every registered target must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidConfiguration`] if:
    /// - the name is empty
    /// - the URL is not an absolute `http`/`https` URL with a host
    /// - the timeout is zero
    /// - `max_attempts` is zero
    /// - the body template does not compile
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::invalid(&self.name, "name must not be empty"));
        }

        validate_url(&self.url).map_err(|reason| RegistryError::invalid(&self.name, reason))?;

        if self.timeout.is_zero() {
            return Err(RegistryError::invalid(
                &self.name,
                "timeout must be greater than 0",
            ));
        }

        if self.retry_policy.max_attempts < RetryPolicy::MIN_MAX_ATTEMPTS {
            return Err(RegistryError::invalid(
                &self.name,
                "retry max_attempts must be at least 1",
            ));
        }

        if let Some(ref tmpl) = self.body_template {
            template::validate(tmpl).map_err(|e| {
                RegistryError::invalid(&self.name, format!("invalid body template: {e}"))
            })?;
        }

        Ok(())
    }
}

/// Checks that a URL can be used as a webhook receiver.
///
/// # Errors
///
/// Returns a reason string for non-HTTP schemes or URLs without a host.
pub fn validate_url(url: &Url) -> Result<(), String> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "url '{url}' must use http or https, not '{}'",
            url.scheme()
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(format!("url '{url}' has no host"));
    }
    Ok(())
}

/// Header names whose values are hidden when a target is listed.
const REDACTED_HEADERS: [http::HeaderName; 2] =
    [http::header::AUTHORIZATION, http::header::PROXY_AUTHORIZATION];

/// Listing view: headers as a string map, secrets redacted.
impl Serialize for WebhookTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            name: &'a str,
            url: &'a str,
            method: TargetMethod,
            headers: std::collections::BTreeMap<&'a str, &'a str>,
            timeout_ms: u64,
            retry_max_attempts: u32,
            retry_delay_ms: u64,
            backoff: super::Backoff,
            body_template: Option<&'a str>,
            enabled: bool,
        }

        let headers = self
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if REDACTED_HEADERS.contains(name) {
                    "***"
                } else {
                    value.to_str().unwrap_or("<binary>")
                };
                (name.as_str(), shown)
            })
            .collect();

        View {
            name: &self.name,
            url: self.url.as_str(),
            method: self.method,
            headers,
            timeout_ms: millis(self.timeout),
            retry_max_attempts: self.retry_policy.max_attempts,
            retry_delay_ms: millis(self.retry_policy.delay),
            backoff: self.retry_policy.backoff,
            body_template: self.body_template.as_deref(),
            enabled: self.enabled,
        }
        .serialize(serializer)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
