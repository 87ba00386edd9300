//! Scripted HTTP client and fixtures shared by the delivery tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::StatusCode;
use tokio::time::Instant;
use url::Url;

use crate::target::{RetryPolicy, WebhookTarget};
use crate::webhook::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// What the mock answers to one request.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Status(u16),
    /// Answers with the status after the given delay.
    Delayed(Duration, u16),
    Refused,
    Timeout,
    /// Never answers.
    Hang,
}

/// One request seen by the mock.
#[derive(Debug, Clone)]
pub struct Call {
    pub path: String,
    pub at: Instant,
    pub request: HttpRequest,
}

/// HTTP client that answers from per-path scripts.
///
/// Each path has a queue of replies; once it is empty the fallback reply is
/// used. Request times come from the tokio clock, so they are exact under
/// paused time.
#[derive(Debug)]
pub struct MockClient {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    fallback: Reply,
    calls: Mutex<Vec<Call>>,
}

impl MockClient {
    pub fn new(fallback: Reply) -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn ok() -> Self {
        Self::new(Reply::Status(200))
    }

    pub fn route(self, path: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), replies.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == path)
            .collect()
    }

    fn next_reply(&self, request: HttpRequest) -> Reply {
        let path = request.url.path().to_string();
        let reply = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front)
            .unwrap_or(self.fallback);

        self.calls.lock().unwrap().push(Call {
            path,
            at: Instant::now(),
            request,
        });
        reply
    }
}

impl HttpClient for MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let reply = self.next_reply(req);
        match reply {
            Reply::Status(code) => Ok(response(code)),
            Reply::Delayed(delay, code) => {
                tokio::time::sleep(delay).await;
                Ok(response(code))
            }
            Reply::Refused => Err(HttpError::Connection("connection refused".into())),
            Reply::Timeout => Err(HttpError::Timeout),
            Reply::Hang => std::future::pending().await,
        }
    }
}

fn response(code: u16) -> HttpResponse {
    HttpResponse::status(StatusCode::from_u16(code).unwrap())
}

/// Target at `http://receiver.test/<name>` with the given retry settings.
pub fn target(name: &str, max_attempts: u32, delay_ms: u64) -> Arc<WebhookTarget> {
    Arc::new(
        WebhookTarget::new(name, Url::parse(&format!("http://receiver.test/{name}")).unwrap())
            .with_retry_policy(
                RetryPolicy::new()
                    .with_max_attempts(max_attempts)
                    .with_delay(Duration::from_millis(delay_ms)),
            ),
    )
}

/// Path the mock sees for [`target`].
pub fn path(name: &str) -> String {
    format!("/{name}")
}
