//! The transport seam.
//!
//! The engine never opens a socket itself; it sends [`HttpRequest`]
//! values through [`HttpClient`] and interprets the resulting
//! [`HttpResponse`]. Production wires a real client in at the composition
//! root; tests use [`MockHttpClient`].

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use vetsync_protocol::{HttpRequest, HttpResponse};

/// Errors a transport can report.
///
/// Both variants mean the request may not have reached the server, so the
/// drain loop treats them identically: release the claim and halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HttpError {
    /// The server could not be reached at all.
    #[error("server unreachable")]
    Unreachable,
    /// The request exceeded its timeout budget.
    #[error("request timed out")]
    Timeout,
}

/// Abstraction over the HTTP transport.
pub trait HttpClient: Send + Sync {
    /// Sends a request and waits for the response.
    ///
    /// A response is returned for every status code, including errors;
    /// `Err` is reserved for transport failures where no response exists.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the server is unreachable or the request
    /// timed out.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;

    /// Best-effort connectivity hint; `true` when unknown.
    ///
    /// The drain loop consults this once per pass and defers while
    /// known-offline; mid-pass, `send` stays the source of truth.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// A scriptable in-memory transport for tests.
///
/// Responses are served from a FIFO script; once the script is exhausted,
/// every request gets `200 {}`. Flipping [`set_healthy`] to `false` makes
/// all requests fail with [`HttpError::Unreachable`]. Every request is
/// recorded whether or not it succeeds.
///
/// [`set_healthy`]: MockHttpClient::set_healthy
#[derive(Debug, Default)]
pub struct MockHttpClient {
    requests: Mutex<Vec<HttpRequest>>,
    script: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    offline: AtomicBool,
}

impl MockHttpClient {
    /// Creates a healthy client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next response (or transport error) to serve.
    pub fn push_response(&self, response: Result<HttpResponse, HttpError>) {
        self.script.lock().push_back(response);
    }

    /// Queues `n` copies of the same response.
    pub fn push_responses(&self, response: Result<HttpResponse, HttpError>, n: usize) {
        let mut script = self.script.lock();
        for _ in 0..n {
            script.push_back(response.clone());
        }
    }

    /// Simulates connectivity loss or recovery.
    pub fn set_healthy(&self, healthy: bool) {
        self.offline.store(!healthy, Ordering::SeqCst);
    }

    /// Returns all requests sent so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests sent so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl HttpClient for MockHttpClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        self.requests.lock().push(request.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(HttpError::Unreachable);
        }
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::ok_json(&serde_json::json!({}))))
    }

    fn is_healthy(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mock_serves_script_then_defaults() {
        let client = MockHttpClient::new();
        client.push_response(Ok(HttpResponse::json(404, &json!({}))));

        let first = client.send(&HttpRequest::get("/api/pets")).unwrap();
        assert_eq!(first.status, 404);

        let second = client.send(&HttpRequest::get("/api/pets")).unwrap();
        assert_eq!(second.status, 200);

        assert_eq!(client.request_count(), 2);
    }

    #[test]
    fn mock_records_requests_while_offline() {
        let client = MockHttpClient::new();
        client.set_healthy(false);

        let result = client.send(&HttpRequest::get("/api/pets"));
        assert_eq!(result, Err(HttpError::Unreachable));
        assert_eq!(client.request_count(), 1);

        client.set_healthy(true);
        assert!(client.send(&HttpRequest::get("/api/pets")).is_ok());
    }
}
