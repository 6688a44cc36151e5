//! Minimal HTTP value model.
//!
//! The engine never owns a socket; it consumes and produces these values
//! through the [`Fetch`]/[`HttpClient`] seams of the cache and engine
//! crates. Keeping the model here lets the router, the queue manager, and
//! their mocks all speak the same types.
//!
//! [`Fetch`]: https://docs.rs/vetsync_cache
//! [`HttpClient`]: https://docs.rs/vetsync_engine

use crate::error::{ProtocolError, ProtocolResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET - reads, cacheable.
    Get,
    /// POST - creates.
    Post,
    /// PUT - full replacement.
    Put,
    /// PATCH - partial update.
    Patch,
    /// DELETE - removal.
    Delete,
}

impl Method {
    /// Returns the canonical method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Parses a method name.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownMethod`] for unrecognized names.
    pub fn parse(name: &str) -> ProtocolResult<Self> {
        match name {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(ProtocolError::UnknownMethod(other.to_string())),
        }
    }

    /// Returns true for methods that carry no mutation intent.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Method::Get)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: Method,
    /// The request path (with query string, if any).
    pub path: String,
    /// Optional JSON body.
    pub body: Option<serde_json::Value>,
    /// Optional per-request timeout budget in milliseconds.
    ///
    /// Navigation fetches carry the router's short timeout here so the
    /// fetch implementation can bound the network-first attempt.
    pub timeout_ms: Option<u64>,
}

impl HttpRequest {
    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            timeout_ms: None,
        }
    }

    /// Creates a POST request with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
            timeout_ms: None,
        }
    }

    /// Creates a PATCH request with a JSON body.
    #[must_use]
    pub fn patch(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Patch,
            path: path.into(),
            body: Some(body),
            timeout_ms: None,
        }
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            body: None,
            timeout_ms: None,
        }
    }

    /// Sets the timeout budget.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Returns the path without its query string.
    #[must_use]
    pub fn path_without_query(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }
}

/// An HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The raw response body.
    pub body: Vec<u8>,
    /// The response content type.
    pub content_type: String,
}

impl HttpResponse {
    /// Creates a response with the given status and JSON body.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
            content_type: "application/json".to_string(),
        }
    }

    /// Creates a 200 response with a JSON body.
    #[must_use]
    pub fn ok_json(body: &serde_json::Value) -> Self {
        Self::json(200, body)
    }

    /// Creates a response with an HTML body.
    #[must_use]
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into().into_bytes(),
            content_type: "text/html".to_string(),
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedBody`] if the body is not valid
    /// JSON for the target type.
    pub fn decode<T: DeserializeOwned>(&self) -> ProtocolResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns the body as a UTF-8 string, lossily.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_parse_roundtrip() {
        for m in [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Patch,
            Method::Delete,
        ] {
            assert_eq!(Method::parse(m.as_str()).unwrap(), m);
        }
        assert!(Method::parse("TRACE").is_err());
    }

    #[test]
    fn request_builders() {
        let req = HttpRequest::post("/api/pets", json!({ "name": "Biscuit" }));
        assert_eq!(req.method, Method::Post);
        assert!(req.body.is_some());

        let req = HttpRequest::get("/dashboard?tab=today").with_timeout_ms(3000);
        assert_eq!(req.timeout_ms, Some(3000));
        assert_eq!(req.path_without_query(), "/dashboard");
    }

    #[test]
    fn response_success_is_2xx() {
        assert!(HttpResponse::ok_json(&json!({})).is_success());
        assert!(HttpResponse::json(201, &json!({})).is_success());
        assert!(!HttpResponse::json(404, &json!({})).is_success());
        assert!(!HttpResponse::json(500, &json!({})).is_success());
    }

    #[test]
    fn response_decodes_json_body() {
        let resp = HttpResponse::ok_json(&json!({ "changes": [] }));
        let value: serde_json::Value = resp.decode().unwrap();
        assert!(value["changes"].as_array().unwrap().is_empty());

        let bad = HttpResponse::html(200, "<html></html>");
        assert!(bad.decode::<serde_json::Value>().is_err());
    }
}
