//! # HTTP Response
//!
//! Value returned by handlers and post-interceptors. The routing engine
//! passes it through untouched; only the `server` adapter turns it into a
//! hyper response.

use crate::error::Result;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::StatusCode;
use serde::Serialize;
use std::collections::HashMap;

/// HTTP response produced by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
    /// Content type
    pub content_type: String,
    /// Response headers
    pub headers: HashMap<String, String>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            body: String::new(),
            content_type: "text/html; charset=utf-8".to_string(),
            headers: HashMap::new(),
        }
    }
}

impl Response {
    /// Create an HTML response
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// Create a text response
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: "text/plain; charset=utf-8".to_string(),
            ..Self::default()
        }
    }

    /// Create a JSON response from an already encoded body
    #[must_use]
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: "application/json".to_string(),
            ..Self::default()
        }
    }

    /// Create a JSON response by serializing `value`
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn json_value<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::json(serde_json::to_string(value)?))
    }

    /// Set status code
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Set header
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.set_header(key, value);
        self
    }

    /// Set or override a header
    pub fn set_header(&mut self, key: &str, value: &str) {
        if key.eq_ignore_ascii_case("content-type") {
            self.content_type = value.to_string();
        } else {
            self.headers.insert(key.to_lowercase(), value.to_string());
        }
    }

    /// Get a header value (case-insensitive)
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        if key.eq_ignore_ascii_case("content-type") {
            return Some(&self.content_type);
        }
        self.headers.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Convert to hyper Response
    ///
    /// Invalid status codes become 500; invalid header names or values are
    /// dropped.
    pub(crate) fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut res = hyper::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let headers = res.headers_mut();
        if let Ok(v) = HeaderValue::from_str(&self.content_type) {
            headers.insert(CONTENT_TYPE, v);
        }
        for (k, v) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                headers.insert(name, value);
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_html_default() {
        let resp = Response::html("<h1>ok</h1>");
        assert_eq!(resp.status, 200);
        assert!(resp.content_type.starts_with("text/html"));
    }

    #[test]
    fn test_response_with_status() {
        let resp = Response::text("Not Found").with_status(404);
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_response_json_value() {
        let resp = Response::json_value(&serde_json::json!({"id": 42})).unwrap();
        assert_eq!(resp.body, r#"{"id":42}"#);
        assert_eq!(resp.content_type, "application/json");
    }

    #[test]
    fn test_content_type_header_alias() {
        let resp = Response::text("x").with_header("Content-Type", "text/csv");
        assert_eq!(resp.header("content-type"), Some("text/csv"));
        assert!(resp.headers.is_empty());
    }

    #[test]
    fn test_into_hyper() {
        let resp = Response::text("gone")
            .with_status(410)
            .with_header("X-Router", "/python")
            .into_hyper();
        assert_eq!(resp.status(), StatusCode::GONE);
        assert_eq!(resp.headers()["x-router"], "/python");
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }
}
