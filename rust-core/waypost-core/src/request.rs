//! # HTTP Request
//!
//! The request value flowing through interceptors and handlers.
//!
//! Routing only reads `method` and `path` and writes `vars`; headers and the
//! body are carried along for handlers and interceptors.

use crate::error::{Error, Result};
use crate::types::CapturedVars;
use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::HeaderMap;
use std::collections::HashMap;

/// HTTP request as seen by the routing engine
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// HTTP method as sent by the client
    pub method: String,
    /// Request path (without query string)
    pub path: String,
    /// Raw query string (e.g., "page=1&limit=10")
    query_string: Option<String>,
    /// Request headers
    headers: HeaderMap,
    /// Request body (collected)
    body: Option<Bytes>,
    /// Typed captures of the matched route, empty until a route matches
    pub vars: CapturedVars,
}

impl Request {
    /// Create a request for `method` and `path`
    ///
    /// Anything after `?` in `path` is kept as the query string.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let (path, query_string) = match path.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (path, None),
        };

        Self {
            method: method.into(),
            path,
            query_string,
            ..Self::default()
        }
    }

    /// Create a request with headers and body (for testing/internal use)
    pub fn with_parts(
        method: impl Into<String>,
        path: impl Into<String>,
        headers_map: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> Self {
        let mut req = Self::new(method, path);
        for (k, v) in headers_map {
            req.set_header(&k, &v);
        }
        req.body = body;
        req
    }

    /// Create from hyper request with body size limit
    ///
    /// # Errors
    ///
    /// Returns `Error::PayloadTooLarge` if the declared or collected body
    /// exceeds `max_body_size`.
    pub async fn from_hyper_with_limit(
        req: hyper::Request<hyper::body::Incoming>,
        max_body_size: usize,
    ) -> Result<Self> {
        let uri = req.uri();
        let method = req.method().as_str().to_string();
        let path = uri.path().to_string();
        let query_string = uri.query().map(String::from);

        let headers = req.headers().clone();
        if let Some(content_len) = headers
            .get(hyper::header::CONTENT_LENGTH)
            .and_then(|len| len.to_str().ok())
            .and_then(|len| len.parse::<usize>().ok())
        {
            if content_len > max_body_size {
                return Err(Error::PayloadTooLarge {
                    limit: max_body_size,
                    actual: content_len,
                });
            }
        }

        let bytes = BodyExt::collect(req.into_body()).await?.to_bytes();
        if bytes.len() > max_body_size {
            return Err(Error::PayloadTooLarge {
                limit: max_body_size,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            method,
            path,
            query_string,
            headers,
            body: (!bytes.is_empty()).then_some(bytes),
            vars: CapturedVars::new(),
        })
    }

    /// Get a header value by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Set or override a header
    ///
    /// Names or values that are not valid HTTP are ignored.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let (Ok(n), Ok(v)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(n, v);
        }
    }

    /// Builder-style [`Request::set_header`]
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Builder-style body setter
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// `User-Agent` header, if sent
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }

    /// Get raw query string
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.query_string.as_deref()
    }

    /// Get the request body as bytes
    #[must_use]
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Get the request body as string (UTF-8)
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        self.body_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_query() {
        let req = Request::new("GET", "/python/12?page=1");
        assert_eq!(req.path, "/python/12");
        assert_eq!(req.query_string(), Some("page=1"));
        assert!(req.vars.is_empty());
    }

    #[test]
    fn test_headers_case_insensitive() {
        let req = Request::new("GET", "/").with_header("User-Agent", "curl/8.0");
        assert_eq!(req.header("user-agent"), Some("curl/8.0"));
        assert_eq!(req.user_agent(), Some("curl/8.0"));
    }

    #[test]
    fn test_invalid_header_ignored() {
        let mut req = Request::new("GET", "/");
        req.set_header("bad header", "x");
        assert_eq!(req.header("bad header"), None);
    }

    #[test]
    fn test_with_parts_body() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        let req = Request::with_parts("POST", "/echo", headers, Some(Bytes::from("hi")));
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.body_str(), Some("hi"));
    }
}
