//! # Error Handling
//!
//! Centralized error types for Waypost core.
//! Uses `thiserror` for ergonomic error definitions.

use crate::types::ParamType;
use thiserror::Error;

/// Result type alias for Waypost operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the Waypost runtime
#[derive(Error, Debug)]
pub enum Error {
    /// Server failed to bind to the specified address
    #[error("Failed to bind server to {address}: {source}")]
    BindError {
        /// The address we tried to bind to
        address: String,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// No registered router produced a response for the request
    #[error("No route found for {method} {path}")]
    RouteNotFound {
        /// Request method
        method: String,
        /// The path that wasn't matched
        path: String,
    },

    /// Invalid route template provided at registration
    #[error("Invalid route pattern: {pattern}: {reason}")]
    InvalidRoutePattern {
        /// The invalid pattern
        pattern: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Context or captured-variable lookup for a name that does not exist
    #[error("Attribute {name} Not Found")]
    AttributeNotFound {
        /// The missing key
        name: String,
    },

    /// The key exists but holds a value of a different type
    #[error("Attribute {name} is not of type {expected}")]
    AttributeTypeMismatch {
        /// The key that was looked up
        name: String,
        /// The requested type
        expected: &'static str,
    },

    /// A typed placeholder capture could not be converted
    #[error("Cannot convert '{value}' to {expected} for placeholder {name}")]
    Decode {
        /// Placeholder name
        name: String,
        /// Raw captured text
        value: String,
        /// Declared placeholder type
        expected: ParamType,
    },

    /// Failure raised by a handler or interceptor
    #[error("Handler error: {message}")]
    Handler {
        /// Error message from user code
        message: String,
    },

    /// HTTP protocol error
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request payload too large
    #[error("Payload too large: limit={limit} bytes, received={actual} bytes")]
    PayloadTooLarge {
        /// Max allowed size
        limit: usize,
        /// Actual size
        actual: usize,
    },
}

impl Error {
    /// Build a [`Error::Handler`] from any message
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Whether this error is the "not found" outcome rather than a failure
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::RouteNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_not_found_error() {
        let err = Error::RouteNotFound {
            method: "GET".to_string(),
            path: "/unknown".to_string(),
        };
        assert!(err.to_string().contains("/unknown"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_attribute_not_found_message() {
        let err = Error::AttributeNotFound {
            name: "db".to_string(),
        };
        assert_eq!(err.to_string(), "Attribute db Not Found");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_decode_error_names_type() {
        let err = Error::Decode {
            name: "id".to_string(),
            value: "99999999999999999999".to_string(),
            expected: ParamType::Int,
        };
        assert!(err.to_string().contains("int"));
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn test_bind_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err = Error::BindError {
            address: "127.0.0.1:9999".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("127.0.0.1:9999"));
    }
}
