//! # Waypost Core
//!
//! Core routing engine for the Waypost framework.
//! Maps requests to handlers through typed path templates, prefixed routers
//! and two tiers of interceptors.
//!
//! ## Architecture
//!
//! An [`Application`] owns the global [`Context`], an ordered list of
//! [`Router`]s and a global interceptor chain. Each router owns a prefix, its
//! routes in registration order, its own interceptor chain and a
//! [`ScopedContext`] that falls back to the global context on lookup misses.
//!
//! ```text
//! request -> global pre -> Router::match_request (prefix, router pre,
//!            first matching route, decode captures, handler, router post)
//!         -> global post -> response
//! ```
//!
//! ## Modules
//!
//! - `pattern` - Path template compiler (`{name:type}` placeholders)
//! - `types` - Placeholder types and decoded capture values
//! - `context` - Global and router-scoped key-value contexts
//! - `interceptor` - Ordered request/response interceptor chains
//! - `router` - Prefixed router with first-match dispatch
//! - `app` - Application: router registry and global pipeline
//! - `request` / `response` - Request and response values
//! - `server` - HTTP server built on Hyper
//! - `error` - Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod app;
pub mod context;
pub mod error;
pub mod interceptor;
pub mod pattern;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod types;

pub use app::Application;
pub use context::{Context, ScopedContext};
pub use error::{Error, Result};
pub use interceptor::{InterceptorChain, PostInterceptor, PreInterceptor};
pub use pattern::{Matcher, PathPattern};
pub use request::Request;
pub use response::Response;
pub use router::{Handler, Method, Router};
pub use server::{Server, ServerConfig};
pub use types::{CapturedVars, ParamType, ParamValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
