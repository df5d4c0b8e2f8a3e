//! # Prefixed Router
//!
//! A router owns a path prefix, an ordered list of compiled routes, its own
//! interceptor chain and a [`ScopedContext`].
//!
//! Dispatch is first-match in registration order: the first route whose
//! method set accepts the request and whose pattern matches the path
//! remainder (path with the prefix removed) handles the request.

use crate::context::{Context, ScopedContext};
use crate::error::Result;
use crate::interceptor::InterceptorChain;
use crate::pattern::PathPattern;
use crate::request::Request;
use crate::response::Response;
use std::sync::Arc;
use tracing::debug;

/// HTTP methods a route can be restricted to
///
/// Methods outside the common set are kept upper-cased in `Other`, so
/// routes can be registered for `PURGE`, `PROPFIND` and the like.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP DELETE
    Delete,
    /// HTTP PATCH
    Patch,
    /// HTTP HEAD
    Head,
    /// HTTP OPTIONS
    Options,
    /// Any other method, upper-cased
    Other(String),
}

impl Method {
    /// Parse a request method, ignoring case
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "PATCH" => Self::Patch,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            _ => Self::Other(upper),
        }
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Patch => write!(f, "PATCH"),
            Self::Head => write!(f, "HEAD"),
            Self::Options => write!(f, "OPTIONS"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Route handler
///
/// Receives the owning router's context and the request with its captured
/// variables attached.
pub type Handler = Arc<dyn Fn(&ScopedContext, &Request) -> Result<Response> + Send + Sync>;

/// A registered route; immutable once added
#[derive(Clone)]
struct Route {
    /// Empty means every method
    methods: Vec<Method>,
    pattern: PathPattern,
    handler: Handler,
}

impl Route {
    fn allows(&self, method: &str) -> bool {
        self.methods.is_empty() || self.methods.contains(&Method::parse(method))
    }
}

/// Router mounted under a path prefix
pub struct Router {
    prefix: String,
    routes: Vec<Route>,
    interceptors: InterceptorChain<ScopedContext>,
    ctx: ScopedContext,
}

impl Default for Router {
    fn default() -> Self {
        Self::new("")
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field("routes", &self.templates())
            .field("interceptors", &self.interceptors)
            .finish()
    }
}

impl Router {
    /// Create a router for `prefix`
    ///
    /// Trailing `/` and `\` are stripped, so `"/"` and `""` both mount at
    /// the root.
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches(|c: char| c == '/' || c == '\\').to_string();
        Self {
            ctx: ScopedContext::new(prefix.clone()),
            prefix,
            routes: Vec::new(),
            interceptors: InterceptorChain::new(),
        }
    }

    /// The normalized prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// This router's context
    #[must_use]
    pub const fn context(&self) -> &ScopedContext {
        &self.ctx
    }

    /// Link this router's context to the global context
    pub(crate) fn relate(&mut self, global: Context) {
        self.ctx.relate(global);
    }

    /// Register a handler for `template`
    ///
    /// An empty `methods` slice accepts every method. The template is
    /// compiled here, once.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRoutePattern` if the template is rejected.
    pub fn route<F>(&mut self, template: &str, methods: &[Method], handler: F) -> Result<&mut Self>
    where
        F: Fn(&ScopedContext, &Request) -> Result<Response> + Send + Sync + 'static,
    {
        let pattern = PathPattern::compile(template)?;
        debug!(
            prefix = %self.prefix,
            template = %template,
            methods = ?methods,
            "Route registered"
        );
        self.routes.push(Route {
            methods: methods.to_vec(),
            pattern,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Convenience method to add a GET route
    ///
    /// # Errors
    ///
    /// See [`Router::route`].
    pub fn get<F>(&mut self, template: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&ScopedContext, &Request) -> Result<Response> + Send + Sync + 'static,
    {
        self.route(template, &[Method::Get], handler)
    }

    /// Convenience method to add a POST route
    ///
    /// # Errors
    ///
    /// See [`Router::route`].
    pub fn post<F>(&mut self, template: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&ScopedContext, &Request) -> Result<Response> + Send + Sync + 'static,
    {
        self.route(template, &[Method::Post], handler)
    }

    /// Convenience method to add a HEAD route
    ///
    /// # Errors
    ///
    /// See [`Router::route`].
    pub fn head<F>(&mut self, template: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&ScopedContext, &Request) -> Result<Response> + Send + Sync + 'static,
    {
        self.route(template, &[Method::Head], handler)
    }

    /// Append a request interceptor to this router
    pub fn register_pre_interceptor<F>(&mut self, interceptor: F) -> &mut Self
    where
        F: Fn(&ScopedContext, Request) -> Result<Request> + Send + Sync + 'static,
    {
        self.interceptors.add_pre(interceptor);
        self
    }

    /// Append a response interceptor to this router
    pub fn register_post_interceptor<F>(&mut self, interceptor: F) -> &mut Self
    where
        F: Fn(&ScopedContext, &Request, Response) -> Result<Response> + Send + Sync + 'static,
    {
        self.interceptors.add_post(interceptor);
        self
    }

    /// Templates of the registered routes, in dispatch order
    #[must_use]
    pub fn templates(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.pattern.template()).collect()
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if no route is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Try to handle `request`
    ///
    /// On a match, returns the request as the handler saw it (router
    /// interceptors applied, captured variables attached) together with the
    /// response. Returns `Ok(None)` when the path is outside this router's prefix or
    /// no route matches, so the caller can try the next router. The
    /// router's request interceptors work on a copy of `request`; their
    /// changes are not seen by other routers.
    ///
    /// # Errors
    ///
    /// Propagates interceptor and handler errors, and `Error::Decode` when a
    /// capture cannot be converted to its declared type.
    pub fn match_request(&self, request: &Request) -> Result<Option<(Request, Response)>> {
        if !request.path.starts_with(&self.prefix) {
            return Ok(None);
        }

        let mut req = self.interceptors.run_pre(&self.ctx, request.clone())?;

        let mut remainder = req.path.replacen(&self.prefix, "", 1);
        if remainder.is_empty() {
            remainder.push('/');
        }

        for route in &self.routes {
            if !route.allows(&req.method) {
                continue;
            }
            let Some(vars) = route.pattern.captures(&remainder)? else {
                continue;
            };

            debug!(
                prefix = %self.prefix,
                template = %route.pattern.template(),
                path = %req.path,
                "Route matched"
            );
            req.vars = vars;
            let res = (route.handler)(&self.ctx, &req)?;
            let res = self.interceptors.run_post(&self.ctx, &req, res)?;
            return Ok(Some((req, res)));
        }

        Ok(None)
    }
}
