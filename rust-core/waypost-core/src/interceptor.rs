//! # Interceptor Chains
//!
//! Ordered request/response transforms run around handler invocation.
//!
//! A chain is generic over the context it hands to its interceptors: the
//! `Application` chain sees the global [`Context`](crate::context::Context),
//! a `Router` chain sees that router's
//! [`ScopedContext`](crate::context::ScopedContext).
//!
//! Both halves run in registration order, each interceptor receiving the
//! output of the previous one. The first error stops the chain and
//! propagates to the caller.

use crate::context::ScopedContext;
use crate::error::Result;
use crate::request::Request;
use crate::response::Response;
use std::sync::Arc;
use tracing::{debug, info};

/// Request interceptor: `(context, request) -> request`
pub type PreInterceptor<C> = Arc<dyn Fn(&C, Request) -> Result<Request> + Send + Sync>;

/// Response interceptor: `(context, request, response) -> response`
pub type PostInterceptor<C> =
    Arc<dyn Fn(&C, &Request, Response) -> Result<Response> + Send + Sync>;

/// Pre and post interceptors of one scope
pub struct InterceptorChain<C> {
    pre: Vec<PreInterceptor<C>>,
    post: Vec<PostInterceptor<C>>,
}

impl<C> Default for InterceptorChain<C> {
    fn default() -> Self {
        Self {
            pre: Vec::new(),
            post: Vec::new(),
        }
    }
}

impl<C> Clone for InterceptorChain<C> {
    fn clone(&self) -> Self {
        Self {
            pre: self.pre.clone(),
            post: self.post.clone(),
        }
    }
}

impl<C> std::fmt::Debug for InterceptorChain<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("pre", &self.pre.len())
            .field("post", &self.post.len())
            .finish()
    }
}

impl<C> InterceptorChain<C> {
    /// Create a new empty chain
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request interceptor
    pub fn add_pre<F>(&mut self, interceptor: F)
    where
        F: Fn(&C, Request) -> Result<Request> + Send + Sync + 'static,
    {
        self.pre.push(Arc::new(interceptor));
    }

    /// Append a response interceptor
    pub fn add_post<F>(&mut self, interceptor: F)
    where
        F: Fn(&C, &Request, Response) -> Result<Response> + Send + Sync + 'static,
    {
        self.post.push(Arc::new(interceptor));
    }

    /// Run request interceptors in registration order
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an interceptor.
    pub fn run_pre(&self, ctx: &C, req: Request) -> Result<Request> {
        self.pre.iter().try_fold(req, |req, f| f(ctx, req))
    }

    /// Run response interceptors in registration order
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an interceptor.
    pub fn run_post(&self, ctx: &C, req: &Request, res: Response) -> Result<Response> {
        self.post.iter().try_fold(res, |res, f| f(ctx, req, res))
    }

    /// Number of request interceptors
    #[must_use]
    pub fn pre_len(&self) -> usize {
        self.pre.len()
    }

    /// Number of response interceptors
    #[must_use]
    pub fn post_len(&self) -> usize {
        self.post.len()
    }

    /// Check if chain is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }
}

/// Request interceptor logging method, path and user agent
///
/// # Errors
///
/// Never fails; the `Result` matches the interceptor signature.
pub fn log_request<C>(_ctx: &C, req: Request) -> Result<Request> {
    info!(
        method = %req.method,
        path = %req.path,
        user_agent = %req.user_agent().unwrap_or("-"),
        "Request received"
    );
    Ok(req)
}

/// Request interceptor logging the prefix of the router handling the request
///
/// # Errors
///
/// Never fails; the `Result` matches the interceptor signature.
pub fn log_router_prefix(ctx: &ScopedContext, req: Request) -> Result<Request> {
    debug!(prefix = %ctx.router_prefix(), path = %req.path, "Router entered");
    Ok(req)
}

/// Response interceptor logging the final status
///
/// # Errors
///
/// Never fails; the `Result` matches the interceptor signature.
pub fn log_response<C>(_ctx: &C, req: &Request, res: Response) -> Result<Response> {
    info!(
        method = %req.method,
        path = %req.path,
        status = res.status,
        "Response sent"
    );
    Ok(res)
}

/// Response interceptor that sets a fixed header on every response
pub fn stamp_header<C: 'static>(
    name: impl Into<String>,
    value: impl Into<String>,
) -> impl Fn(&C, &Request, Response) -> Result<Response> + Send + Sync + 'static {
    let name = name.into();
    let value = value.into();
    move |_ctx: &C, _req: &Request, mut res: Response| {
        res.set_header(&name, &value);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::error::Error;

    #[test]
    fn test_chain_empty() {
        let chain = InterceptorChain::<Context>::new();
        assert!(chain.is_empty());
        assert_eq!(chain.pre_len(), 0);
        assert_eq!(chain.post_len(), 0);
    }

    #[test]
    fn test_pre_interceptors_compose_in_order() {
        let mut chain = InterceptorChain::<Context>::new();
        chain.add_pre(|_ctx, mut req| {
            req.set_header("x-trail", "a");
            Ok(req)
        });
        chain.add_pre(|_ctx, mut req| {
            let seen = req.header("x-trail").unwrap_or("").to_string();
            req.set_header("x-trail", &format!("{seen}b"));
            Ok(req)
        });

        let req = chain
            .run_pre(&Context::new(), Request::new("GET", "/"))
            .unwrap();
        assert_eq!(req.header("x-trail"), Some("ab"));
    }

    #[test]
    fn test_pre_error_stops_chain() {
        let mut chain = InterceptorChain::<Context>::new();
        chain.add_pre(|_ctx, _req| Err(Error::handler("denied")));
        chain.add_pre(|ctx: &Context, req| {
            ctx.set("reached", true);
            Ok(req)
        });

        let ctx = Context::new();
        let result = chain.run_pre(&ctx, Request::new("GET", "/"));
        assert!(matches!(result, Err(Error::Handler { .. })));
        assert!(!ctx.contains("reached"));
    }

    #[test]
    fn test_post_interceptors_in_order() {
        let mut chain = InterceptorChain::<Context>::new();
        chain.add_post(|_ctx, _req, mut res: Response| {
            res.body.push('1');
            Ok(res)
        });
        chain.add_post(|_ctx, _req, mut res: Response| {
            res.body.push('2');
            Ok(res)
        });

        let res = chain
            .run_post(&Context::new(), &Request::new("GET", "/"), Response::text(""))
            .unwrap();
        assert_eq!(res.body, "12");
    }

    #[test]
    fn test_stamp_header() {
        let mut chain = InterceptorChain::<Context>::new();
        chain.add_post(stamp_header::<Context>("x-powered-by", "waypost"));
        chain.add_post(log_response::<Context>);
        chain.add_pre(log_request::<Context>);

        let ctx = Context::new();
        let req = chain.run_pre(&ctx, Request::new("GET", "/")).unwrap();
        let res = chain.run_post(&ctx, &req, Response::text("ok")).unwrap();
        assert_eq!(res.header("x-powered-by"), Some("waypost"));
    }
}
