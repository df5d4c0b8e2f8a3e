//! # Application
//!
//! Owns the global [`Context`], the registered routers in priority order and
//! the global interceptor chain.
//!
//! Setup (`register`, `register_*_interceptor`, route registration through
//! the returned `&mut Router`) happens on `&mut Application` before serving.
//! Handling only needs `&Application`, so a finished application is shared
//! as `Arc<Application>` without any locking of the registries.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::interceptor::InterceptorChain;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use tracing::debug;

/// Routing application
///
/// The global context holds no back-reference to the application; router
/// contexts only carry their owner's prefix (see
/// [`ScopedContext::router_prefix`](crate::context::ScopedContext::router_prefix)).
/// Handlers that need shared services get them through [`Application::extend`].
#[derive(Debug, Default)]
pub struct Application {
    ctx: Context,
    routers: Vec<Router>,
    interceptors: InterceptorChain<Context>,
}

impl Application {
    /// Create an application with an empty global context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an application around an already populated global context
    #[must_use]
    pub fn with_context(ctx: Context) -> Self {
        Self {
            ctx,
            ..Self::default()
        }
    }

    /// The global context
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// Register a router
    ///
    /// Links the router's context to the global context and appends it to
    /// the dispatch order. Returns the registered router so routes and
    /// interceptors can still be added to it.
    pub fn register(&mut self, mut router: Router) -> &mut Router {
        router.relate(self.ctx.clone());
        debug!(prefix = %router.prefix(), position = self.routers.len(), "Router registered");
        let index = self.routers.len();
        self.routers.push(router);
        &mut self.routers[index]
    }

    /// Inject a named shared value into the global context
    ///
    /// Visible from every router context that does not override `name`.
    pub fn extend<T: Send + Sync + 'static>(&self, name: impl Into<String>, value: T) -> &Self {
        self.ctx.set(name, value);
        self
    }

    /// Append a global request interceptor
    pub fn register_pre_interceptor<F>(&mut self, interceptor: F) -> &mut Self
    where
        F: Fn(&Context, Request) -> Result<Request> + Send + Sync + 'static,
    {
        self.interceptors.add_pre(interceptor);
        self
    }

    /// Append a global response interceptor
    pub fn register_post_interceptor<F>(&mut self, interceptor: F) -> &mut Self
    where
        F: Fn(&Context, &Request, Response) -> Result<Response> + Send + Sync + 'static,
    {
        self.interceptors.add_post(interceptor);
        self
    }

    /// Registered routers in dispatch order
    #[must_use]
    pub fn routers(&self) -> &[Router] {
        &self.routers
    }

    /// First registered router with exactly this (normalized) prefix
    #[must_use]
    pub fn router(&self, prefix: &str) -> Option<&Router> {
        let prefix = prefix.trim_end_matches(|c: char| c == '/' || c == '\\');
        self.routers.iter().find(|r| r.prefix() == prefix)
    }

    /// Handle one request
    ///
    /// Runs the global request interceptors, offers the request to each
    /// router in registration order, and runs the global response
    /// interceptors over the first response produced. The response
    /// interceptors see the request the matching router handled, with its
    /// captured variables attached.
    ///
    /// # Errors
    ///
    /// Returns `Error::RouteNotFound` if no router produced a response, and
    /// propagates interceptor, handler and decode errors unchanged.
    pub fn handle(&self, request: Request) -> Result<Response> {
        let req = self.interceptors.run_pre(&self.ctx, request)?;

        for router in &self.routers {
            if let Some((handled, res)) = router.match_request(&req)? {
                return self.interceptors.run_post(&self.ctx, &handled, res);
            }
        }

        debug!(method = %req.method, path = %req.path, "No route matched");
        Err(Error::RouteNotFound {
            method: req.method,
            path: req.path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_two_routers() -> Application {
        let mut app = Application::new();
        app.register(Router::new(""))
            .get("/", |_, _| Ok(Response::html("<h1>index</h1>")))
            .unwrap();
        app.register(Router::new("/python"))
            .get("/", |_, _| Ok(Response::html("<h1>python</h1>")))
            .unwrap();
        app
    }

    #[test]
    fn test_dispatch_by_prefix() {
        let app = app_with_two_routers();

        let res = app.handle(Request::new("GET", "/")).unwrap();
        assert_eq!(res.body, "<h1>index</h1>");

        let res = app.handle(Request::new("GET", "/python")).unwrap();
        assert_eq!(res.body, "<h1>python</h1>");
    }

    #[test]
    fn test_not_found() {
        let app = app_with_two_routers();
        let err = app.handle(Request::new("GET", "/missing")).unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, Error::RouteNotFound { path, .. } if path == "/missing"));
    }

    #[test]
    fn test_register_links_context() {
        let mut app = Application::new();
        app.extend("db", "sqlite".to_string());
        let router = app.register(Router::new("/python"));

        assert!(router.context().global().is_some());
        assert_eq!(router.context().get::<String>("db").unwrap(), "sqlite");
    }

    #[test]
    fn test_extend_after_register_is_visible() {
        let mut app = Application::new();
        app.register(Router::new("/a"));
        app.extend("version", 3u32);

        let router = app.router("/a").unwrap();
        assert_eq!(router.context().get::<u32>("version").unwrap(), 3);
    }

    #[test]
    fn test_with_context_seeds_values() {
        let ctx = Context::new();
        ctx.set("name", "demo".to_string());
        let app = Application::with_context(ctx.clone());

        assert!(app.context().same_store(&ctx));
        assert_eq!(app.context().get::<String>("name").unwrap(), "demo");
    }

    #[test]
    fn test_global_interceptors_wrap_router_result() {
        let mut app = app_with_two_routers();
        app.register_pre_interceptor(|_ctx, mut req| {
            req.set_header("x-global", "1");
            Ok(req)
        })
        .register_post_interceptor(|_ctx, req, res| {
            Ok(res.with_header("x-global-seen", req.header("x-global").unwrap_or("0")))
        });

        let res = app.handle(Request::new("GET", "/")).unwrap();
        assert_eq!(res.header("x-global-seen"), Some("1"));
    }

    #[test]
    fn test_post_interceptors_skipped_on_not_found() {
        let mut app = app_with_two_routers();
        app.register_post_interceptor(|ctx, _req, res| {
            ctx.set("post_ran", true);
            Ok(res)
        });

        assert!(app.handle(Request::new("GET", "/missing")).is_err());
        assert!(!app.context().contains("post_ran"));
    }

    #[test]
    fn test_handler_error_propagates() {
        let mut app = Application::new();
        app.register(Router::new(""))
            .get("/boom", |_, _| Err(Error::handler("boom")))
            .unwrap();

        let err = app.handle(Request::new("GET", "/boom")).unwrap_err();
        assert!(matches!(err, Error::Handler { .. }));
    }

    #[test]
    fn test_router_lookup() {
        let app = app_with_two_routers();
        assert_eq!(app.routers().len(), 2);
        assert!(app.router("/python/").is_some());
        assert!(app.router("/ruby").is_none());
    }
}
