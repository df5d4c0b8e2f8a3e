//! # HTTP Server
//!
//! Hyper/Tokio adapter around an [`Application`].
//!
//! The routing engine is synchronous; this module owns everything that is
//! not: accepting connections, collecting bodies, graceful shutdown. It also
//! maps routing outcomes to HTTP:
//!
//! - `Error::RouteNotFound` → 404
//! - `Error::PayloadTooLarge` → 413
//! - any other error → 500 (logged, body not leaked)

use crate::app::Application;
use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// HTTP Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub address: SocketAddr,
    /// Enable keep-alive connections
    pub keep_alive: bool,
    /// Shutdown timeout for graceful shutdown (default: 30 seconds)
    pub shutdown_timeout: Duration,
    /// Max request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 9999).into(),
            keep_alive: true,
            shutdown_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
        }
    }
}

/// HTTP server serving one [`Application`]
pub struct Server {
    config: ServerConfig,
    app: Arc<Application>,
}

impl Server {
    /// Create a server for a fully configured application
    pub fn new(app: Application) -> Self {
        Self {
            config: ServerConfig::default(),
            app: Arc::new(app),
        }
    }

    /// Replace the whole configuration
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind the server to an address
    #[must_use]
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.config.address = addr;
        self
    }

    /// Set max request body size
    pub fn set_max_body_size(&mut self, bytes: usize) {
        self.config.max_body_size = bytes;
    }

    /// Current configuration
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The served application
    #[must_use]
    pub fn app(&self) -> &Application {
        &self.app
    }

    /// Start the server with graceful shutdown on Ctrl+C
    ///
    /// # Errors
    ///
    /// Returns `Error::BindError` if the listener cannot be set up and
    /// `Error::Io` if accepting fails.
    pub async fn serve(&self) -> Result<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Start the server and stop accepting once `shutdown` completes
    ///
    /// In-flight connections get `shutdown_timeout` to drain.
    ///
    /// # Errors
    ///
    /// See [`Server::serve`].
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let addr = self.config.address;
        let bind_error = |source: std::io::Error| Error::BindError {
            address: addr.to_string(),
            source,
        };

        let socket = if addr.is_ipv4() {
            tokio::net::TcpSocket::new_v4()
        } else {
            tokio::net::TcpSocket::new_v6()
        }
        .map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        socket.bind(addr).map_err(bind_error)?;
        let listener = socket.listen(1024).map_err(bind_error)?;

        info!("Server listening on http://{}", addr);

        let active = Arc::new(AtomicUsize::new(0));
        let max_body_size = self.config.max_body_size;
        let keep_alive = self.config.keep_alive;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, remote_addr) = accept_result?;
                    let io = TokioIo::new(stream);
                    let app = self.app.clone();
                    let active = active.clone();

                    tokio::task::spawn(async move {
                        active.fetch_add(1, Ordering::Relaxed);

                        let service = service_fn(move |req| {
                            let app = app.clone();
                            async move {
                                Ok::<_, std::convert::Infallible>(
                                    handle_request(req, &app, remote_addr, max_body_size).await,
                                )
                            }
                        });

                        if let Err(err) = http1::Builder::new()
                            .keep_alive(keep_alive)
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection: {:?}", err);
                        }
                        active.fetch_sub(1, Ordering::Relaxed);
                    });
                }
                () = &mut shutdown => {
                    info!("Shutdown signal received, stopping server...");
                    break;
                }
            }
        }

        let drain = async {
            while active.load(Ordering::Relaxed) != 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        if tokio::time::timeout(self.config.shutdown_timeout, drain)
            .await
            .is_err()
        {
            warn!("Shutdown timeout elapsed with connections still open");
        }
        Ok(())
    }

    /// Execute a test request directly without network stack
    pub async fn test_request(&self, req: Request) -> Response {
        if let Some(len) = req.body_bytes().map(<[u8]>::len) {
            if len > self.config.max_body_size {
                return error_response(&Error::PayloadTooLarge {
                    limit: self.config.max_body_size,
                    actual: len,
                });
            }
        }
        respond(&self.app, req)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Run the application and turn its outcome into a response
fn respond(app: &Application, req: Request) -> Response {
    match app.handle(req) {
        Ok(res) => res,
        Err(e) => error_response(&e),
    }
}

fn error_response(err: &Error) -> Response {
    match err {
        Error::RouteNotFound { .. } => Response::html("<h1>404 Not Found</h1>").with_status(404),
        Error::PayloadTooLarge { .. } => Response::text("Payload Too Large").with_status(413),
        _ => {
            error!("Request failed: {}", err);
            Response::text("Internal Server Error").with_status(500)
        }
    }
}

async fn handle_request(
    req: hyper::Request<hyper::body::Incoming>,
    app: &Application,
    remote_addr: SocketAddr,
    max_body_size: usize,
) -> hyper::Response<Full<Bytes>> {
    let version = format!("{:?}", req.version());
    let mut request = match Request::from_hyper_with_limit(req, max_body_size).await {
        Ok(r) => r,
        Err(e @ Error::PayloadTooLarge { .. }) => return error_response(&e).into_hyper(),
        Err(e) => {
            error!("Failed to parse request: {}", e);
            return Response::text("Bad Request").with_status(400).into_hyper();
        }
    };

    request.set_header("x-client-ip", &remote_addr.ip().to_string());
    let method = request.method.clone();
    let path = request.path.clone();

    let response = respond(app, request);
    info!(
        "    {} - \"{} {} {}\" {}",
        remote_addr, method, path, version, response.status
    );
    response.into_hyper()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Router;

    fn demo_server() -> Server {
        let mut app = Application::new();
        app.register(Router::new(""))
            .get("/", |_, _| Ok(Response::html("<h1>index</h1>")))
            .unwrap()
            .get("/fail", |_, _| Err(Error::handler("database down")))
            .unwrap();
        Server::new(app)
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.address.port(), 9999);
        assert!(config.keep_alive);
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[test]
    fn test_bind_overrides_address() {
        let server = demo_server().bind(([0, 0, 0, 0], 8080).into());
        assert_eq!(server.config().address.port(), 8080);
    }

    #[tokio::test]
    async fn test_request_ok() {
        let res = demo_server().test_request(Request::new("GET", "/")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body, "<h1>index</h1>");
    }

    #[tokio::test]
    async fn test_request_not_found_is_404() {
        let res = demo_server().test_request(Request::new("GET", "/nope")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn test_request_handler_error_is_500() {
        let res = demo_server().test_request(Request::new("GET", "/fail")).await;
        assert_eq!(res.status, 500);
        assert!(!res.body.contains("database"));
    }

    #[tokio::test]
    async fn test_request_body_limit() {
        let mut server = demo_server();
        server.set_max_body_size(4);
        let res = server
            .test_request(Request::new("POST", "/").with_body("too long"))
            .await;
        assert_eq!(res.status, 413);
    }
}
