//! # Waypost Demo
//!
//! Serves two routers:
//!
//! - `""` with `GET /`
//! - `/python` with `GET /python`, `GET /python/{id:int}` and
//!   `GET /python/{name:str}`
//!
//! ```text
//! http://127.0.0.1:9999/
//! http://127.0.0.1:9999/python/12
//! http://127.0.0.1:9999/python/python
//! ```
//!
//! `WAYPOST_ADDR` overrides the bind address, `RUST_LOG` the log filter and
//! `WAYPOST_LOG_FORMAT=json` switches to JSON logs.

use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;
use waypost_core::interceptor::{log_request, log_response, log_router_prefix, stamp_header};
use waypost_core::{Application, Context, Request, Response, Router, ScopedContext, Server};

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("waypost=info".parse()?);
    let json = std::env::var("WAYPOST_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let init = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    init.map_err(|e| anyhow::anyhow!(e))
}

fn index(_ctx: &ScopedContext, _req: &Request) -> waypost_core::Result<Response> {
    Ok(Response::html("<h1>index</h1>"))
}

fn show_python(ctx: &ScopedContext, _req: &Request) -> waypost_core::Result<Response> {
    let name: String = ctx.get("app_name")?;
    Ok(Response::html(format!("<h1>{name}: python</h1>")))
}

fn show_id(_ctx: &ScopedContext, req: &Request) -> waypost_core::Result<Response> {
    Response::json_value(&serde_json::json!({
        "id": req.vars.int("id")?,
    }))
}

fn show_name(_ctx: &ScopedContext, req: &Request) -> waypost_core::Result<Response> {
    Ok(Response::html(format!("<h1>{}</h1>", req.vars.str("name")?)))
}

/// Build the demo application
fn build_app() -> waypost_core::Result<Application> {
    let mut app = Application::new();
    app.extend("app_name", "waypost-demo".to_string());

    app.register_pre_interceptor(log_request::<Context>)
        .register_post_interceptor(stamp_header::<Context>("x-powered-by", "waypost"))
        .register_post_interceptor(log_response::<Context>);

    app.register(Router::new("")).get("/", index)?;

    app.register(Router::new("/python"))
        .register_pre_interceptor(log_router_prefix)
        .get("/", show_python)?
        .get("/{id:int}", show_id)?
        .get("/{name:str}", show_name)?;

    Ok(app)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let addr: Option<SocketAddr> = std::env::var("WAYPOST_ADDR")
        .ok()
        .map(|a| a.parse::<SocketAddr>())
        .transpose()?;

    let mut server = Server::new(build_app()?);
    if let Some(addr) = addr {
        server = server.bind(addr);
    }
    tracing::info!(
        address = %server.config().address,
        routers = server.app().routers().len(),
        "Starting waypost demo"
    );

    server.serve().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_routes() {
        let app = build_app().unwrap();

        let res = app.handle(Request::new("GET", "/")).unwrap();
        assert_eq!(res.body, "<h1>index</h1>");
        assert_eq!(res.header("x-powered-by"), Some("waypost"));

        let res = app.handle(Request::new("GET", "/python")).unwrap();
        assert_eq!(res.body, "<h1>waypost-demo: python</h1>");

        let res = app.handle(Request::new("GET", "/python/12")).unwrap();
        assert_eq!(res.body, r#"{"id":12}"#);

        let res = app.handle(Request::new("GET", "/python/python")).unwrap();
        assert_eq!(res.body, "<h1>python</h1>");

        assert!(app
            .handle(Request::new("GET", "/missing"))
            .unwrap_err()
            .is_not_found());
    }
}
