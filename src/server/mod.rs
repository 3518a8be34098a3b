//! HTTP surface for the development server
//!
//! Three concerns on one loopback listener: the diagnostic ingress
//! (`POST /log`), the hot-reload poll (`GET /reload-check`), and static file
//! serving for everything else. All responses carry permissive CORS headers
//! so a page loaded from another origin during development can still reach
//! the endpoints.

pub mod ingress;

use anyhow::{Context, Result};
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use colored::Colorize;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::console;
use crate::watch::hash::WATCH_EXTENSIONS;
use crate::watch::HashWatcher;

/// Shared request-handler state. The hash watcher is owned exclusively by
/// the request path; the mutex only serializes concurrent `/reload-check`
/// calls and is never held across an await point.
pub struct AppState {
    pub watcher: Mutex<HashWatcher>,
}

/// Build the router: diagnostic endpoints, CORS, request tracing, and the
/// static-file fallback rooted at `root` (directory index resolution,
/// content-type inference, and 404s come with `ServeDir`).
pub fn router(state: Arc<AppState>, root: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/log", post(ingress::ingest_log))
        .route("/reload-check", get(ingress::reload_check))
        .fallback_service(ServeDir::new(root))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind loopback and serve until ctrl-c.
///
/// "Address in use" is the one bind failure worth a tailored message: it
/// means reclamation did not win and the operator has to evict the holder
/// or pick another port.
pub async fn run(port: u16, root: PathBuf) -> Result<()> {
    let mut watcher = HashWatcher::new(root.clone());
    watcher.scan();
    console::server_banner(port, watcher.len(), WATCH_EXTENSIONS);

    let state = Arc::new(AppState {
        watcher: Mutex::new(watcher),
    });
    let app = router(state, &root);

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            eprintln!(
                "{} Port {port} is already in use. Stop the process holding it or pass a different --port.",
                "✗".red().bold()
            );
            return Err(e).context("bind failed: address in use");
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to bind 127.0.0.1:{port}"));
        }
    };

    tracing::info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    println!("\n{} Shutting down server", "→".cyan().bold());
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app(root: &Path) -> Router {
        let mut watcher = HashWatcher::new(root);
        watcher.scan();
        let state = Arc::new(AppState {
            watcher: Mutex::new(watcher),
        });
        router(state, root)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_log_accepts_json_event() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/log")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"level":"error","message":"boom"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "logged"}));
    }

    #[tokio::test]
    async fn test_log_rejects_malformed_body() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/log")
                    .body(Body::from("not-json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reload_check_false_then_true() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        let app = test_app(dir.path());

        let request = || {
            Request::builder()
                .uri("/reload-check")
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(body_json(response).await, json!({"reload": false}));

        fs::write(dir.path().join("index.html"), "<html>edited</html>").unwrap();
        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(body_json(response).await, json!({"reload": true}));

        // Snapshot was updated by the check itself.
        let response = app.oneshot(request()).await.unwrap();
        assert_eq!(body_json(response).await, json!({"reload": false}));
    }

    #[tokio::test]
    async fn test_cors_header_on_responses() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/reload-check")
                    .header(header::ORIGIN, "http://example.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .map(|v| v.to_str().unwrap()),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let dir = TempDir::new().unwrap();
        let app = test_app(dir.path());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/log")
                    .header(header::ORIGIN, "http://example.test")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let allow_methods = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        assert!(allow_methods.contains("POST"));
        assert!(allow_methods.contains("GET"));
        assert!(allow_methods.contains("OPTIONS"));
    }

    #[tokio::test]
    async fn test_static_fallback_serves_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>hello</h1>").unwrap();
        let app = test_app(dir.path());

        // Directory index resolution.
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>hello</h1>");

        // Missing path.
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/missing.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
