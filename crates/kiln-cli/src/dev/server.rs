//! Development HTTP server with live reload over WebSocket.
//!
//! Routes:
//! - `GET /` serves the built `index.html` with the reload client injected
//! - `GET /__kiln/reload.js` serves the embedded reload client
//! - `GET /connect` upgrades to the live-reload WebSocket
//! - `POST /reload` pushes a reload to every client without rebuilding
//! - `GET /error` returns the diagnostics of the latest failed build
//! - one static route per top-level subdirectory of the output directory

use crate::dev::hub::HubHandle;
use crate::dev::protocol::{DIAGNOSTIC_SEPARATOR, ReloadMessage};
use crate::dev::websocket;
use crate::error::{CliError, Result};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use kiln_bundler::INDEX_HTML_NAME;
use rust_embed::RustEmbed;
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// Path of the reload client script.
pub const RELOAD_SCRIPT_PATH: &str = "/__kiln/reload.js";

/// First path segments owned by the server itself.
const RESERVED_SEGMENTS: &[&str] = &["__kiln", "connect", "reload", "error"];

#[derive(RustEmbed)]
#[folder = "assets/"]
struct ClientAssets;

/// State shared by every request handler.
#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) static_root: Arc<PathBuf>,
    pub(crate) hub: HubHandle,
    pub(crate) client_queue: usize,
    pub(crate) send_timeout: Duration,
}

/// The live-reload front end.
pub struct ReloadServer {
    state: ServerState,
}

impl ReloadServer {
    /// Serve files from `static_root` and register WebSocket clients with `hub`.
    pub fn new(static_root: impl Into<PathBuf>, hub: HubHandle) -> Self {
        Self {
            state: ServerState {
                static_root: Arc::new(static_root.into()),
                hub,
                client_queue: crate::config::default_client_queue(),
                send_timeout: Duration::from_millis(crate::config::default_send_timeout_ms()),
            },
        }
    }

    /// Outbound messages buffered per client before it counts as dead.
    pub fn client_queue(mut self, capacity: usize) -> Self {
        self.state.client_queue = capacity.max(1);
        self
    }

    /// Upper bound on a single WebSocket send.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.state.send_timeout = timeout;
        self
    }

    /// Build the router. Static routes reflect the directories present now.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .route("/", get(handle_index))
            .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
            .route("/connect", get(websocket::handle_connect))
            .route("/reload", post(handle_reload))
            .route("/error", get(handle_error));

        for (name, dir) in static_subdirs(&self.state.static_root) {
            tracing::debug!(route = %format!("/{name}"), dir = %dir.display(), "Static route");
            router = router.nest_service(&format!("/{name}"), ServeDir::new(dir));
        }

        router
            .layer(
                // CORS: Allow all origins for dev
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(self.state.clone())
    }

    /// Bind the listening socket. Failure here is fatal for the dev server.
    pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
        TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", addr, e)))
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| CliError::Server(format!("Server error: {}", e)))
    }
}

/// Top-level subdirectories of `root`, sorted by name.
///
/// Hidden directories and names that would shadow a server route are skipped.
fn static_subdirs(root: &Path) -> Vec<(String, PathBuf)> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "No static directory");
            return Vec::new();
        }
    };

    let mut dirs: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let hidden = name.starts_with('.');
            let reserved = RESERVED_SEGMENTS.contains(&name.as_str());
            (!hidden && !reserved).then(|| (name, entry.path()))
        })
        .collect();

    dirs.sort();
    dirs
}

/// Serve index.html with the reload client injected.
async fn handle_index(State(state): State<ServerState>) -> Response {
    let path = state.static_root.join(INDEX_HTML_NAME);

    match tokio::fs::read_to_string(&path).await {
        Ok(html) => (
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            inject_reload_script(&html),
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => (
            StatusCode::NOT_FOUND,
            format!("{} not found", path.display()),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read {}: {}", path.display(), e),
        )
            .into_response(),
    }
}

/// Serve the reload client script.
async fn handle_reload_script() -> Response {
    match ClientAssets::get("reload-client.js") {
        Some(asset) => (
            [
                (header::CONTENT_TYPE, "application/javascript"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            asset.data.into_owned(),
        )
            .into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Missing embedded reload client",
        )
            .into_response(),
    }
}

/// Force every client to reload without rebuilding.
async fn handle_reload(State(state): State<ServerState>) -> Response {
    match state.hub.broadcast(ReloadMessage::Reload).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

/// Report the latest failed build, JSON or plain text depending on `Accept`.
async fn handle_error(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    let diagnostics = match state.hub.last_failure().await {
        Ok(failure) => failure.unwrap_or_default(),
        Err(e) => return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    };

    if wants_json(&headers) {
        Json(json!({ "diagnostics": diagnostics })).into_response()
    } else {
        (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            diagnostics.join(DIAGNOSTIC_SEPARATOR),
        )
            .into_response()
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

/// Inject the reload client into HTML content.
///
/// Adds the script tag before the closing `</body>` tag, or appends it when
/// there is none.
fn inject_reload_script(html: &str) -> String {
    let script_tag = format!(r#"<script src="{RELOAD_SCRIPT_PATH}"></script>"#);

    if let Some(pos) = html.rfind("</body>") {
        let mut result = String::with_capacity(html.len() + script_tag.len() + 4);
        result.push_str(&html[..pos]);
        result.push_str("  ");
        result.push_str(&script_tag);
        result.push('\n');
        result.push_str(&html[pos..]);
        return result;
    }

    let mut result = html.to_string();
    if !result.ends_with('\n') {
        result.push('\n');
    }
    result.push_str(&script_tag);
    result.push('\n');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCRIPT: &str = r#"<script src="/__kiln/reload.js"></script>"#;

    #[test]
    fn test_inject_reload_script_with_body() {
        let result = inject_reload_script("<html><body><h1>Test</h1></body></html>");

        let script_pos = result.find(SCRIPT).unwrap();
        let body_pos = result.find("</body>").unwrap();
        assert!(script_pos < body_pos);
        assert!(result.starts_with("<html><body><h1>Test</h1>"));
    }

    #[test]
    fn test_inject_reload_script_uses_last_body() {
        let html = "<body><pre>&lt;/body&gt; </body></pre></body>";
        let result = inject_reload_script(html);

        assert!(result.ends_with(&format!("  {SCRIPT}\n</body>")));
    }

    #[test]
    fn test_inject_reload_script_without_body() {
        let result = inject_reload_script("<html><h1>Test</h1></html>");
        assert!(result.ends_with(&format!("</html>\n{SCRIPT}\n")));
    }

    #[test]
    fn test_static_subdirs_skips_reserved_and_hidden() {
        let temp = TempDir::new().unwrap();
        for dir in ["js", "css", "connect", ".cache", "__kiln"] {
            std::fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        std::fs::write(temp.path().join("index.html"), "<html></html>").unwrap();

        let names: Vec<String> = static_subdirs(temp.path())
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["css".to_string(), "js".to_string()]);
    }

    #[test]
    fn test_static_subdirs_missing_root() {
        assert!(static_subdirs(Path::new("/definitely/not/a/build/dir")).is_empty());
    }

    #[test]
    fn test_embedded_client_handles_both_frames() {
        let asset = ClientAssets::get("reload-client.js").unwrap();
        let source = String::from_utf8_lossy(asset.data.as_ref()).to_string();

        assert!(source.contains("/connect"));
        assert!(source.contains(r#"frame === "reload""#));
        assert!(source.contains(r#""error:""#));
    }

    #[test]
    fn test_wants_json() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));

        headers.insert(header::ACCEPT, "text/html, application/json;q=0.9".parse().unwrap());
        assert!(wants_json(&headers));
    }
}
