//! Development server implementation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use vellum_static::{BuildConfig, SiteBuilder};

use crate::watcher::FileWatcher;
use crate::websocket::{reload_client_script, ReloadHub, ReloadMessage};

const WS_PATH: &str = "/__livereload";
const SCRIPT_PATH: &str = "/__livereload.js";
const SCRIPT_TAG: &str = r#"<script src="/__livereload.js"></script>"#;

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Site build configuration (content dir, output dir, metadata)
    pub build: BuildConfig,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            port: 3000,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Shared server state.
struct ServerState {
    config: DevServerConfig,
    hub: ReloadHub,
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Start the development server.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .expect("Invalid address");

        // Initial build so there is something to serve
        match SiteBuilder::new(self.config.build.clone()).build().await {
            Ok(result) => {
                tracing::info!(
                    "Built {} posts and {} pages in {}ms",
                    result.posts,
                    result.pages,
                    result.duration_ms
                );
            }
            Err(e) => {
                tracing::warn!("Initial build failed: {}", e);
            }
        }

        let state = Arc::new(ServerState {
            config: self.config.clone(),
            hub: ReloadHub::new(),
        });

        // Rebuild whenever content changes
        let watch_paths = vec![self.config.build.content_dir.clone()];
        let (watcher, mut rx) =
            FileWatcher::new(&watch_paths).map_err(|e| ServerError::WatchError(e.to_string()))?;

        let state_clone = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                tracing::debug!("Change detected: {:?}", event);
                rebuild(&state_clone).await;
            }
            drop(watcher);
        });

        let app = Router::new()
            .route(WS_PATH, get(ws_handler))
            .route(SCRIPT_PATH, get(script_handler))
            .fallback(static_handler)
            .with_state(state);

        tracing::info!("Dev server running at http://{}", addr);

        if self.config.open {
            let url = format!("http://{}", addr);
            let _ = open::that(&url);
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Rebuild the site and notify clients.
async fn rebuild(state: &Arc<ServerState>) {
    match SiteBuilder::new(state.config.build.clone()).build().await {
        Ok(result) => {
            tracing::info!("Rebuilt in {}ms", result.duration_ms);
            state.hub.send(ReloadMessage::Reload);
        }
        Err(e) => {
            tracing::warn!("Rebuild failed: {}", e);
            state.hub.send(ReloadMessage::BuildFailed {
                error: e.to_string(),
            });
        }
    }
}

/// Serve files from the output directory, injecting the reload client into
/// HTML pages.
async fn static_handler(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let Some(path) = resolve_path(&state.config.build.output_dir, uri.path()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = mime_for(&path);
            if mime == "text/html; charset=utf-8" {
                let html = String::from_utf8_lossy(&bytes);
                return (
                    [(header::CONTENT_TYPE, mime)],
                    inject_reload_script(&html),
                )
                    .into_response();
            }
            ([(header::CONTENT_TYPE, mime)], bytes).into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Map a request path to a file under the output directory.
fn resolve_path(output_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let rel = request_path.trim_start_matches('/');

    if rel.split('/').any(|seg| seg == "..") {
        return None;
    }

    let mut path = output_dir.join(rel);
    if path.is_dir() || rel.is_empty() {
        path = path.join("index.html");
    }

    Some(path)
}

/// Insert the live reload script tag before `</body>`.
fn inject_reload_script(html: &str) -> String {
    match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + SCRIPT_TAG.len());
            out.push_str(&html[..pos]);
            out.push_str(SCRIPT_TAG);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{}{}", html, SCRIPT_TAG),
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hub.subscribe();

    let Ok(msg) = serde_json::to_string(&ReloadMessage::Connected) else {
        return;
    };
    if socket.send(Message::Text(msg.into())).await.is_err() {
        return;
    }

    while let Ok(reload_msg) = rx.recv().await {
        let Ok(json) = serde_json::to_string(&reload_msg) else {
            continue;
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

/// Handler for the live reload client script.
async fn script_handler() -> impl IntoResponse {
    let script = reload_client_script(WS_PATH);
    ([(header::CONTENT_TYPE, "application/javascript")], script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_server_with_default_config() {
        let server = DevServer::new(DevServerConfig::default());
        assert_eq!(server.config.port, 3000);
    }

    #[test]
    fn injects_script_before_body_close() {
        let html = "<html><body><p>hi</p></body></html>";

        let out = inject_reload_script(html);

        assert!(out.contains("<p>hi</p><script src=\"/__livereload.js\"></script></body>"));
    }

    #[test]
    fn appends_script_when_no_body_tag() {
        let out = inject_reload_script("plain");

        assert!(out.starts_with("plain<script"));
    }

    #[test]
    fn resolves_directories_to_index() {
        let out = resolve_path(Path::new("/tmp/dist"), "/").unwrap();
        assert_eq!(out, Path::new("/tmp/dist/index.html"));
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(resolve_path(Path::new("/tmp/dist"), "/../secrets").is_none());
    }

    #[test]
    fn maps_common_mime_types() {
        assert_eq!(mime_for(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(mime_for(Path::new("a.css")), "text/css");
        assert_eq!(mime_for(Path::new("feed.xml")), "application/xml");
        assert_eq!(mime_for(Path::new("mystery")), "application/octet-stream");
    }
}
