//! Development server implementation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use forgedoc_adapters::MacroExpander;
use forgedoc_site::SiteBuilder;

use crate::api::expand_handler;
use crate::reload::{reload_client_script, ReloadHub, ReloadMessage};
use crate::watcher::{FileWatcher, WatchEvent};

/// WebSocket path for live reload.
pub const RELOAD_PATH: &str = "/__reload";

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Directory served at `/`
    pub serve_dir: PathBuf,

    /// Paths that trigger a rebuild when they change
    pub watch_paths: Vec<PathBuf>,

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
            serve_dir: PathBuf::from("build/content"),
            watch_paths: vec![PathBuf::from("src")],
            port: 5173,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),
}

/// Shared server state.
pub(crate) struct AppState {
    pub(crate) hub: ReloadHub,
    pub(crate) expander: Option<Arc<MacroExpander>>,
    pub(crate) builder: Option<Arc<SiteBuilder>>,
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
    expander: Option<Arc<MacroExpander>>,
    builder: Option<Arc<SiteBuilder>>,
}

impl DevServer {
    /// Create a server that only serves files.
    pub fn new(config: DevServerConfig) -> Self {
        Self {
            config,
            expander: None,
            builder: None,
        }
    }

    /// Answer `POST /api/expand` with `expander`.
    pub fn with_expander(mut self, expander: Arc<MacroExpander>) -> Self {
        self.expander = Some(expander);
        self
    }

    /// Rebuild with `builder` whenever a watched path changes.
    pub fn with_builder(mut self, builder: Arc<SiteBuilder>) -> Self {
        self.builder = Some(builder);
        self
    }

    pub fn config(&self) -> &DevServerConfig {
        &self.config
    }

    /// Start the server and run until it fails.
    pub async fn start(self) -> Result<(), ServerError> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| ServerError::InvalidAddress(address.clone()))?;

        let state = Arc::new(AppState {
            hub: ReloadHub::new(),
            expander: self.expander.clone(),
            builder: self.builder.clone(),
        });

        if self.builder.is_some() {
            rebuild(&state, None).await;

            let (watcher, mut rx) = FileWatcher::new(&self.config.watch_paths)
                .map_err(|e| ServerError::WatchError(e.to_string()))?;

            let watch_state = Arc::clone(&state);
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    handle_watch_event(&watch_state, event).await;
                }
                // Keep watcher alive
                drop(watcher);
            });
        }

        let app = router(state, &self.config.serve_dir);

        tracing::info!("Starting dev server at http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        if self.config.open {
            let url = format!("http://{}", addr);
            if let Err(e) = open::that(&url) {
                tracing::debug!("Failed to open browser: {}", e);
            }
        }

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

fn router(state: Arc<AppState>, serve_dir: &Path) -> Router {
    Router::new()
        .route("/api/expand", post(expand_handler))
        .route(RELOAD_PATH, get(ws_handler))
        .route("/__reload.js", get(reload_script_handler))
        .layer(CorsLayer::permissive())
        .fallback_service(ServeDir::new(serve_dir))
        .with_state(state)
}

/// Rebuild after a change and tell clients.
async fn handle_watch_event(state: &Arc<AppState>, event: WatchEvent) {
    if let Some(builder) = &state.builder {
        if event.path().starts_with(&builder.config().output_dir) {
            return;
        }
    }

    tracing::info!("Changed: {}", event.path().display());

    match event {
        WatchEvent::ContentModified(path) if path.exists() => rebuild(state, Some(path)).await,
        _ => rebuild(state, None).await,
    }
}

/// Rebuild one file, or everything when `path` is `None` or the single-file
/// build fails.
async fn rebuild(state: &Arc<AppState>, path: Option<PathBuf>) {
    let Some(builder) = state.builder.clone() else {
        return;
    };

    let start = Instant::now();
    let result = tokio::task::spawn_blocking(move || {
        if let Some(path) = path {
            match builder.build_file(&path) {
                Ok(_) => return Ok(1),
                Err(e) => tracing::debug!("Single-file rebuild failed, rebuilding all: {}", e),
            }
        }
        builder.build().map(|result| result.files)
    })
    .await;

    let message = match result {
        Ok(Ok(files)) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::info!("Rebuilt {} files in {}ms", files, duration_ms);
            ReloadMessage::Rebuilt { files, duration_ms }
        }
        Ok(Err(e)) => {
            tracing::error!("Build failed: {}", e);
            ReloadMessage::BuildFailed {
                message: e.to_string(),
            }
        }
        Err(e) => {
            tracing::error!("Build task failed: {}", e);
            ReloadMessage::BuildFailed {
                message: e.to_string(),
            }
        }
    };

    state.hub.send(message);
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Forward reload messages to one client until it disconnects.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.hub.subscribe();

    if send_json(&mut socket, &ReloadMessage::Connected).await.is_err() {
        return;
    }

    loop {
        match rx.recv().await {
            Ok(msg) => {
                if send_json(&mut socket, &msg).await.is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!("Reload client lagged by {} messages", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn send_json(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

async fn reload_script_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript")],
        reload_client_script(RELOAD_PATH),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_server_with_default_config() {
        let server = DevServer::new(DevServerConfig::default());
        assert_eq!(server.config().port, 5173);
        assert!(server.builder.is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_address() {
        let server = DevServer::new(DevServerConfig {
            host: "not a host".to_string(),
            open: false,
            ..Default::default()
        });

        assert!(matches!(
            server.start().await,
            Err(ServerError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn rebuild_without_builder_sends_nothing() {
        let state = Arc::new(AppState {
            hub: ReloadHub::new(),
            expander: None,
            builder: None,
        });
        let mut rx = state.hub.subscribe();

        rebuild(&state, None).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn serves_reload_script() {
        let response = reload_script_handler().await.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        assert!(String::from_utf8(bytes.to_vec()).unwrap().contains(RELOAD_PATH));
    }
}
