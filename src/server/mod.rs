//! The service proxy.
//!
//! Holds the service credential so browsers and CLI clients never see it,
//! and stores share links.
//!
//! | Route          | Handler                                  |
//! |----------------|------------------------------------------|
//! | `POST /api`    | [`handlers::api`], dispatch on `mode`     |
//! | `* /api`       | 405 `Method not allowed`                  |
//! | `GET /`        | `index.html`                              |
//! | `GET /s/{id}`  | `index.html` (share link landing)         |
//! | `GET /{*path}` | static assets                             |

pub mod handlers;
pub mod protocol;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;

use crate::backend::{Backend, RemoteBackend, Route};
use crate::config::AppConfig;
use crate::share::{FsBlobStore, ShareStore};

pub use protocol::{ApiRequest, ApiResponse, Mode};

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    /// `None` when no service credential is configured.
    pub backend: Option<Arc<dyn Backend>>,
    pub shares: ShareStore,
    pub static_dir: PathBuf,
}

impl ServerState {
    pub fn from_config(config: &AppConfig) -> Self {
        let backend = config.service.api_key.clone().map(|key| {
            Arc::new(RemoteBackend::from_config(Route::Service, config, Some(key)))
                as Arc<dyn Backend>
        });
        if backend.is_none() {
            log::warn!("server: GMI_API_KEY not set, remote modes will fail");
        }
        let share_dir = config.share.resolved_dir();
        Self {
            backend,
            shares: ShareStore::new(Arc::new(FsBlobStore::new(share_dir))),
            static_dir: config.server.static_dir.clone(),
        }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/api",
            post(handlers::api).fallback(handlers::method_not_allowed),
        )
        .route("/", get(handlers::index))
        .route("/s/{id}", get(handlers::share_page))
        .route("/{*path}", get(handlers::static_file))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("server: listening on http://{addr}");

    axum::serve(listener, router(ServerState::from_config(config)))
        .await
        .context("server stopped unexpectedly")
}
