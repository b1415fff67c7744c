//! HTTP server setup and routing

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use remplay_common::api::SharedSecret;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::auth_middleware::AuthLayer;
use super::handlers;
use super::ui::render_page;
use crate::error::{Error, Result};
use crate::library::LibraryIndex;
use crate::player::PlayerController;
use crate::volume::VolumeController;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub library: Arc<LibraryIndex>,
    pub player: PlayerController,
    pub volume: Arc<VolumeController>,
    pub secret: SharedSecret,
    /// Pre-rendered track list page
    pub page: Arc<str>,
}

impl AppContext {
    /// Create the context, rendering the page for `library`
    pub fn new(
        library: Arc<LibraryIndex>,
        player: PlayerController,
        volume: Arc<VolumeController>,
        secret: SharedSecret,
    ) -> Self {
        let page = Arc::from(render_page(&library));
        Self {
            library,
            player,
            volume,
            secret,
            page,
        }
    }
}

/// Build the application router
///
/// `GET /` and `GET /health` are public; every POST requires the secret.
pub fn build_router(ctx: AppContext) -> Router {
    let secret = ctx.secret.clone();

    Router::new()
        .route("/", get(handlers::serve_page).post(handlers::play_track))
        .route("/stop", post(handlers::stop_playback))
        .route("/volume", post(handlers::set_volume))
        .route("/health", get(handlers::health))
        .with_state(ctx)
        .layer(AuthLayer { secret })
        .layer(TraceLayer::new_for_http())
}

/// Serve `router` on `listener` until `shutdown` resolves
pub async fn run<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))
}
