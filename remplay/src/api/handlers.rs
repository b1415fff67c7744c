//! HTTP request handlers
//!
//! Handlers only validate and delegate. Authentication has already happened
//! in [`AuthLayer`](super::auth_middleware::AuthLayer) by the time a
//! mutating handler runs.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use super::error::ApiError;
use super::payload::{parse_play_request, parse_volume_request};
use super::server::AppContext;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    tracks: usize,
    playing: Option<String>,
}

/// GET / - Track list page
pub async fn serve_page(State(ctx): State<AppContext>) -> Html<String> {
    Html(ctx.page.to_string())
}

/// GET /health - Liveness and summary
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "remplay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tracks: ctx.library.len(),
        playing: ctx.player.current().map(|track| track.short_path),
    })
}

/// POST / - Play a track
///
/// Body: `{"file": base64(short_path)}`. Responds once the session is
/// recorded, without waiting for playback.
pub async fn play_track(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let short_path = parse_play_request(&body).map_err(|e| {
        warn!(error = %e, "Rejected song request");
        ApiError::from(e)
    })?;

    info!(file = %short_path, "Song request");

    let track = ctx.library.find_by_short_path(&short_path).ok_or_else(|| {
        warn!(file = %short_path, "Song request for unindexed file");
        ApiError::Validation("unknown track".to_string())
    })?;

    ctx.player.play(track);
    Ok(StatusCode::OK)
}

/// POST /stop - Stop playback
pub async fn stop_playback(State(ctx): State<AppContext>) -> StatusCode {
    info!("Stop request");
    ctx.player.stop();
    StatusCode::OK
}

/// POST /volume - Set mixer volume
///
/// Body: `{"volume": 0-100}`. Waits for the mixer command.
pub async fn set_volume(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let level = parse_volume_request(&body).map_err(|e| {
        warn!(error = %e, "Rejected volume request");
        ApiError::from(e)
    })?;

    info!(level, "Volume request");
    ctx.volume.set_volume(level).await?;
    Ok(StatusCode::OK)
}
