//! HTTP request handlers
//!
//! Every handler is a thin call into the supervisor. Errors come back as a
//! status code plus a JSON body carrying the error text.

use super::AppState;
use crate::error::{Error, Result};
use crate::queue::{QueueEdit, QueueEntry};
use crate::supervisor::{NowPlaying, PlaybackStatus};
use axum::{extract::State, http::StatusCode, Json};
use kara_common::{naming, TrackKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

/// Requester used when the client does not name one
const DEFAULT_REQUESTER: &str = "guest";

type ApiError = (StatusCode, Json<StatusResponse>);

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct NowPlayingResponse {
    now_playing: Option<NowPlaying>,
}

#[derive(Debug, Serialize)]
pub struct QueueResponse {
    queue: Vec<QueueEntry>,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    source: PathBuf,
    requester: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    status: String,
    queue_entry_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct QueueEditRequest {
    fragment: String,
    action: QueueEdit,
}

#[derive(Debug, Deserialize)]
pub struct RandomRequest {
    count: usize,
}

#[derive(Debug, Serialize)]
pub struct RandomResponse {
    added: usize,
}

#[derive(Debug, Serialize)]
pub struct PauseResponse {
    paused: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    position: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransposeRequest {
    semitones: i32,
}

#[derive(Debug, Deserialize)]
pub struct TrackKindRequest {
    kind: TrackKind,
}

#[derive(Debug, Serialize)]
pub struct LibrarySong {
    path: PathBuf,
    title: String,
}

#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    songs: Vec<LibrarySong>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSongRequest {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct RenameSongRequest {
    path: PathBuf,
    new_name: String,
}

#[derive(Debug, Serialize)]
pub struct RenameSongResponse {
    path: PathBuf,
}

// ============================================================================
// Error mapping
// ============================================================================

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::PlayerUnreachable(_)
        | Error::DuplicateEntry(_)
        | Error::QueueEmpty
        | Error::LibraryEmpty
        | Error::InsufficientLibrary { .. }
        | Error::InvalidEdit(_) => StatusCode::CONFLICT,
        Error::EntryNotFound(_) | Error::Common(kara_common::Error::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        Error::InvalidRequest(_) | Error::Common(kara_common::Error::InvalidInput(_)) => {
            StatusCode::BAD_REQUEST
        }
        Error::ProcessStartFailure(_) | Error::Transport(_) | Error::StatusParse(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(error: Error) -> ApiError {
    (
        status_for(&error),
        Json(StatusResponse {
            status: format!("error: {}", error),
        }),
    )
}

fn command_result(command: &str, result: Result<()>) -> std::result::Result<StatusCode, ApiError> {
    match result {
        Ok(()) => {
            info!("{} command succeeded", command);
            Ok(StatusCode::OK)
        }
        Err(e) => {
            warn!("{} command failed: {}", command, e);
            Err(reject(e))
        }
    }
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "kara_player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Status Endpoints
// ============================================================================

/// GET /api/v1/now_playing
pub async fn now_playing(State(state): State<AppState>) -> Json<NowPlayingResponse> {
    Json(NowPlayingResponse {
        now_playing: state.supervisor.now_playing().await,
    })
}

/// GET /api/v1/playback/status
pub async fn playback_status(State(state): State<AppState>) -> Json<PlaybackStatus> {
    Json(state.supervisor.playback_status().await)
}

// ============================================================================
// Queue Endpoints
// ============================================================================

/// GET /api/v1/queue
pub async fn get_queue(State(state): State<AppState>) -> Json<QueueResponse> {
    Json(QueueResponse {
        queue: state.supervisor.queue_snapshot().await,
    })
}

/// POST /api/v1/queue/enqueue
pub async fn enqueue(
    State(state): State<AppState>,
    Json(req): Json<EnqueueRequest>,
) -> std::result::Result<Json<EnqueueResponse>, ApiError> {
    let requester = req
        .requester
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REQUESTER.to_string());

    let entry = state
        .supervisor
        .enqueue(req.source, &requester)
        .await
        .map_err(reject)?;

    Ok(Json(EnqueueResponse {
        status: format!("Song added to the queue: {}", entry.title),
        queue_entry_id: entry.queue_entry_id,
    }))
}

/// POST /api/v1/queue/edit
pub async fn edit_queue(
    State(state): State<AppState>,
    Json(req): Json<QueueEditRequest>,
) -> std::result::Result<StatusCode, ApiError> {
    let result = state.supervisor.queue_edit(&req.fragment, req.action).await;
    command_result("Queue edit", result)
}

/// POST /api/v1/queue/random
pub async fn add_random(
    State(state): State<AppState>,
    Json(req): Json<RandomRequest>,
) -> std::result::Result<Json<RandomResponse>, ApiError> {
    let added = state
        .supervisor
        .queue_add_random(req.count)
        .await
        .map_err(reject)?;
    Ok(Json(RandomResponse { added }))
}

/// POST /api/v1/queue/clear
pub async fn clear_queue(State(state): State<AppState>) -> StatusCode {
    info!("Clear queue request");
    state.supervisor.queue_clear().await;
    StatusCode::OK
}

// ============================================================================
// Playback Control Endpoints
// ============================================================================

/// POST /api/v1/playback/skip
pub async fn skip(State(state): State<AppState>) -> std::result::Result<StatusCode, ApiError> {
    command_result("Skip", state.supervisor.skip().await)
}

/// POST /api/v1/playback/pause - toggles pause
pub async fn toggle_pause(
    State(state): State<AppState>,
) -> std::result::Result<Json<PauseResponse>, ApiError> {
    let paused = state.supervisor.toggle_pause().await.map_err(reject)?;
    Ok(Json(PauseResponse { paused }))
}

/// POST /api/v1/playback/restart
pub async fn restart(State(state): State<AppState>) -> std::result::Result<StatusCode, ApiError> {
    command_result("Restart", state.supervisor.restart().await)
}

/// POST /api/v1/playback/volume_up
pub async fn volume_up(State(state): State<AppState>) -> std::result::Result<StatusCode, ApiError> {
    command_result("Volume up", state.supervisor.volume_up().await)
}

/// POST /api/v1/playback/volume_down
pub async fn volume_down(
    State(state): State<AppState>,
) -> std::result::Result<StatusCode, ApiError> {
    command_result("Volume down", state.supervisor.volume_down().await)
}

/// POST /api/v1/playback/fast_forward
pub async fn fast_forward(
    State(state): State<AppState>,
) -> std::result::Result<StatusCode, ApiError> {
    command_result("Fast forward", state.supervisor.fast_forward().await)
}

/// POST /api/v1/playback/fast_backward
pub async fn fast_backward(
    State(state): State<AppState>,
) -> std::result::Result<StatusCode, ApiError> {
    command_result("Fast backward", state.supervisor.fast_backward().await)
}

/// POST /api/v1/playback/seek
pub async fn seek(
    State(state): State<AppState>,
    Json(req): Json<SeekRequest>,
) -> std::result::Result<StatusCode, ApiError> {
    command_result("Seek", state.supervisor.seek(req.position).await)
}

/// POST /api/v1/playback/transpose
pub async fn transpose(
    State(state): State<AppState>,
    Json(req): Json<TransposeRequest>,
) -> std::result::Result<StatusCode, ApiError> {
    command_result("Transpose", state.supervisor.transpose(req.semitones).await)
}

/// POST /api/v1/playback/track_kind
pub async fn select_track_kind(
    State(state): State<AppState>,
    Json(req): Json<TrackKindRequest>,
) -> std::result::Result<StatusCode, ApiError> {
    command_result(
        "Track kind",
        state.supervisor.select_track_kind(req.kind).await,
    )
}

// ============================================================================
// Library Endpoints
// ============================================================================

/// GET /api/v1/library
pub async fn list_library(State(state): State<AppState>) -> Json<LibraryResponse> {
    let songs = state
        .supervisor
        .library_songs()
        .await
        .into_iter()
        .map(|path| LibrarySong {
            title: naming::display_title(&path),
            path,
        })
        .collect();
    Json(LibraryResponse { songs })
}

/// POST /api/v1/library/refresh
pub async fn refresh_library(
    State(state): State<AppState>,
) -> std::result::Result<StatusCode, ApiError> {
    command_result("Library refresh", state.supervisor.refresh_library().await)
}

/// POST /api/v1/library/delete
pub async fn delete_song(
    State(state): State<AppState>,
    Json(req): Json<DeleteSongRequest>,
) -> std::result::Result<StatusCode, ApiError> {
    command_result("Delete song", state.supervisor.delete_song(&req.path).await)
}

/// POST /api/v1/library/rename
pub async fn rename_song(
    State(state): State<AppState>,
    Json(req): Json<RenameSongRequest>,
) -> std::result::Result<Json<RenameSongResponse>, ApiError> {
    let path = state
        .supervisor
        .rename_song(&req.path, &req.new_name)
        .await
        .map_err(reject)?;
    Ok(Json(RenameSongResponse { path }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&Error::PlayerUnreachable("skip".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&Error::EntryNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&Error::InsufficientLibrary {
                requested: 3,
                available: 2
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&Error::InvalidEdit("already first".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&Error::InvalidRequest("bad name".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::ProcessStartFailure("no vlc".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::Config("bad".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
