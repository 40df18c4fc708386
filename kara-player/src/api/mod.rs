//! Control API for the karaoke player
//!
//! REST endpoints for the web front-end plus an SSE stream of status events.

pub mod handlers;
pub mod sse;

use crate::supervisor::Supervisor;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Playback supervisor
    pub supervisor: Arc<Supervisor>,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest(
            "/api/v1",
            Router::new()
                // Status
                .route("/now_playing", get(handlers::now_playing))
                .route("/playback/status", get(handlers::playback_status))

                // Queue
                .route("/queue", get(handlers::get_queue))
                .route("/queue/enqueue", post(handlers::enqueue))
                .route("/queue/edit", post(handlers::edit_queue))
                .route("/queue/random", post(handlers::add_random))
                .route("/queue/clear", post(handlers::clear_queue))

                // Playback control
                .route("/playback/skip", post(handlers::skip))
                .route("/playback/pause", post(handlers::toggle_pause))
                .route("/playback/restart", post(handlers::restart))
                .route("/playback/volume_up", post(handlers::volume_up))
                .route("/playback/volume_down", post(handlers::volume_down))
                .route("/playback/fast_forward", post(handlers::fast_forward))
                .route("/playback/fast_backward", post(handlers::fast_backward))
                .route("/playback/seek", post(handlers::seek))
                .route("/playback/transpose", post(handlers::transpose))
                .route("/playback/track_kind", post(handlers::select_track_kind))

                // Library
                .route("/library", get(handlers::list_library))
                .route("/library/refresh", post(handlers::refresh_library))
                .route("/library/delete", post(handlers::delete_song))
                .route("/library/rename", post(handlers::rename_song)),
        )
        .route("/events", get(sse::event_stream))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
