use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{MemoryStore as SessionMemoryStore, SessionManagerLayer};

use crate::api;
use crate::state::AppState;

/// Directory static assets are served from
pub const STATIC_DIR: &str = "static";

/// Assemble the contest routes with session handling
pub fn build_router(state: Arc<AppState>) -> Router {
    let session_layer = SessionManagerLayer::new(SessionMemoryStore::default())
        .with_secure(state.config.secure_cookies);

    Router::new()
        .route("/", get(api::contest_page))
        .route("/contest", get(api::contest_page))
        .route("/contest/play", post(api::play))
        .route("/highscore", get(api::highscore_page))
        .route("/api/highscores", get(api::highscores_json))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
