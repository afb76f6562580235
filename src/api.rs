//! HTTP handlers for the contest pages and the play endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Html,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use crate::csrf;
use crate::error::{ContestError, ContestResult};
use crate::render;
use crate::session::SessionContext;
use crate::state::{AppState, ClickOutcome, Highscores};
use crate::types::{Click, RevealedCard};

#[derive(Debug, Clone, Deserialize)]
pub struct PlayRequest {
    pub click: Click,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayResponse {
    pub success: bool,
    pub click: Vec<RevealedCard>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub is_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

impl From<ClickOutcome> for PlayResponse {
    fn from(outcome: ClickOutcome) -> Self {
        match outcome {
            ClickOutcome::Opened(card) => Self {
                success: true,
                click: vec![card],
                ..Default::default()
            },
            ClickOutcome::Resolved { turn, completion } => Self {
                success: true,
                click: turn.clicks.to_vec(),
                is_match: Some(turn.is_match),
                completed: completion.as_ref().map(|_| true),
                score: completion.map(|c| c.score),
                csrf_token: None,
            },
        }
    }
}

/// Start a new game and render the contest page.
///
/// GET /contest
pub async fn contest_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> ContestResult<Html<String>> {
    let mut ctx = SessionContext::load(&session).await?;
    let started = state.start_game(&mut ctx).await?;
    ctx.store(&session).await?;

    Ok(Html(render::contest_page(&started)?))
}

/// Evaluate one click of the session's game.
///
/// POST /contest/play
///
/// Body: `{"click": {"row": 0, "column": 1}}`. The session's anti-forgery
/// token must be sent in the `X-CSRFToken` header when enforcement is on.
pub async fn play(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
    payload: Result<Json<PlayRequest>, JsonRejection>,
) -> ContestResult<Json<PlayResponse>> {
    let mut ctx = SessionContext::load(&session).await?;
    if ctx.game.is_none() {
        return Err(ContestError::MissingSessionState);
    }
    if state.config.csrf_enforced && !csrf::verify(&ctx, &headers) {
        return Err(ContestError::CsrfMismatch);
    }
    let Json(request) = payload.map_err(|e| ContestError::MalformedClick(e.body_text()))?;

    let outcome = state.play_click(&mut ctx, request.click).await?;

    let mut response = PlayResponse::from(outcome);
    response.csrf_token = Some(csrf::ensure_token(&mut ctx));
    ctx.store(&session).await?;

    Ok(Json(response))
}

/// Render the highscore page.
///
/// GET /highscore
pub async fn highscore_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> ContestResult<Html<String>> {
    let highscores = load_highscores(&state, &session).await?;
    Ok(Html(render::highscore_page(&highscores)))
}

/// Highscores as JSON.
///
/// GET /api/highscores
pub async fn highscores_json(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> ContestResult<Json<Highscores>> {
    Ok(Json(load_highscores(&state, &session).await?))
}

async fn load_highscores(state: &AppState, session: &Session) -> ContestResult<Highscores> {
    let ctx = SessionContext::load(session).await?;
    Ok(state.highscores(ctx.player.as_deref()).await?)
}
