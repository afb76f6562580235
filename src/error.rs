use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::playfield::PlayfieldError;
use crate::store::StoreError;
use crate::types::GameId;

pub type ContestResult<T> = Result<T, ContestError>;

#[derive(Debug, thiserror::Error)]
pub enum ContestError {
    #[error("No game is bound to this session")]
    MissingSessionState,

    #[error("No active game session found")]
    GameNotFound(GameId),

    #[error("Malformed click: {0}")]
    MalformedClick(String),

    #[error("Anti-forgery token missing or invalid")]
    CsrfMismatch,

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Playfield error: {0}")]
    Playfield(#[from] PlayfieldError),

    #[error("Rendering failed: {0}")]
    Render(#[from] serde_json::Error),
}

impl ContestError {
    pub fn status(&self) -> StatusCode {
        match self {
            ContestError::GameNotFound(_) => StatusCode::NOT_FOUND,
            ContestError::MalformedClick(_) => StatusCode::BAD_REQUEST,
            ContestError::CsrfMismatch => StatusCode::FORBIDDEN,
            ContestError::MissingSessionState
            | ContestError::Session(_)
            | ContestError::Store(_)
            | ContestError::Playfield(_)
            | ContestError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every failed contest request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub msg: String,
}

impl IntoResponse for ContestError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Contest request failed");
        } else {
            tracing::warn!(error = %self, "Contest request rejected");
        }

        let body = Json(ErrorBody {
            success: false,
            msg: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ContestError::MissingSessionState.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ContestError::GameNotFound(1).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ContestError::MalformedClick("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ContestError::CsrfMismatch.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ContestError::from(StoreError::GameNotFound(2)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_response_body() {
        let response = ContestError::GameNotFound(5).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["msg"], "No active game session found");
    }
}
