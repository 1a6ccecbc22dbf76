use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

/// Turn-level failures. `EffectFailed` and `InvariantViolation` resolve to
/// state-preserving replies inside the turn; only `PersistenceConflict`
/// escapes, to re-run the whole turn from freshly read state.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("effect failed: {0}")]
    EffectFailed(String),

    #[error("conversation invariant violated: {0}")]
    InvariantViolation(String),

    #[error("conversation was modified concurrently")]
    PersistenceConflict,
}
