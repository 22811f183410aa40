use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chatvault_line::LineError;
use chatvault_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid webhook signature")]
    SignatureInvalid,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Platform API error: {0}")]
    Line(#[from] LineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Media storage error: {0}")]
    MediaStorage(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::SignatureInvalid => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Line(_)
            | ServerError::Store(_)
            | ServerError::MediaStorage(_)
            | ServerError::Json(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
