use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// ApiError
///
/// The single error taxonomy for every endpoint:
/// - `Validation`: a missing or malformed field, duplicate name, or a blocked
///   operation such as self-deletion. Answered with 400 and the message.
/// - `Unauthorized`: no valid session, or the caller's role is insufficient
///   for the endpoint. Both cases answer 401 identically.
/// - `Database`: any storage failure, including updates/deletes that matched
///   no row. Logged with the underlying error, surfaced as a generic 500.
/// - `Internal`: non-storage unexpected failures (token signing, provider
///   transport). Same generic 500 contract.
///
/// Every response body is `{"error": <message>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for the 400 variant.
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Database(e) => {
                // The caller only ever sees the generic message.
                tracing::error!("database error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
