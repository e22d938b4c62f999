use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failure taxonomy for structure aggregation. Soft data problems (missing
/// course records, unknown year levels) are absorbed into fallback buckets
/// and never surface here.
#[derive(Error, Debug)]
pub enum StructureError {
    #[error("{0}")]
    Validation(String),

    #[error("dependency failure: {0}")]
    Dependency(anyhow::Error),
}

impl StructureError {
    pub fn validation(message: impl Into<String>) -> Self {
        StructureError::Validation(message.into())
    }

    pub fn dependency(err: impl Into<anyhow::Error>) -> Self {
        StructureError::Dependency(err.into())
    }
}

impl IntoResponse for StructureError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            StructureError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            StructureError::Dependency(err) => {
                // Detail goes to the log, never to the client.
                error!("structure aggregation failed: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        let body = Json(json!({ "success": false, "error": message }));
        (status, body).into_response()
    }
}
