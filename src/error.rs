use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Request-level failure of the detection endpoint.
///
/// Model unavailability is not represented here: adapters degrade to fallback
/// results instead of failing the request.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Unreadable media: {0}")]
    UnreadableMedia(String),

    #[error("No frames could be extracted from video")]
    NoFrames,

    #[error("Request body exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl DetectError {
    pub fn status(&self) -> StatusCode {
        match self {
            DetectError::Validation(_)
            | DetectError::Decode(_)
            | DetectError::UnreadableMedia(_)
            | DetectError::NoFrames => StatusCode::BAD_REQUEST,
            DetectError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DetectError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            DetectError::Internal(err) => {
                tracing::error!(error = ?err, "Error during detection");
                format!("{:#}", err)
            }
            other => {
                tracing::debug!(error = %other, "Rejected detection request");
                other.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Turns a handler panic into the same `500 {"error": ...}` shape as other faults.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic during detection".to_string()
    };

    tracing::error!(panic = %message, "Detection handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
        .into_response()
}
