use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use crate::error::PitchError;

/// Error response: `{"error": {"code", "message"}}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", "Sign in required")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", "Admin access required")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "Something went wrong, please try again",
        )
    }

    pub fn voice_unavailable() -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            "VOICE_UNAVAILABLE",
            "The voice channel is unavailable, please try again",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<PitchError> for ApiError {
    fn from(err: PitchError) -> Self {
        match err {
            PitchError::NotFound(what) => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("{} not found", what))
            }
            PitchError::InsufficientCredit { required, available } => Self::new(
                StatusCode::PAYMENT_REQUIRED,
                "INSUFFICIENT_CREDIT",
                format!(
                    "This practice needs {} credit(s); you have {}",
                    required, available
                ),
            ),
            PitchError::InvalidInput(reason) => Self::bad_request(reason),
            PitchError::Conflict(reason) => Self::conflict(reason),
            PitchError::FeedbackGenerationFailed(reason) => {
                error!("Feedback generation failed: {}", reason);
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    "FEEDBACK_FAILED",
                    "Feedback could not be generated, please try again",
                )
            }
            PitchError::PersistenceFailed(e) => {
                error!("Database error: {}", e);
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));

        (self.status, body).into_response()
    }
}
