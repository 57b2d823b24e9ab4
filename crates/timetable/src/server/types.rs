use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::TimetableError;

/// JSON error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiErrorType {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
}

impl ApiErrorType {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, error, context): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            error: error.to_string(),
            context,
        }
    }
}

impl From<TimetableError> for ApiErrorType {
    fn from(error: TimetableError) -> Self {
        let (status, message) = match &error {
            e if e.is_input_error() => (StatusCode::BAD_REQUEST, "Invalid period"),
            TimetableError::RecognizerEmpty => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "No timetable periods were found in the image",
            ),
            TimetableError::Recognizer { .. } => {
                (StatusCode::BAD_GATEWAY, "Timetable recognizer failed")
            }
            TimetableError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not found"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to access timetable"),
        };

        Self::from((status, message, Some(error.to_string())))
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
