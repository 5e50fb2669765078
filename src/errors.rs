use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::display_time;
use crate::services::scheduling::SchedulingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{message}")]
    Conflict {
        message: String,
        alternatives: Vec<String>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::InvalidInput(msg) => AppError::InvalidInput(msg),
            SchedulingError::Conflict { ref alternatives, .. } => AppError::Conflict {
                alternatives: alternatives.iter().map(|t| display_time(*t)).collect(),
                message: err.to_string(),
            },
            SchedulingError::NotFound(n) => AppError::NotFound(format!("booking BOOK-{n}")),
            SchedulingError::Database(e) => AppError::Internal(e.to_string()),
            SchedulingError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let AppError::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }

        let body = match &self {
            AppError::Conflict { alternatives, .. } => serde_json::json!({
                "error": self.to_string(),
                "alternatives": alternatives,
            }),
            AppError::Internal(_) => serde_json::json!({ "error": "internal error" }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}
