use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ConflictReport;
use serde::Serialize;
use toggle::{ToggleError, ValidationError};
use tracing::error;

/// Everything a handler can answer with besides success.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("write conflict")]
    Conflict(Box<ConflictReport>),

    #[error("{0:#}")]
    Internal(anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

impl From<ToggleError> for ApiError {
    fn from(err: ToggleError) -> Self {
        match err {
            ToggleError::Validation(e) => Self::Validation(e),
            ToggleError::Internal(e) => Self::Internal(e),
        }
    }
}

impl From<ConflictReport> for ApiError {
    fn from(report: ConflictReport) -> Self {
        Self::Conflict(Box::new(report))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(e) => {
                let label = match e.field() {
                    Some(field) => format!("invalid {}", field),
                    None => "malformed request body".to_string(),
                };
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody {
                        error: label,
                        details: e.to_string(),
                    }),
                )
                    .into_response()
            }
            Self::Conflict(report) => (StatusCode::CONFLICT, Json(*report)).into_response(),
            Self::Internal(e) => {
                error!("Request failed: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "internal error".to_string(),
                        details: format!("{:#}", e),
                    }),
                )
                    .into_response()
            }
        }
    }
}
