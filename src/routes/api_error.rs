use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use icb_reader::ProjectError;
use tracing::{error, warn};

use crate::models::api_model::ErrorBody;

/// Error returned by handlers: a status code plus a message for the user.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn project_not_found(id: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("Project not found: {id}"))
    }
}

impl From<ProjectError> for ApiError {
    fn from(e: ProjectError) -> Self {
        let status = match &e {
            _ if e.is_invalid_path() => StatusCode::UNPROCESSABLE_ENTITY,
            ProjectError::AnnotationNotFound(_) => StatusCode::NOT_FOUND,
            ProjectError::MissingTitle | ProjectError::InvalidSpan { .. } => {
                StatusCode::BAD_REQUEST
            }
            ProjectError::EmptyRange { .. } | ProjectError::NoTimeline(_) => {
                StatusCode::CONFLICT
            }
            ProjectError::NoDataFiles(_)
            | ProjectError::DataFileUnreadable { .. }
            | ProjectError::CalibrationUnreadable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("{}", e);
        } else {
            warn!("{}", e);
        }

        Self::new(status, e.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        error!("Blocking task failed: {}", e);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Background task failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
