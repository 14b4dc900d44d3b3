use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use super::response::ApiError;
use crate::modules::images::dispatcher::DispatchError;
use crate::modules::images::queue::QueueError;

/// Errors raised on synchronous request paths, mapped to HTTP status codes at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::NotFound { .. } => AppError::NotFound(err.to_string()),
            DispatchError::Queue(e) => e.into(),
            DispatchError::Source(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Broker(_) | QueueError::Backend(_) => {
                AppError::ServiceUnavailable(err.to_string())
            }
            QueueError::Encode(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
        }

        ApiError(self.to_string(), status).into_response()
    }
}
