use crate::pcd::PcdError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use octree::BuildError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the service operations and the HTTP gateway.
///
/// Everything except [`ApiError::Io`] and [`ApiError::Internal`] is a caller
/// input or sequencing problem and maps to a 400; the request fails cleanly
/// and resubmission is the only retry mechanism.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no tree is currently loaded")]
    NoTree,
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("invalid point-cloud file: {0}")]
    Pcd(#[from] PcdError),
    #[error("missing multipart field: {0}")]
    MissingField(&'static str),
    #[error("height must be a non-negative integer")]
    InvalidDepth,
    #[error("resolution must be a number")]
    InvalidResolution,
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Io(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "rejected request");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
