//! HTTP error responses
//!
//! Every failure reaching the gateway is converted here into a status code
//! and a JSON-encoded message string, e.g. `"wrong password"`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use super::payload::PayloadError;
use crate::volume::VolumeError;

/// Gateway error
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong `authorization` header
    #[error("wrong password")]
    Unauthorized,

    /// Malformed payload, path or volume
    #[error("{0}")]
    Validation(String),

    /// An external command failed while serving the request
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<VolumeError> for ApiError {
    fn from(err: VolumeError) -> Self {
        match err {
            VolumeError::OutOfRange(_) => ApiError::Validation("suspicious request".to_string()),
            VolumeError::Process(e) => ApiError::Internal(format!("volume command failed: {}", e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_string())).into_response()
    }
}
