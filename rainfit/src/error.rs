//! Errors returned by the request handlers

use serde::Serialize;
use thiserror::Error;

/// HTTP-style status for validation failures
pub const STATUS_BAD_REQUEST: u16 = 400;

/// HTTP-style status for failures inside the core computation
pub const STATUS_INTERNAL: u16 = 500;

/// A user-facing failure with a short message and optional details
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{error}")]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub status: u16,
}

impl ApiError {
    /// A validation failure (status 400)
    pub fn bad_request(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            status: STATUS_BAD_REQUEST,
        }
    }

    /// A core failure (status 500)
    pub fn internal(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
            status: STATUS_INTERNAL,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Result type for the request handlers
pub type Result<T> = std::result::Result<T, ApiError>;
