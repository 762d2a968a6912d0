//! Analytics error types

use thiserror::Error;

/// Analytics error types
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Storage error: {0}")]
    Storage(#[from] docsift_core::AppError),

    #[error("Analytics task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AnalyticsError {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }
}

/// Result type for analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

// Convert to docsift_core AppError
impl From<AnalyticsError> for docsift_core::AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::InvalidParameter(msg) => docsift_core::AppError::validation(msg),
            AnalyticsError::Model(msg) => docsift_core::AppError::internal(msg),
            AnalyticsError::Storage(err) => err,
            AnalyticsError::Join(err) => docsift_core::AppError::internal(err.to_string()),
        }
    }
}
