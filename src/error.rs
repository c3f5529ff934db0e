use thiserror::Error;

/// Failures surfaced across the request boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// The request was well-formed but produced nothing, e.g. an empty import.
    #[error("{0}")]
    NotFound(String),

    /// Unexpected I/O or parse failure.
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    /// Wire code used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "bad_params",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
