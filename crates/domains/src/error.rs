//! # AppError
//!
//! Centralized error handling for the feed engine.
//! Maps lookup, gating and storage failures to the four caller-visible kinds.

use thiserror::Error;

/// The primary error type for all engine operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource absent or excluded by its status (e.g., Board, Post, Comment)
    #[error("{0} not found with uid {1}")]
    NotFound(&'static str, String),

    /// Access refused (secret post, level or point threshold)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Parameters the engine cannot work with
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Query executor failure, propagated verbatim
    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &'static str, uid: impl ToString) -> Self {
        Self::NotFound(what, uid.to_string())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    /// Stable machine-readable kind, handy for handler layers and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(..) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidInput(_) => "invalid_input",
            Self::Storage(_) => "storage",
        }
    }
}

/// A specialized Result type for engine logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_keep_the_driver_message() {
        let err: AppError = anyhow::anyhow!("connection reset").into();
        assert_eq!(err.kind(), "storage");
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn forbidden_is_not_not_found() {
        let err = AppError::forbidden("secret post");
        assert_eq!(err.kind(), "forbidden");
        assert_eq!(err.to_string(), "forbidden: secret post");
    }
}
