//! Error types for the holocron engine.

use thiserror::Error;

/// Result type alias using HolocronError.
pub type Result<T> = std::result::Result<T, HolocronError>;

/// Errors that can occur across the engine.
#[derive(Error, Debug)]
pub enum HolocronError {
    /// A batch contained a vector whose width differs from the locked store dimension.
    #[error("Vector dimension mismatch: store is locked to {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Database open/query failure.
    #[error("Store error: {message}")]
    Store { message: String },

    /// Embedding transport or model failure.
    #[error("Embedder error: {message}")]
    Embedder { message: String },

    /// Git invocation failure.
    #[error("Git error: {message}")]
    Git { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Indexing pipeline failure.
    #[error("Index error: {message}")]
    Index { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HolocronError {
    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an embedder error.
    pub fn embedder(message: impl Into<String>) -> Self {
        Self::Embedder {
            message: message.into(),
        }
    }

    /// Create a git error.
    pub fn git(message: impl Into<String>) -> Self {
        Self::Git {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an index error.
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index {
            message: message.into(),
        }
    }

    /// Stable error code for callers that map errors over a wire boundary.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::Store { .. } => "STORE_IO",
            Self::Embedder { .. } => "EMBEDDER_IO",
            Self::Git { .. } => "GIT_UNAVAILABLE",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Index { .. } => "INDEX_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HolocronError::DimensionMismatch {
            expected: 768,
            got: 3,
        };
        assert!(err.to_string().contains("768"));
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            HolocronError::DimensionMismatch {
                expected: 4,
                got: 2
            }
            .error_code(),
            "DIMENSION_MISMATCH"
        );
        assert_eq!(HolocronError::store("boom").error_code(), "STORE_IO");
        assert_eq!(HolocronError::git("no repo").error_code(), "GIT_UNAVAILABLE");
    }
}
