//! Error types for cache store operations

use thiserror::Error;

/// Error raised by a cache store adapter.
///
/// Every variant means the same thing to the cache-aside layer: the cache
/// call did not complete. None of them is ever surfaced to a caller of the
/// executor.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Store connection failed
    #[error("connection error: {0}")]
    Connection(String),

    /// Store operation failed
    #[error("backend error: {0}")]
    Backend(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),

    /// The per-call deadline elapsed
    #[error("operation timed out")]
    Timeout,
}

impl CacheError {
    /// Whether the error points at an unreachable or unhealthy store rather
    /// than a bad payload.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            CacheError::Connection(_) | CacheError::Backend(_) | CacheError::Timeout
        )
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::Connection("refused".to_string());
        assert_eq!(err.to_string(), "connection error: refused");

        let err = CacheError::Deserialization("eof".to_string());
        assert_eq!(err.to_string(), "deserialization error: eof");

        assert_eq!(CacheError::Timeout.to_string(), "operation timed out");
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(CacheError::Timeout.is_unavailable());
        assert!(CacheError::Connection("x".into()).is_unavailable());
        assert!(!CacheError::Deserialization("x".into()).is_unavailable());
        assert!(!CacheError::Internal("x".into()).is_unavailable());
    }
}
