//! Error kinds surfaced by the catalog layer

use thiserror::Error;

/// Failure raised by an entity store adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed the operation
    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Error returned to callers of the catalog and the cache-aside executor.
///
/// Cache failures never appear here; they degrade to a miss or a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The entity does not exist in the store. Never cached.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed identifier or request
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Entity store failure, passed through unchanged
    #[error(transparent)]
    Unexpected(#[from] StoreError),
}

impl CatalogError {
    /// Whether this is the not-found kind
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::NotFound("product 42".to_string());
        assert_eq!(err.to_string(), "not found: product 42");

        let err = CatalogError::InvalidArgument("page must be >= 1".to_string());
        assert_eq!(err.to_string(), "invalid argument: page must be >= 1");
    }

    #[test]
    fn test_store_error_passes_through() {
        let cause = StoreError::Unavailable("connection reset".to_string());
        let err: CatalogError = cause.clone().into();

        assert_eq!(err, CatalogError::Unexpected(cause));
        assert_eq!(err.to_string(), "store unavailable: connection reset");
        assert!(!err.is_not_found());
    }
}
