//! Error types for staging operations

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for staging operations
pub type StagingResult<T> = Result<T, StagingError>;

/// Errors surfaced by [`FileStagingService`](super::FileStagingService)
#[derive(Error, Debug)]
pub enum StagingError {
    /// Credentials were rejected or the bucket is not accessible
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No file extension is registered for the content type
    #[error("Unknown content type: {0}")]
    UnknownContentType(String),

    /// The file name's extension does not map back to a content type
    #[error("Cannot infer content type from file name: {0}")]
    ContentTypeInference(String),

    /// The provider refused to sign a URL
    #[error("Signing failed: {0}")]
    Signing(String),

    /// The addressed object does not exist
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Object path or name is malformed
    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    /// Upstream service error (5xx from the provider)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// Any other provider failure
    #[error("Provider error: {0}")]
    Provider(String),
}

impl StagingError {
    /// Whether the same request may succeed if issued again later
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamError(_))
    }
}

impl From<StorageError> for StagingError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Authentication(msg) => Self::Authentication(msg),
            StorageError::ObjectNotFound(path) => Self::ObjectNotFound(path),
            StorageError::Signing(msg) => Self::Signing(msg),
            StorageError::InvalidPath(msg) => Self::InvalidPath(msg),
            StorageError::UpstreamError(msg) => Self::UpstreamError(msg),
            StorageError::Provider(msg) => Self::Provider(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_keep_their_kind() {
        assert!(matches!(
            StagingError::from(StorageError::ObjectNotFound("temp/a.png".to_string())),
            StagingError::ObjectNotFound(path) if path == "temp/a.png"
        ));
        assert!(matches!(
            StagingError::from(StorageError::Authentication("denied".to_string())),
            StagingError::Authentication(_)
        ));
        assert!(matches!(
            StagingError::from(StorageError::Signing("expired".to_string())),
            StagingError::Signing(_)
        ));
        assert!(matches!(
            StagingError::from(StorageError::UpstreamError("503".to_string())),
            StagingError::UpstreamError(_)
        ));
    }

    #[test]
    fn test_only_upstream_errors_are_retryable() {
        assert!(StagingError::UpstreamError("503".to_string()).is_retryable());
        assert!(!StagingError::Provider("denied".to_string()).is_retryable());
        assert!(!StagingError::ObjectNotFound("temp/a.png".to_string()).is_retryable());
    }
}
