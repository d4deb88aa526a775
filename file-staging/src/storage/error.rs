//! Error types for object storage operations

use aws_sdk_s3::{
    config::http::HttpResponse,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
};
use thiserror::Error;

/// Result type for object storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while talking to the object storage provider
#[derive(Error, Debug)]
pub enum StorageError {
    /// Credentials were rejected or the bucket is not accessible
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The addressed object does not exist
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// The provider refused to sign a URL
    #[error("Signing failed: {0}")]
    Signing(String),

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

impl StorageError {
    /// Classifies an SDK failure for the object at `path`
    ///
    /// 404 and `NoSuchKey` become [`StorageError::ObjectNotFound`], 401/403 become
    /// [`StorageError::Authentication`] and 5xx responses become
    /// [`StorageError::UpstreamError`].
    pub(crate) fn from_sdk<E>(error: SdkError<E, HttpResponse>, path: &str) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        Self::from_sdk_with_context(error, path, path)
    }

    /// Same as [`StorageError::from_sdk`] for requests touching more than one object
    ///
    /// A missing object is reported as `missing_path`; every other failure carries `context`.
    pub(crate) fn from_sdk_with_context<E>(
        error: SdkError<E, HttpResponse>,
        missing_path: &str,
        context: &str,
    ) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        if let SdkError::ServiceError(ref service_err) = error {
            let status = service_err.raw().status().as_u16();

            if status == 404 || matches!(service_err.err().code(), Some("NoSuchKey" | "NotFound"))
            {
                return Self::ObjectNotFound(missing_path.to_string());
            }

            if matches!(status, 401 | 403) {
                return Self::Authentication(format!("{context}: {}", DisplayErrorContext(&error)));
            }

            if status >= 500 {
                return Self::UpstreamError(format!("{context}: {}", DisplayErrorContext(&error)));
            }
        }

        Self::Provider(format!("{context}: {}", DisplayErrorContext(&error)))
    }
}
