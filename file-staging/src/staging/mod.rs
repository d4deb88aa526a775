//! Staged uploads: signed URL issuance and promotion of staged objects
mod error;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    content_type,
    storage::{
        join_object_path, validate_object_path, ObjectRef, ObjectStorage, S3Storage,
        SignedUrlConfig, StorageError,
    },
    types::{Environment, DEFAULT_PRESIGNED_URL_EXPIRY_SECS, DEFAULT_TEMPORARY_FOLDER},
};

pub use error::{StagingError, StagingResult};

/// Signed write and read URLs for a freshly named staged object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUpload {
    file_name: String,
    content_type: String,
    expiry_time: DateTime<Utc>,
    write_url: String,
    read_url: String,
}

impl SignedUpload {
    /// Staged object name, without the temporary folder prefix
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Content type the uploader must send
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Instant both URLs expire
    #[must_use]
    pub const fn expiry_time(&self) -> DateTime<Utc> {
        self.expiry_time
    }

    /// URL authorizing a single upload of the object
    #[must_use]
    pub fn write_url(&self) -> &str {
        &self.write_url
    }

    /// URL authorizing a single download of the object
    #[must_use]
    pub fn read_url(&self) -> &str {
        &self.read_url
    }
}

/// Issues signed upload URLs into a temporary folder and relocates staged objects
///
/// The service is stateless apart from its storage handle, folder prefix and default URL
/// lifetime, so one instance can be shared across tasks behind an `Arc`.
pub struct FileStagingService {
    storage: Arc<dyn ObjectStorage>,
    temporary_folder: String,
    signed_url_ttl: Duration,
}

impl FileStagingService {
    /// Creates a service staging uploads under the default `temp` folder
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self::with_temporary_folder(storage, DEFAULT_TEMPORARY_FOLDER)
    }

    /// Creates a service staging uploads under `temporary_folder`
    ///
    /// Leading and trailing slashes of the folder are ignored.
    #[must_use]
    pub fn with_temporary_folder(
        storage: Arc<dyn ObjectStorage>,
        temporary_folder: impl Into<String>,
    ) -> Self {
        let temporary_folder: String = temporary_folder.into();

        Self {
            storage,
            temporary_folder: temporary_folder.trim_matches('/').to_string(),
            signed_url_ttl: Duration::from_secs(DEFAULT_PRESIGNED_URL_EXPIRY_SECS),
        }
    }

    /// Sets the lifetime used by [`FileStagingService::issue_signed_upload_with_default_expiry`]
    #[must_use]
    pub const fn with_signed_url_ttl(mut self, signed_url_ttl: Duration) -> Self {
        self.signed_url_ttl = signed_url_ttl;
        self
    }

    /// Connects to the S3 bucket configured for `environment`
    ///
    /// # Errors
    ///
    /// Returns `StagingError::Authentication` if the credentials are rejected or the bucket
    /// is not accessible
    pub async fn from_environment(environment: &Environment) -> StagingResult<Self> {
        let storage =
            S3Storage::from_credentials(&environment.bucket_credentials(), environment).await?;

        Ok(
            Self::with_temporary_folder(Arc::new(storage), environment.temporary_folder())
                .with_signed_url_ttl(Duration::from_secs(
                    environment.presigned_url_expiry_secs(),
                )),
        )
    }

    /// Bucket the service operates on
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.storage.bucket()
    }

    /// Folder uploads are staged in
    #[must_use]
    pub fn temporary_folder(&self) -> &str {
        &self.temporary_folder
    }

    /// Lifetime of URLs issued without an explicit expiry
    #[must_use]
    pub const fn signed_url_ttl(&self) -> Duration {
        self.signed_url_ttl
    }

    /// Full path of a staged object
    ///
    /// # Errors
    ///
    /// Returns `StagingError::InvalidPath` if `file_name` is not a single path segment
    pub fn temporary_path(&self, file_name: &str) -> StagingResult<String> {
        Ok(join_object_path(&self.temporary_folder, file_name)?)
    }

    /// Generates a unique object name `<uuid>.<extension>` for a content type
    ///
    /// # Errors
    ///
    /// Returns `StagingError::UnknownContentType` if no extension is registered for the
    /// content type
    pub fn name_object(content_type: &str) -> StagingResult<String> {
        content_type::unique_object_name(content_type)
            .ok_or_else(|| StagingError::UnknownContentType(content_type.to_string()))
    }

    /// Names a new staged object and signs a write URL and a read URL for it
    ///
    /// Both URLs address the same staged path and share `expiry_time`. Signing does not
    /// create the object; it exists once a client uploads through the write URL.
    ///
    /// # Errors
    ///
    /// Returns `StagingError::UnknownContentType` if the content type has no extension
    /// Returns `StagingError::Signing` if the provider refuses either URL
    #[instrument(skip(self), fields(bucket = %self.storage.bucket()))]
    pub async fn issue_signed_upload(
        &self,
        content_type: &str,
        expiry_time: DateTime<Utc>,
    ) -> StagingResult<SignedUpload> {
        let file_name = Self::name_object(content_type)?;
        let temporary_path = self.temporary_path(&file_name)?;

        let write_url = self
            .storage
            .signed_url(
                &temporary_path,
                &SignedUrlConfig::write(expiry_time, content_type),
            )
            .await?;

        let read_url = self
            .storage
            .signed_url(&temporary_path, &SignedUrlConfig::read(expiry_time))
            .await?;

        info!("Issued signed upload for {}", temporary_path);

        Ok(SignedUpload {
            file_name,
            content_type: content_type.to_string(),
            expiry_time,
            write_url,
            read_url,
        })
    }

    /// Same as [`FileStagingService::issue_signed_upload`] with an expiry `ttl` from now
    ///
    /// # Errors
    ///
    /// Returns `StagingError::Signing` if `ttl` cannot be represented as an instant, plus
    /// the errors of [`FileStagingService::issue_signed_upload`]
    pub async fn issue_signed_upload_expiring_in(
        &self,
        content_type: &str,
        ttl: Duration,
    ) -> StagingResult<SignedUpload> {
        let expiry_time = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| StagingError::Signing(format!("expiry ttl {ttl:?} is out of range")))?;

        self.issue_signed_upload(content_type, expiry_time).await
    }

    /// Same as [`FileStagingService::issue_signed_upload`], expiring after the configured
    /// [`FileStagingService::signed_url_ttl`]
    ///
    /// # Errors
    ///
    /// Same as [`FileStagingService::issue_signed_upload_expiring_in`]
    pub async fn issue_signed_upload_with_default_expiry(
        &self,
        content_type: &str,
    ) -> StagingResult<SignedUpload> {
        self.issue_signed_upload_expiring_in(content_type, self.signed_url_ttl)
            .await
    }

    /// Moves a staged object into `destination_folder` under a newly generated name
    ///
    /// The content type is inferred from the staged name's extension, so the new name keeps
    /// the same kind of extension. Afterwards the staged object no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `StagingError::ObjectNotFound` if the staged object does not exist
    /// Returns `StagingError::ContentTypeInference` if the extension is not registered
    /// Returns `StagingError::InvalidPath` if the name or folder is malformed
    #[instrument(skip(self), fields(bucket = %self.storage.bucket()))]
    pub async fn promote_to_permanent(
        &self,
        temporary_file_name: &str,
        destination_folder: &str,
    ) -> StagingResult<ObjectRef> {
        let temporary_path = self.temporary_path(temporary_file_name)?;

        let content_type = content_type::content_type_for(temporary_file_name)
            .ok_or_else(|| StagingError::ContentTypeInference(temporary_file_name.to_string()))?;
        let permanent_name = Self::name_object(content_type)?;
        let permanent_path = join_object_path(destination_folder, &permanent_name)?;

        debug!(
            "Promoting {} to {} as {}",
            temporary_path, permanent_path, content_type
        );

        let promoted = self
            .storage
            .move_object(&temporary_path, &permanent_path)
            .await?;

        info!("Promoted {} to {}", temporary_path, promoted);

        Ok(promoted)
    }

    /// Copies a staged object to `destination_path`, leaving the staged object in place
    ///
    /// # Errors
    ///
    /// Returns `StagingError::ObjectNotFound` if the staged object does not exist
    /// Returns `StagingError::InvalidPath` if the name or destination path is malformed
    #[instrument(skip(self), fields(bucket = %self.storage.bucket()))]
    pub async fn copy_to_permanent(
        &self,
        temporary_file_name: &str,
        destination_path: &str,
    ) -> StagingResult<ObjectRef> {
        let temporary_path = self.temporary_path(temporary_file_name)?;
        validate_object_path(destination_path)?;

        let copied = self
            .storage
            .copy_object(&temporary_path, destination_path)
            .await?;

        info!("Copied {} to {}", temporary_path, copied);

        Ok(copied)
    }

    /// Deletes the object at `file_path`; deleting a missing object succeeds
    ///
    /// # Errors
    ///
    /// Returns `StagingError::InvalidPath` if the path is malformed, or any provider failure
    /// other than the object being absent
    #[instrument(skip(self), fields(bucket = %self.storage.bucket()))]
    pub async fn delete_object(&self, file_path: &str) -> StagingResult<()> {
        match self.storage.delete_object(file_path).await {
            Ok(()) => {
                info!("Deleted {}", file_path);
                Ok(())
            }
            Err(StorageError::ObjectNotFound(_)) => {
                debug!("Object already absent: {}", file_path);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Whether a client has uploaded the staged object yet
    ///
    /// # Errors
    ///
    /// Returns `StagingError::InvalidPath` if the name is malformed, or any provider failure
    pub async fn is_staged(&self, temporary_file_name: &str) -> StagingResult<bool> {
        let temporary_path = self.temporary_path(temporary_file_name)?;
        Ok(self.storage.object_exists(&temporary_path).await?)
    }
}
