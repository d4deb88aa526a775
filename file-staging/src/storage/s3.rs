//! S3-based object storage operations

use std::path::PathBuf;
use std::sync::Arc;

use aws_sdk_s3::{presigning::PresigningConfig, Client as S3Client};
use chrono::{SubsecRound, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, error, info};

use super::{
    validate_object_path, ObjectRef, ObjectStorage, SignedUrlAction, SignedUrlConfig,
    StorageError, StorageResult,
};
use crate::types::Environment;

/// Characters left untouched in an `x-amz-copy-source` value
const COPY_SOURCE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The three opaque inputs needed to reach a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCredentials {
    /// Bucket name
    pub bucket_name: String,
    /// Project identifier, used as the AWS shared-config profile name
    pub project_id: Option<String>,
    /// Location of the credentials key file (AWS shared credentials format)
    pub key_file: Option<PathBuf>,
}

/// Object storage backed by an S3 bucket
pub struct S3Storage {
    s3_client: Arc<S3Client>,
    bucket_name: String,
}

impl S3Storage {
    /// Creates a new S3 storage handle without contacting the bucket
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket holding staged and permanent objects
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }

    /// Creates a new S3 storage handle and verifies the bucket is reachable
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Authentication` if the credentials are rejected or the bucket
    /// does not exist
    /// Returns `StorageError::UpstreamError` for 5xx errors
    pub async fn connect(s3_client: Arc<S3Client>, bucket_name: String) -> StorageResult<Self> {
        let storage = Self::new(s3_client, bucket_name);
        storage.verify_bucket_access().await?;

        info!("Connected to S3 bucket: {}", storage.bucket_name);

        Ok(storage)
    }

    /// Builds an S3 client from bucket credentials and connects to the bucket
    ///
    /// # Errors
    ///
    /// Same as [`S3Storage::connect`]
    pub async fn from_credentials(
        credentials: &BucketCredentials,
        environment: &Environment,
    ) -> StorageResult<Self> {
        let sdk_config = environment.aws_config(credentials).await;
        let s3_client = Arc::new(S3Client::from_conf(
            environment.s3_client_config(&sdk_config),
        ));

        Self::connect(s3_client, credentials.bucket_name.clone()).await
    }

    async fn verify_bucket_access(&self) -> StorageResult<()> {
        let result = self
            .s3_client
            .head_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match StorageError::from_sdk(e, &self.bucket_name) {
                StorageError::ObjectNotFound(bucket) => Err(StorageError::Authentication(
                    format!("bucket {bucket} does not exist or is not accessible"),
                )),
                err => {
                    error!("Failed to access bucket {}: {}", self.bucket_name, err);
                    Err(err)
                }
            },
        }
    }

    fn copy_source(&self, source: &str) -> String {
        utf8_percent_encode(
            &format!("{}/{source}", self.bucket_name),
            COPY_SOURCE_ENCODE_SET,
        )
        .to_string()
    }
}

#[async_trait::async_trait]
impl ObjectStorage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn signed_url(&self, path: &str, config: &SignedUrlConfig) -> StorageResult<String> {
        validate_object_path(path)?;

        // SigV4 dates carry whole seconds
        let now = Utc::now().trunc_subsecs(0);
        let expires_in = config.expires_in(now)?;

        debug!(
            "Generating presigned {} URL for object: {} expiring at: {}",
            config.action, path, config.expires
        );

        let presigning_config = PresigningConfig::builder()
            .start_time(now.into())
            .expires_in(expires_in)
            .build()
            .map_err(|e| {
                StorageError::Signing(format!("Failed to create presigning config: {e}"))
            })?;

        let presigned_request = match config.action {
            SignedUrlAction::Write => self
                .s3_client
                .put_object()
                .bucket(&self.bucket_name)
                .key(path)
                .set_content_type(config.content_type.clone())
                .presigned(presigning_config)
                .await
                .map_err(|e| {
                    StorageError::Signing(format!("Failed to generate presigned URL: {e}"))
                })?,
            SignedUrlAction::Read => self
                .s3_client
                .get_object()
                .bucket(&self.bucket_name)
                .key(path)
                .presigned(presigning_config)
                .await
                .map_err(|e| {
                    StorageError::Signing(format!("Failed to generate presigned URL: {e}"))
                })?,
        };

        Ok(presigned_request.uri().to_string())
    }

    async fn move_object(&self, source: &str, destination: &str) -> StorageResult<ObjectRef> {
        // S3 has no rename: copy, then drop the source
        let moved = self.copy_object(source, destination).await?;

        self.s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(source)
            .send()
            .await
            .map_err(|e| {
                error!(
                    "Copied {} to {} but failed to delete the source: {}",
                    source, destination, e
                );
                StorageError::from_sdk(e, source)
            })?;

        debug!("Moved object: {} -> {}", source, destination);

        Ok(moved)
    }

    async fn copy_object(&self, source: &str, destination: &str) -> StorageResult<ObjectRef> {
        validate_object_path(source)?;
        validate_object_path(destination)?;

        debug!("Copying object: {} -> {}", source, destination);

        self.s3_client
            .copy_object()
            .bucket(&self.bucket_name)
            .copy_source(self.copy_source(source))
            .key(destination)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to copy {} to {}: {}", source, destination, e);
                StorageError::from_sdk_with_context(
                    e,
                    source,
                    &format!("{source} -> {destination}"),
                )
            })?;

        Ok(ObjectRef::new(&self.bucket_name, destination))
    }

    async fn delete_object(&self, path: &str) -> StorageResult<()> {
        validate_object_path(path)?;

        debug!("Deleting object: {}", path);

        self.s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(path)
            .send()
            .await
            .map_err(|e| StorageError::from_sdk(e, path))?;

        Ok(())
    }

    async fn object_exists(&self, path: &str) -> StorageResult<bool> {
        validate_object_path(path)?;

        let result = self
            .s3_client
            .head_object()
            .bucket(&self.bucket_name)
            .key(path)
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!("Object exists: {}", path);
                Ok(true)
            }
            Err(e) => match StorageError::from_sdk(e, path) {
                StorageError::ObjectNotFound(_) => {
                    debug!("Object does not exist: {}", path);
                    Ok(false)
                }
                err => {
                    error!("Failed to check object existence for {}: {}", path, err);
                    Err(err)
                }
            },
        }
    }
}
