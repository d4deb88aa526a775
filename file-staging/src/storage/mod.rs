//! Object storage collaborator used by the staging service
mod error;
mod s3;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use error::{StorageError, StorageResult};
pub use s3::{BucketCredentials, S3Storage};

/// Longest presign window accepted by `SigV4` signed URLs (7 days)
pub const MAX_SIGNED_URL_EXPIRY_SECS: i64 = 7 * 24 * 60 * 60;

/// Action a signed URL authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedUrlAction {
    /// Single `PUT` of the object body
    Write,
    /// Single `GET` of the object body
    Read,
}

impl SignedUrlAction {
    /// Lowercase name of the action
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for SignedUrlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a signed URL request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrlConfig {
    /// Authorized action
    pub action: SignedUrlAction,
    /// Instant after which the URL stops working
    pub expires: DateTime<Utc>,
    /// Content type the uploader must send; only bound for writes
    pub content_type: Option<String>,
}

impl SignedUrlConfig {
    /// Write request bound to `content_type`
    #[must_use]
    pub fn write(expires: DateTime<Utc>, content_type: impl Into<String>) -> Self {
        Self {
            action: SignedUrlAction::Write,
            expires,
            content_type: Some(content_type.into()),
        }
    }

    /// Read request
    #[must_use]
    pub const fn read(expires: DateTime<Utc>) -> Self {
        Self {
            action: SignedUrlAction::Read,
            expires,
            content_type: None,
        }
    }

    /// Presign window measured from `now`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Signing` when the expiry is not in the future or lies beyond
    /// [`MAX_SIGNED_URL_EXPIRY_SECS`]
    pub fn expires_in(&self, now: DateTime<Utc>) -> StorageResult<std::time::Duration> {
        let window = self.expires - now;

        if window.num_seconds() <= 0 {
            return Err(StorageError::Signing(format!(
                "expiry {} is not in the future",
                self.expires.to_rfc3339()
            )));
        }

        if window.num_seconds() > MAX_SIGNED_URL_EXPIRY_SECS {
            return Err(StorageError::Signing(format!(
                "expiry {} exceeds the maximum signing window of {MAX_SIGNED_URL_EXPIRY_SECS}s",
                self.expires.to_rfc3339()
            )));
        }

        window
            .to_std()
            .map_err(|e| StorageError::Signing(format!("invalid expiry window: {e}")))
    }
}

/// Reference to a single object in a bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectRef {
    /// Bucket holding the object
    pub bucket: String,
    /// Full slash-delimited path of the object
    pub path: String,
}

impl ObjectRef {
    /// Creates a reference to `path` in `bucket`
    #[must_use]
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    /// Last path segment
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit_once('/').map_or(&self.path, |(_, name)| name)
    }

    /// Everything before the last `/`, if the object is not at the bucket root
    #[must_use]
    pub fn folder(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(folder, _)| folder)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}

/// Capabilities the staging service needs from an object store
///
/// Implementations never retry; every failure is reported as a [`StorageError`].
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Name of the bucket this handle addresses
    fn bucket(&self) -> &str;

    /// Signs a URL for a single action on the object at `path`
    ///
    /// Signing never creates the object.
    async fn signed_url(&self, path: &str, config: &SignedUrlConfig) -> StorageResult<String>;

    /// Moves `source` to `destination`; the source no longer exists afterwards
    async fn move_object(&self, source: &str, destination: &str) -> StorageResult<ObjectRef>;

    /// Copies `source` to `destination`, leaving the source untouched
    async fn copy_object(&self, source: &str, destination: &str) -> StorageResult<ObjectRef>;

    /// Deletes the object at `path`
    ///
    /// A missing object may be reported as `StorageError::ObjectNotFound`.
    async fn delete_object(&self, path: &str) -> StorageResult<()>;

    /// Checks whether an object exists at `path`
    async fn object_exists(&self, path: &str) -> StorageResult<bool>;
}

/// Validates a full object path
///
/// # Errors
///
/// Returns `StorageError::InvalidPath` for empty paths, leading or trailing `/`, empty
/// segments and `.`/`..` segments
pub fn validate_object_path(path: &str) -> StorageResult<()> {
    if path.is_empty() {
        return Err(StorageError::InvalidPath("path is empty".to_string()));
    }

    if path.starts_with('/') || path.ends_with('/') {
        return Err(StorageError::InvalidPath(format!(
            "{path}: must not start or end with '/'"
        )));
    }

    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidPath(format!(
            "{path}: contains an empty or relative segment"
        )));
    }

    Ok(())
}

/// Validates a single object name, which must not contain `/`
///
/// # Errors
///
/// Returns `StorageError::InvalidPath` if the name is not a valid single segment
pub fn validate_object_name(name: &str) -> StorageResult<()> {
    if name.contains('/') {
        return Err(StorageError::InvalidPath(format!(
            "{name}: object name must not contain '/'"
        )));
    }

    validate_object_path(name)
}

/// Joins `folder` and `name` into a validated object path
///
/// Trailing slashes on `folder` are ignored.
///
/// # Errors
///
/// Returns `StorageError::InvalidPath` if the resulting path is malformed
pub fn join_object_path(folder: &str, name: &str) -> StorageResult<String> {
    validate_object_name(name)?;
    let path = format!("{}/{name}", folder.trim_end_matches('/'));
    validate_object_path(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_validate_object_path() {
        assert!(validate_object_path("temp/abc.png").is_ok());
        assert!(validate_object_path("archive/2024/abc-copy.png").is_ok());
        assert!(validate_object_path("abc.png").is_ok());

        for invalid in ["", "/temp/abc.png", "temp/", "temp//abc.png", "temp/../abc", "./abc"] {
            assert!(
                matches!(
                    validate_object_path(invalid),
                    Err(StorageError::InvalidPath(_))
                ),
                "expected {invalid:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_join_object_path() {
        assert_eq!(join_object_path("photos", "a.png").unwrap(), "photos/a.png");
        assert_eq!(join_object_path("photos/", "a.png").unwrap(), "photos/a.png");
        assert_eq!(
            join_object_path("users/42/photos", "a.png").unwrap(),
            "users/42/photos/a.png"
        );
        assert!(join_object_path("", "a.png").is_err());
        assert!(join_object_path("photos", "nested/a.png").is_err());
        assert!(join_object_path("photos", "").is_err());
    }

    #[test]
    fn test_object_ref_name_and_folder() {
        let object = ObjectRef::new("bucket", "photos/2024/a.png");
        assert_eq!(object.name(), "a.png");
        assert_eq!(object.folder(), Some("photos/2024"));
        assert_eq!(object.to_string(), "bucket/photos/2024/a.png");

        let root = ObjectRef::new("bucket", "a.png");
        assert_eq!(root.name(), "a.png");
        assert_eq!(root.folder(), None);
    }

    #[test]
    fn test_signed_url_config_constructors() {
        let expires = Utc::now() + Duration::hours(1);

        let write = SignedUrlConfig::write(expires, "image/png");
        assert_eq!(write.action, SignedUrlAction::Write);
        assert_eq!(write.content_type.as_deref(), Some("image/png"));

        let read = SignedUrlConfig::read(expires);
        assert_eq!(read.action, SignedUrlAction::Read);
        assert_eq!(read.content_type, None);
    }

    #[test]
    fn test_expires_in_window() {
        let now = Utc::now();

        let config = SignedUrlConfig::read(now + Duration::seconds(3600));
        assert_eq!(config.expires_in(now).unwrap().as_secs(), 3600);

        let config = SignedUrlConfig::read(now + Duration::seconds(MAX_SIGNED_URL_EXPIRY_SECS));
        assert!(config.expires_in(now).is_ok());

        let past = SignedUrlConfig::read(now - Duration::seconds(1));
        assert!(matches!(past.expires_in(now), Err(StorageError::Signing(_))));

        let same_instant = SignedUrlConfig::read(now);
        assert!(matches!(
            same_instant.expires_in(now),
            Err(StorageError::Signing(_))
        ));

        let too_far =
            SignedUrlConfig::read(now + Duration::seconds(MAX_SIGNED_URL_EXPIRY_SECS + 1));
        assert!(matches!(too_far.expires_in(now), Err(StorageError::Signing(_))));
    }
}
