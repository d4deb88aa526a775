//! In-memory object storage for tests

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use url::Url;

use super::{
    validate_object_path, ObjectRef, ObjectStorage, SignedUrlConfig, StorageError, StorageResult,
};

/// Host used in signed URLs minted by [`InMemoryStorage`]
pub const SIGNED_URL_BASE: &str = "https://storage.invalid/";

/// Object storage that keeps objects in a map and mints unsigned look-alike URLs
///
/// Mirrors the provider's observable behavior: signing validates the expiry window and
/// never creates objects, missing sources are `ObjectNotFound`, and deleting a missing
/// object is reported as `ObjectNotFound` as well.
pub struct InMemoryStorage {
    bucket_name: String,
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStorage {
    /// Creates an empty bucket
    #[must_use]
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Stores `data` at `path`, as a client holding the write URL would
    pub fn put_object(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), data.into());
    }

    /// Returns the bytes stored at `path`
    #[must_use]
    pub fn get_object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Whether an object exists at `path`
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    /// Paths of all stored objects, sorted
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Number of stored objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the bucket is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_source(&self, source: &str) -> StorageResult<Vec<u8>> {
        self.get_object(source)
            .ok_or_else(|| StorageError::ObjectNotFound(source.to_string()))
    }
}

#[async_trait::async_trait]
impl ObjectStorage for InMemoryStorage {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn signed_url(&self, path: &str, config: &SignedUrlConfig) -> StorageResult<String> {
        validate_object_path(path)?;
        config.expires_in(Utc::now())?;

        let mut url = Url::parse(SIGNED_URL_BASE)
            .and_then(|base| base.join(&format!("{}/{path}", self.bucket_name)))
            .map_err(|e| StorageError::Signing(format!("Failed to build signed URL: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("X-Action", config.action.as_str())
                .append_pair("X-Expires", &config.expires.timestamp().to_string());
            if let Some(content_type) = &config.content_type {
                query.append_pair("X-Content-Type", content_type);
            }
        }

        Ok(url.to_string())
    }

    async fn move_object(&self, source: &str, destination: &str) -> StorageResult<ObjectRef> {
        validate_object_path(source)?;
        validate_object_path(destination)?;

        let mut objects = self
            .objects
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let data = objects
            .remove(source)
            .ok_or_else(|| StorageError::ObjectNotFound(source.to_string()))?;
        objects.insert(destination.to_string(), data);

        Ok(ObjectRef::new(&self.bucket_name, destination))
    }

    async fn copy_object(&self, source: &str, destination: &str) -> StorageResult<ObjectRef> {
        validate_object_path(source)?;
        validate_object_path(destination)?;

        let data = self.read_source(source)?;
        self.put_object(destination, data);

        Ok(ObjectRef::new(&self.bucket_name, destination))
    }

    async fn delete_object(&self, path: &str) -> StorageResult<()> {
        validate_object_path(path)?;

        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::ObjectNotFound(path.to_string()))
    }

    async fn object_exists(&self, path: &str) -> StorageResult<bool> {
        validate_object_path(path)?;
        Ok(self.contains(path))
    }
}
