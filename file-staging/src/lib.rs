//! Signed-URL upload staging on top of S3-compatible object storage
//!
//! Uploads are written by clients through a signed URL into a temporary folder, then
//! promoted (moved under a fresh name), copied or deleted by the application.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Content type to extension mapping and object naming
pub mod content_type;

/// Staging service
pub mod staging;

/// Object storage collaborator
pub mod storage;

/// Logging setup
pub mod telemetry;

/// Configuration types
pub mod types;

pub use staging::{FileStagingService, SignedUpload, StagingError, StagingResult};
pub use storage::{ObjectRef, ObjectStorage, S3Storage};
pub use types::Environment;
