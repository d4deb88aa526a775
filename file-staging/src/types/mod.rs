mod environment;

pub use environment::{Environment, DEFAULT_PRESIGNED_URL_EXPIRY_SECS, DEFAULT_TEMPORARY_FOLDER};
