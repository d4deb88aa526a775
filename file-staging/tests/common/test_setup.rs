use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client as S3Client;
use file_staging::{storage::mock::InMemoryStorage, types::Environment, FileStagingService, S3Storage};
use uuid::Uuid;

/// Setup test environment variables with all the required configuration
pub fn setup_test_env() {
    // Load test environment variables
    dotenvy::from_path(".env.example").ok();

    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Staging service backed by an in-memory bucket
pub struct InMemoryContext {
    pub storage: Arc<InMemoryStorage>,
    pub service: FileStagingService,
}

impl InMemoryContext {
    pub fn new() -> Self {
        setup_test_env();

        let storage = Arc::new(InMemoryStorage::new("test-bucket"));
        let service = FileStagingService::new(storage.clone());

        Self { storage, service }
    }

    /// Stores `data` at the staged path of `file_name`, as an uploading client would
    pub fn simulate_client_write(&self, file_name: &str, data: &[u8]) {
        let path = self
            .service
            .temporary_path(file_name)
            .expect("staged name should be valid");
        self.storage.put_object(&path, data.to_vec());
    }
}

/// Staging service backed by a fresh bucket in `LocalStack`
pub struct LocalStackContext {
    pub environment: Environment,
    pub s3_client: Arc<S3Client>,
    pub bucket_name: String,
    pub service: FileStagingService,
}

impl LocalStackContext {
    pub async fn new() -> Self {
        setup_test_env();

        let environment = Environment::Development {
            presign_expiry_override: None,
        };

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::from_keys("test", "test", None))
            .endpoint_url(
                environment
                    .override_aws_endpoint_url()
                    .expect("development has a LocalStack endpoint"),
            )
            .load()
            .await;
        let s3_client = Arc::new(S3Client::from_conf(
            environment.s3_client_config(&aws_config),
        ));

        let bucket_name = format!("staging-test-{}", Uuid::new_v4().simple());
        s3_client
            .create_bucket()
            .bucket(&bucket_name)
            .send()
            .await
            .expect("Failed to create test bucket");

        let storage = S3Storage::connect(s3_client.clone(), bucket_name.clone())
            .await
            .expect("Failed to connect to test bucket");
        let service = FileStagingService::with_temporary_folder(
            Arc::new(storage),
            environment.temporary_folder(),
        );

        Self {
            environment,
            s3_client,
            bucket_name,
            service,
        }
    }

    /// Whether an object exists in the test bucket, checked directly against S3
    pub async fn object_exists(&self, key: &str) -> bool {
        self.s3_client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .is_ok()
    }
}
