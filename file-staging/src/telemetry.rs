//! Logging setup

use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

use crate::types::Environment;

/// Installs the global tracing subscriber for `environment`
///
/// Production and staging log JSON (for the log pipeline), development logs plain text.
/// `RUST_LOG` takes precedence over the environment's default tracing level.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_tracing(environment: &Environment) -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();

    if environment.json_logs() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
    } else {
        fmt()
            .with_env_filter(env_filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
    }
}
