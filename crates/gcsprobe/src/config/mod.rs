//! Harness configuration.
//!
//! Loaded once from the environment before any test runs. The bucket name is
//! the only hard requirement; loading fails fast when it is absent so that a
//! mis-set-up environment is reported before the first CLI invocation.

use crate::error::{HarnessError, HarnessResult};
use crate::model::RetryPolicy;
use std::env;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the Google Cloud project.
pub const PROJECT_ID_KEY: &str = "GCS_PROJECT_ID";
/// Environment variable naming the test bucket. Required.
pub const BUCKET_NAME_KEY: &str = "GCS_BUCKET_NAME";
/// Environment variable overriding the test-object key prefix.
pub const OBJECT_PREFIX_KEY: &str = "GCS_TEST_FILE_PREFIX";

const DEFAULT_OBJECT_PREFIX: &str = "test-";
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SIGNED_URL_DURATION_MINUTES: u32 = 60;

/// Typed harness configuration.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    /// Google Cloud project identifier, when known.
    pub project_id: Option<String>,
    /// The bucket shared by all tests in the run.
    pub bucket: String,
    /// Key prefix namespacing the objects this run creates.
    pub object_prefix: String,
    /// Subprocess execution timeout.
    pub command_timeout: Duration,
    /// Default signed-URL validity window.
    pub signed_url_duration_minutes: u32,
    /// Default retry policy for flaky operations.
    pub retry: RetryPolicy,
}

impl HarnessConfig {
    /// Load configuration from the environment.
    ///
    /// Fails with [`HarnessError::MissingConfig`] when `GCS_BUCKET_NAME` is
    /// unset or empty.
    pub fn from_env() -> HarnessResult<Self> {
        let project_id = non_empty(env::var(PROJECT_ID_KEY).ok());
        if project_id.is_none() {
            warn!("{PROJECT_ID_KEY} not set; operations requiring a project will fail");
        }

        let bucket =
            non_empty(env::var(BUCKET_NAME_KEY).ok()).ok_or(HarnessError::MissingConfig {
                key: BUCKET_NAME_KEY.to_string(),
            })?;

        let object_prefix = non_empty(env::var(OBJECT_PREFIX_KEY).ok())
            .unwrap_or_else(|| DEFAULT_OBJECT_PREFIX.to_string());

        let config = Self::with_bucket(bucket)
            .project_id(project_id)
            .object_prefix(object_prefix);
        info!(
            project = config.project_id.as_deref().unwrap_or("<unset>"),
            bucket = %config.bucket,
            prefix = %config.object_prefix,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Construct a configuration with defaults around an explicit bucket.
    pub fn with_bucket(bucket: impl Into<String>) -> Self {
        Self {
            project_id: None,
            bucket: bucket.into(),
            object_prefix: DEFAULT_OBJECT_PREFIX.to_string(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            signed_url_duration_minutes: DEFAULT_SIGNED_URL_DURATION_MINUTES,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the project identifier.
    #[must_use]
    pub fn project_id(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id;
        self
    }

    /// Override the object-key prefix.
    #[must_use]
    pub fn object_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.object_prefix = prefix.into();
        self
    }

    /// Override the subprocess timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Canonical object path for a key inside the configured bucket.
    pub fn gs_path(&self, object_name: &str) -> String {
        format!("gs://{}/{}", self.bucket, object_name)
    }

    /// Canonical path of the configured bucket root.
    pub fn bucket_root(&self) -> String {
        format!("gs://{}", self.bucket)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
