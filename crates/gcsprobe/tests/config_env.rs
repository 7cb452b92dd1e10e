// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(missing_docs)]

//! Environment configuration tests
//!
//! Environment mutation is process-global, so everything lives in a single
//! test function to keep the harness's parallel test threads out of it.

use gcsprobe::config::{HarnessConfig, BUCKET_NAME_KEY, OBJECT_PREFIX_KEY, PROJECT_ID_KEY};
use gcsprobe::HarnessError;
use std::env;
use std::time::Duration;

#[test]
fn from_env_honors_and_requires_variables() {
    env::remove_var(BUCKET_NAME_KEY);
    env::remove_var(PROJECT_ID_KEY);
    env::remove_var(OBJECT_PREFIX_KEY);

    // Missing bucket fails at load, before any command runs.
    let err = HarnessConfig::from_env().unwrap_err();
    match err {
        HarnessError::MissingConfig { key } => assert_eq!(key, BUCKET_NAME_KEY),
        other => panic!("unexpected error: {other}"),
    }

    // An empty bucket value is as bad as an absent one.
    env::set_var(BUCKET_NAME_KEY, "");
    assert!(HarnessConfig::from_env().is_err());

    env::set_var(BUCKET_NAME_KEY, "test-bucket");
    let config = HarnessConfig::from_env().unwrap();
    assert_eq!(config.bucket, "test-bucket");
    assert!(config.project_id.is_none());
    assert_eq!(config.object_prefix, "test-");
    assert_eq!(config.command_timeout, Duration::from_secs(30));
    assert_eq!(config.signed_url_duration_minutes, 60);
    assert_eq!(config.retry.max_attempts, 3);

    env::set_var(PROJECT_ID_KEY, "my-project");
    env::set_var(OBJECT_PREFIX_KEY, "suite-a-");
    let config = HarnessConfig::from_env().unwrap();
    assert_eq!(config.project_id.as_deref(), Some("my-project"));
    assert_eq!(config.object_prefix, "suite-a-");

    env::remove_var(BUCKET_NAME_KEY);
    env::remove_var(PROJECT_ID_KEY);
    env::remove_var(OBJECT_PREFIX_KEY);
}

#[test]
fn builder_overrides_defaults() {
    let config = HarnessConfig::with_bucket("bucket")
        .project_id(Some("proj".to_string()))
        .object_prefix("custom-")
        .command_timeout(Duration::from_secs(5));
    assert_eq!(config.bucket, "bucket");
    assert_eq!(config.project_id.as_deref(), Some("proj"));
    assert_eq!(config.object_prefix, "custom-");
    assert_eq!(config.command_timeout, Duration::from_secs(5));
}

#[test]
fn path_helpers_build_canonical_paths() {
    let config = HarnessConfig::with_bucket("my-bucket");
    assert_eq!(config.gs_path("key.txt"), "gs://my-bucket/key.txt");
    assert_eq!(config.bucket_root(), "gs://my-bucket");
}
