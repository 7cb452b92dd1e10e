//! Test data generators and bucket plumbing for scenario tests.
//!
//! Every generated object name embeds a timestamp and a random id, which is
//! the only isolation mechanism between concurrently running suites sharing
//! one bucket. [`TrackedObjects`] deletes everything a test created when it
//! goes out of scope, however the test body exits.

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::exec::ShellRunner;
use crate::storage::StorageCli;
use std::fs;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;
use tracing::{info, warn};
use uuid::Uuid;

/// Unique object name of the form `<prefix><timestamp>-<8-char-id>.<ext>`.
pub fn unique_object_name(prefix: &str, extension: &str) -> String {
    format!("{prefix}{}-{}.{extension}", timestamp_millis(), short_id())
}

/// Roughly `kb` kilobytes of text, unique per call via a trailer carrying
/// the generation timestamp and a fresh id.
pub fn random_content(kb: usize) -> String {
    let chunk = random_chunk();
    let mut content = String::with_capacity(kb * 1024 + 128);
    for _ in 0..kb {
        content.push_str(&chunk);
    }
    content.push_str(&format!(
        "\nGenerated at: {}\nUnique ID: {}\n",
        timestamp_millis(),
        Uuid::new_v4()
    ));
    content
}

/// Small unique JSON document.
pub fn json_content() -> String {
    serde_json::json!({
        "id": Uuid::new_v4().to_string(),
        "timestamp": timestamp_millis(),
        "data": {
            "message": "Test data for storage CLI scenarios",
            "random": short_id(),
            "size": "small",
        },
    })
    .to_string()
}

/// CSV document with a header and `rows` unique data rows.
pub fn csv_content(rows: usize) -> String {
    let mut content = String::from("id,name,value,timestamp\n");
    for _ in 0..rows {
        let id = Uuid::new_v4();
        let mut name = short_id();
        name.truncate(5);
        content.push_str(&format!(
            "{},test-{name},{},{}\n",
            short_id(),
            small_value(&id),
            timestamp_millis(),
        ));
    }
    content
}

/// Minimal unique HTML page.
pub fn html_content() -> String {
    let id = Uuid::new_v4();
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n    <title>Test File {id}</title>\n</head>\n\
         <body>\n    <h1>Storage CLI Test File</h1>\n    <p>ID: {id}</p>\n    \
         <p>Timestamp: {}</p>\n</body>\n</html>\n",
        timestamp_millis()
    )
}

/// `kb` kilobytes of arbitrary bytes.
pub fn binary_content(kb: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(kb * 1024);
    while bytes.len() < kb * 1024 {
        bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    }
    bytes.truncate(kb * 1024);
    bytes
}

fn random_chunk() -> String {
    // 32 hex chars per id, 32 ids per kilobyte.
    let mut chunk = String::with_capacity(1024);
    for _ in 0..32 {
        chunk.push_str(&Uuid::new_v4().simple().to_string());
    }
    chunk
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

fn small_value(id: &Uuid) -> u32 {
    let bytes = id.as_bytes();
    ((u32::from(bytes[0]) << 8) | u32::from(bytes[1])) % 1000
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Bucket-level plumbing shared by scenario tests.
#[derive(Clone, Debug)]
pub struct BucketFixture {
    cli: StorageCli,
    config: HarnessConfig,
}

impl BucketFixture {
    /// Fixture over a runner honoring the configured command timeout.
    pub fn new(config: HarnessConfig) -> Self {
        let runner = ShellRunner::with_timeout(config.command_timeout);
        Self {
            cli: StorageCli::with_runner(runner),
            config,
        }
    }

    /// The wrapped CLI facade.
    pub fn cli(&self) -> &StorageCli {
        &self.cli
    }

    /// The configuration this fixture was built around.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Unique object name under the configured prefix.
    pub fn unique_name(&self, extension: &str) -> String {
        unique_object_name(&self.config.object_prefix, extension)
    }

    /// Upload text content under `object_name`, returning the full path.
    ///
    /// Content is staged through a temporary file because the CLI only
    /// copies from the filesystem; the staging file is removed on return.
    pub fn upload_text(&self, object_name: &str, content: &str) -> HarnessResult<String> {
        self.upload_bytes(object_name, content.as_bytes())
    }

    /// Upload raw bytes under `object_name`, returning the full path.
    pub fn upload_bytes(&self, object_name: &str, content: &[u8]) -> HarnessResult<String> {
        let mut staging = NamedTempFile::new()?;
        staging.write_all(content)?;
        staging.flush()?;

        let gs_path = self.config.gs_path(object_name);
        let outcome = self
            .cli
            .copy(&staging.path().to_string_lossy(), &gs_path)?;
        if !outcome.success() {
            return Err(HarnessError::TransferFailed {
                stderr: outcome.stderr().to_string(),
            });
        }
        info!(path = %gs_path, bytes = content.len(), "object uploaded");
        Ok(gs_path)
    }

    /// Download an object to a temporary file, removed when the handle drops.
    pub fn download(&self, gs_path: &str) -> HarnessResult<NamedTempFile> {
        let destination = NamedTempFile::new()?;
        let outcome = self
            .cli
            .copy(gs_path, &destination.path().to_string_lossy())?;
        if !outcome.success() {
            return Err(HarnessError::TransferFailed {
                stderr: outcome.stderr().to_string(),
            });
        }
        info!(path = %gs_path, "object downloaded");
        Ok(destination)
    }

    /// Download an object and return its content as UTF-8 text.
    pub fn read_content(&self, gs_path: &str) -> HarnessResult<String> {
        let downloaded = self.download(gs_path)?;
        Ok(fs::read_to_string(downloaded.path())?)
    }

    /// True iff an exact-path listing yields the path.
    pub fn object_exists(&self, gs_path: &str) -> bool {
        self.cli.object_exists(gs_path)
    }

    /// Best-effort delete; failure is logged, never raised.
    pub fn delete(&self, gs_path: &str) {
        match self.cli.delete_object(gs_path) {
            Ok(outcome) if outcome.success() => info!(path = %gs_path, "object deleted"),
            Ok(outcome) => {
                warn!(path = %gs_path, stderr = outcome.stderr(), "failed to delete object");
            }
            Err(err) => warn!(path = %gs_path, error = %err, "failed to delete object"),
        }
    }
}

/// Objects created by one test, deleted when the tracker drops.
///
/// Deletion is best-effort, runs regardless of how the owning scope exits,
/// and issues one bulk delete over all tracked paths in creation order.
#[derive(Debug)]
pub struct TrackedObjects {
    cli: StorageCli,
    paths: Vec<String>,
}

impl TrackedObjects {
    /// Tracker deleting through the given facade.
    pub fn new(cli: StorageCli) -> Self {
        Self {
            cli,
            paths: Vec::new(),
        }
    }

    /// Record a created object for scoped deletion.
    pub fn track(&mut self, gs_path: impl Into<String>) {
        self.paths.push(gs_path.into());
    }

    /// Paths currently tracked, in creation order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    fn cleanup(&mut self) {
        if self.paths.is_empty() {
            return;
        }
        // One batch invocation; the CLI keeps deleting past individual
        // failures, so a missing object does not strand the rest.
        let paths: Vec<String> = self.paths.drain(..).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        match self.cli.delete_objects(&refs) {
            Ok(outcome) if outcome.success() => {}
            Ok(outcome) => {
                warn!(paths = ?paths, stderr = outcome.stderr(), "cleanup delete failed");
            }
            Err(err) => warn!(paths = ?paths, error = %err, "cleanup delete failed"),
        }
    }
}

impl Drop for TrackedObjects {
    fn drop(&mut self) {
        self.cleanup();
    }
}
