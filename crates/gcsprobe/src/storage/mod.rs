//! Facade over the `gcloud storage` command-line surface.
//!
//! Maps domain operations (copy, list, delete, sign) onto concrete command
//! lines and parses each command's textual stdout into typed outcomes. The
//! wrapped tool has no stable structured-output contract for listing or
//! signing, so all string matching lives here, behind pure functions with
//! their own test coverage, and falls back to one well-defined parse error
//! when no known shape matches.

use crate::error::{HarnessError, HarnessResult};
use crate::exec::ShellRunner;
use crate::model::{ExecOutcome, RetryPolicy};
use serde_json::Value;
use std::borrow::Cow;
use tracing::debug;

/// URI scheme prefix of every object path.
pub const GS_SCHEME: &str = "gs://";

/// stderr phrases the CLI emits when a listing matched nothing. An empty
/// prefix is not an error.
const NO_MATCH_PHRASES: &[&str] = &[
    "No URLs matched",
    "One or more URLs matched no objects",
    "matched no objects",
];

/// Typed facade over the external CLI.
#[derive(Clone, Debug, Default)]
pub struct StorageCli {
    runner: ShellRunner,
}

impl StorageCli {
    /// Facade over a default runner (30s timeout).
    pub fn new() -> Self {
        Self::with_runner(ShellRunner::new())
    }

    /// Facade over an explicit runner.
    pub fn with_runner(runner: ShellRunner) -> Self {
        Self { runner }
    }

    /// Copy one object or file between local and remote locations.
    ///
    /// Local paths containing whitespace are defensively quoted before being
    /// embedded in the shell command text; remote-to-remote copies are
    /// passed through untouched.
    pub fn copy(&self, source: &str, destination: &str) -> HarnessResult<ExecOutcome> {
        let quoted_source = quote_local_path(source, destination);
        let quoted_destination = quote_local_path(destination, source);
        self.runner.execute(&format!(
            "gcloud storage cp {quoted_source} {quoted_destination}"
        ))
    }

    /// Copy recursively (directory or prefix trees).
    pub fn copy_recursive(&self, source: &str, destination: &str) -> HarnessResult<ExecOutcome> {
        let quoted_source = quote_local_path(source, destination);
        let quoted_destination = quote_local_path(destination, source);
        self.runner.execute(&format!(
            "gcloud storage cp -r {quoted_source} {quoted_destination}"
        ))
    }

    /// List object paths under a path or prefix, preserving CLI output order.
    ///
    /// A non-zero exit whose stderr carries a known "nothing matched" phrase
    /// is an empty listing, not an error.
    pub fn list_objects(&self, path: &str, recursive: bool) -> HarnessResult<Vec<String>> {
        let command = if recursive {
            format!("gcloud storage ls -r {path}")
        } else {
            format!("gcloud storage ls {path}")
        };
        let outcome = self.runner.execute(&command)?;
        if !outcome.success() {
            if stderr_reports_no_match(outcome.stderr()) {
                debug!(path, "listing matched nothing");
                return Ok(Vec::new());
            }
            return Err(HarnessError::ListFailed {
                stderr: outcome.stderr().to_string(),
            });
        }
        Ok(parse_listing(outcome.stdout()))
    }

    /// Delete one object. Failure (e.g. not found) is data, not an error.
    pub fn delete_object(&self, path: &str) -> HarnessResult<ExecOutcome> {
        self.runner.execute(&format!("gcloud storage rm {path}"))
    }

    /// Delete several objects in one invocation. Partial success is visible
    /// only through the aggregate exit code and stderr.
    pub fn delete_objects(&self, paths: &[&str]) -> HarnessResult<ExecOutcome> {
        self.runner
            .execute(&format!("gcloud storage rm {}", paths.join(" ")))
    }

    /// Delete a prefix tree recursively.
    pub fn delete_recursive(&self, path: &str) -> HarnessResult<ExecOutcome> {
        self.runner.execute(&format!("gcloud storage rm -r {path}"))
    }

    /// Generate a time-limited pre-signed download URL for an object.
    pub fn generate_signed_url(&self, path: &str, duration_minutes: u32) -> HarnessResult<String> {
        let outcome = self.runner.execute(&format!(
            "gcloud storage sign-url {path} --duration={duration_minutes}m"
        ))?;
        if !outcome.success() {
            return Err(HarnessError::SignFailed {
                stderr: outcome.stderr().to_string(),
            });
        }
        parse_signed_url(outcome.stdout()).ok_or_else(|| HarnessError::UnparseableSignOutput {
            output: outcome.stdout().to_string(),
        })
    }

    /// Structured metadata probe for one object.
    pub fn describe_object(&self, path: &str) -> HarnessResult<ExecOutcome> {
        self.runner
            .execute(&format!("gcloud storage objects describe {path} --format=json"))
    }

    /// True iff listing the exact path yields that path.
    pub fn object_exists(&self, path: &str) -> bool {
        match self.list_objects(path, false) {
            Ok(paths) => paths.iter().any(|p| p == path),
            Err(_) => false,
        }
    }

    /// True iff the external CLI answers a trivial version query.
    pub fn is_available(&self) -> bool {
        self.runner
            .execute("gcloud --version")
            .map(|outcome| outcome.success())
            .unwrap_or(false)
    }

    /// True iff at least one authenticated account is listed.
    ///
    /// Any parse error is treated as "not authenticated" (fails closed).
    pub fn is_authenticated(&self) -> bool {
        let Ok(outcome) = self.runner.execute("gcloud auth list --format=json") else {
            return false;
        };
        if !outcome.success() {
            return false;
        }
        match serde_json::from_str::<Value>(outcome.stdout()) {
            Ok(Value::Array(accounts)) => !accounts.is_empty(),
            _ => false,
        }
    }

    /// Execute an arbitrary command line with the retry combinator.
    pub fn execute_with_retry(
        &self,
        command: &str,
        policy: RetryPolicy,
    ) -> HarnessResult<ExecOutcome> {
        self.runner.execute_with_retry(command, policy)
    }

    /// The underlying runner.
    pub fn runner(&self) -> &ShellRunner {
        &self.runner
    }
}

/// Parse `ls` stdout into object paths.
///
/// Keeps lines beginning with the `gs://` scheme; drops directory-marker
/// header lines (ending with `:`) emitted by the recursive listing format.
/// Order is preserved and duplicates are not removed.
pub fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with(GS_SCHEME) && !line.ends_with(':'))
        .map(ToString::to_string)
        .collect()
}

/// True iff the stderr text is one of the known "nothing matched" shapes.
pub fn stderr_reports_no_match(stderr: &str) -> bool {
    NO_MATCH_PHRASES.iter().any(|phrase| stderr.contains(phrase))
}

/// Extract the signed URL from `sign-url` stdout.
///
/// Scans line by line for a `signed_url:` prefix, a `url:` prefix, or a bare
/// line beginning with `http://`/`https://`; the first match wins.
pub fn parse_signed_url(stdout: &str) -> Option<String> {
    for line in stdout.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("signed_url:") {
            return Some(rest.trim().to_string());
        }
        if let Some(rest) = line.strip_prefix("url:") {
            return Some(rest.trim().to_string());
        }
        if line.starts_with("http://") || line.starts_with("https://") {
            return Some(line.to_string());
        }
    }
    None
}

/// Quote a local path containing whitespace when its counterpart is remote.
/// The runner passes the whole line through a shell, so an unquoted space
/// would split the path.
fn quote_local_path<'a>(path: &'a str, counterpart: &str) -> Cow<'a, str> {
    if !path.starts_with(GS_SCHEME) && counterpart.starts_with(GS_SCHEME) && path.contains(' ') {
        Cow::Owned(format!("\"{path}\""))
    } else {
        Cow::Borrowed(path)
    }
}
