//! Command execution outcomes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable record of one completed external-process invocation.
///
/// Constructed once by the process runner, inspected by callers, discarded.
/// `success()` (exit code zero) is the sole success signal used by every
/// consumer of the harness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandResult {
    /// The full command line as passed to the shell.
    pub command: String,
    /// Child process exit code.
    pub exit_code: i32,
    /// Captured standard output, trimmed.
    pub stdout: String,
    /// Captured standard error, trimmed.
    pub stderr: String,
    /// Wall-clock execution time in milliseconds.
    pub elapsed_ms: u64,
}

impl CommandResult {
    /// True iff the process exited with code zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Both output streams joined for diagnostics.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Tagged outcome of one execution attempt.
///
/// `Completed` carries the child's real exit state, including non-zero exits:
/// those are expected-failure data for tests to assert on, never errors.
/// `Failed` marks a true execution-setup failure (the shell could not be
/// spawned, an output stream could not be read) where no exit code exists.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ExecOutcome {
    /// The child ran to completion (successfully or not).
    Completed(CommandResult),
    /// The child never produced an exit status.
    Failed {
        command: String,
        reason: String,
        elapsed_ms: u64,
    },
}

impl ExecOutcome {
    /// True iff the child completed with exit code zero.
    pub fn success(&self) -> bool {
        match self {
            Self::Completed(result) => result.success(),
            Self::Failed { .. } => false,
        }
    }

    /// Exit code of the child; -1 when execution itself failed.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(result) => result.exit_code,
            Self::Failed { .. } => -1,
        }
    }

    /// Captured stdout; empty when execution itself failed.
    pub fn stdout(&self) -> &str {
        match self {
            Self::Completed(result) => &result.stdout,
            Self::Failed { .. } => "",
        }
    }

    /// Captured stderr, or the setup-failure reason.
    pub fn stderr(&self) -> &str {
        match self {
            Self::Completed(result) => &result.stderr,
            Self::Failed { reason, .. } => reason,
        }
    }

    /// The command line this outcome belongs to.
    pub fn command(&self) -> &str {
        match self {
            Self::Completed(result) => &result.command,
            Self::Failed { command, .. } => command,
        }
    }

    /// Wall-clock time spent on the attempt in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        match self {
            Self::Completed(result) => result.elapsed_ms,
            Self::Failed { elapsed_ms, .. } => *elapsed_ms,
        }
    }

    /// Diagnostic view over both streams.
    pub fn combined_output(&self) -> String {
        match self {
            Self::Completed(result) => result.combined_output(),
            Self::Failed { reason, .. } => reason.clone(),
        }
    }
}

/// Fixed-backoff retry policy for flaky CLI operations.
///
/// Consumed by [`crate::exec::run_with_retry`]; not re-implemented per call
/// site.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Fixed sleep between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}
