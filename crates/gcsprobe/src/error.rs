//! Harness error taxonomy.
//!
//! Failures that are part of the normal CLI-failure space (non-zero exit)
//! are returned as data through [`crate::model::ExecOutcome`], never as
//! errors. `HarnessError` covers the cases where the harness itself cannot
//! proceed reliably: subprocess timeouts, unparseable CLI output, missing
//! configuration, and browser-engine setup failures.

use miette::Diagnostic;
use std::fmt;

pub type HarnessResult<T> = Result<T, HarnessError>;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The child process did not exit within the configured timeout and was
    /// forcibly killed. The one execution failure that is thrown rather than
    /// reported as an outcome.
    #[error("command timed out after {timeout_secs}s: {command}")]
    Timeout { command: String, timeout_secs: u64 },

    /// A listing command failed for a reason other than "nothing matched".
    #[error("failed to list objects: {stderr}")]
    ListFailed { stderr: String },

    /// The sign-url subcommand exited non-zero.
    #[error("failed to generate signed URL: {stderr}")]
    SignFailed { stderr: String },

    /// The sign-url subcommand succeeded but no line of its output matched
    /// any known URL shape. The wrapped tool's output format is not a stable
    /// contract, so this carries the raw offending output.
    #[error("could not parse signed URL from output: {output}")]
    UnparseableSignOutput { output: String },

    /// An upload or download through the copy subcommand failed.
    #[error("transfer failed: {stderr}")]
    TransferFailed { stderr: String },

    /// A required configuration value was absent at load time.
    #[error("missing required configuration: {key}")]
    MissingConfig { key: String },

    /// The browser engine could not be launched or driven.
    #[error("browser error: {message}")]
    Browser { message: String },

    /// Local filesystem failure while staging uploads or downloads.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Wrap any displayable browser-engine failure.
    pub fn browser(err: impl fmt::Display) -> Self {
        Self::Browser {
            message: err.to_string(),
        }
    }
}

impl Diagnostic for HarnessError {}
