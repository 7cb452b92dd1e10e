//! Shell-mediated process execution.
//!
//! [`ShellRunner`] launches one external command line through an interactive
//! shell, captures both output streams to completion, and enforces a
//! timeout with forced termination. Command failure is never an error: a
//! non-zero exit comes back as data inside [`ExecOutcome`] so that tests can
//! assert on expected failures. Only the timeout is fatal.

use crate::error::{HarnessError, HarnessResult};
use crate::model::{CommandResult, ExecOutcome, RetryPolicy};
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Extra directories appended to the child's PATH so the external CLI is
/// found even when the test runner's own PATH is minimal (as happens under a
/// build-tool-launched test process).
const CLI_PATH_SUFFIXES: &[&str] = &["/usr/local/bin", "/opt/homebrew/bin", "/usr/bin", "/bin"];

/// Runs external command lines through a shell.
#[derive(Clone, Debug)]
pub struct ShellRunner {
    shell: PathBuf,
    child_path: String,
    timeout: Duration,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellRunner {
    /// Runner with the default 30s timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Runner with an explicit timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            shell: resolve_shell(),
            child_path: extended_path(),
            timeout,
        }
    }

    /// Execute one command line to completion.
    ///
    /// # Errors
    /// Only [`HarnessError::Timeout`] is returned as an error; every other
    /// failure mode is encoded in the returned [`ExecOutcome`].
    pub fn execute(&self, command: &str) -> HarnessResult<ExecOutcome> {
        info!(command, "executing command");
        let started = Instant::now();

        let mut child = match self.spawn(command) {
            Ok(child) => child,
            Err(err) => {
                warn!(command, error = %err, "failed to start shell");
                return Ok(ExecOutcome::Failed {
                    command: command.to_string(),
                    reason: err.to_string(),
                    elapsed_ms: elapsed_ms(&started),
                });
            }
        };

        // Both streams are drained on their own threads: no interleaving
        // assumptions, and a child that fills one pipe cannot deadlock us.
        let stdout_reader = child.stdout.take().map(spawn_stream_reader::<ChildStdout>);
        let stderr_reader = child.stderr.take().map(spawn_stream_reader::<ChildStderr>);

        let status = match self.wait_with_timeout(&mut child, command, &started)? {
            Some(status) => status,
            None => {
                // Unreachable in practice; wait_with_timeout errors on expiry.
                return Ok(ExecOutcome::Failed {
                    command: command.to_string(),
                    reason: "process produced no exit status".to_string(),
                    elapsed_ms: elapsed_ms(&started),
                });
            }
        };

        let stdout = collect_stream(stdout_reader);
        let stderr = collect_stream(stderr_reader);
        let elapsed = elapsed_ms(&started);
        let (Ok(stdout), Ok(stderr)) = (stdout, stderr) else {
            warn!(command, "failed to read child output streams");
            return Ok(ExecOutcome::Failed {
                command: command.to_string(),
                reason: "failed to read child output streams".to_string(),
                elapsed_ms: elapsed,
            });
        };

        let result = CommandResult {
            command: command.to_string(),
            exit_code: status.code().unwrap_or(-1),
            stdout: stdout.trim().to_string(),
            stderr: stderr.trim().to_string(),
            elapsed_ms: elapsed,
        };

        if result.success() {
            info!(command, elapsed_ms = result.elapsed_ms, "command succeeded");
        } else {
            warn!(
                command,
                exit_code = result.exit_code,
                stderr = %result.stderr,
                "command failed"
            );
        }
        Ok(ExecOutcome::Completed(result))
    }

    /// Execute with the retry combinator; see [`run_with_retry`].
    pub fn execute_with_retry(
        &self,
        command: &str,
        policy: RetryPolicy,
    ) -> HarnessResult<ExecOutcome> {
        run_with_retry(policy, |_attempt| self.execute(command))
    }

    /// The shell this runner resolved at construction.
    pub fn shell(&self) -> &PathBuf {
        &self.shell
    }

    fn spawn(&self, command: &str) -> std::io::Result<Child> {
        Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .env("PATH", &self.child_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
    }

    fn wait_with_timeout(
        &self,
        child: &mut Child,
        command: &str,
        started: &Instant,
    ) -> HarnessResult<Option<std::process::ExitStatus>> {
        let deadline = *started + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(Some(status)),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        warn!(command, timeout_secs = self.timeout.as_secs(), "command timed out");
                        return Err(HarnessError::Timeout {
                            command: command.to_string(),
                            timeout_secs: self.timeout.as_secs(),
                        });
                    }
                    thread::sleep(EXIT_POLL_INTERVAL);
                }
                Err(err) => {
                    // Treated like a stream failure by the caller.
                    warn!(command, error = %err, "failed to wait for child");
                    return Ok(None);
                }
            }
        }
    }
}

/// Retry combinator over any fallible command-shaped operation.
///
/// Invokes `op` up to `policy.max_attempts` times (1-based attempt index),
/// returning on the first successful outcome and sleeping `policy.delay`
/// between attempts. The last failing outcome is returned when all attempts
/// are exhausted. A hard error from `op` (e.g. a timeout) stops retrying
/// immediately.
pub fn run_with_retry<F>(policy: RetryPolicy, mut op: F) -> HarnessResult<ExecOutcome>
where
    F: FnMut(u32) -> HarnessResult<ExecOutcome>,
{
    let attempts = policy.max_attempts.max(1);
    let mut outcome = op(1)?;
    for attempt in 2..=attempts {
        if outcome.success() {
            return Ok(outcome);
        }
        warn!(
            attempt = attempt - 1,
            max_attempts = attempts,
            "attempt failed, retrying"
        );
        thread::sleep(policy.delay);
        outcome = op(attempt)?;
    }
    Ok(outcome)
}

/// Resolve an interactive shell: prefer `$SHELL`, fall back to `/bin/bash`,
/// then `/bin/sh` when that path does not exist.
fn resolve_shell() -> PathBuf {
    let preferred = env::var("SHELL")
        .ok()
        .filter(|value| !value.is_empty())
        .map_or_else(|| PathBuf::from("/bin/bash"), PathBuf::from);
    if preferred.exists() {
        preferred
    } else {
        PathBuf::from("/bin/sh")
    }
}

/// Inherited PATH plus the known installation locations of the external CLI.
fn extended_path() -> String {
    let current = env::var("PATH").unwrap_or_default();
    let mut path = current;
    if let Some(home) = dirs::home_dir() {
        path.push(':');
        path.push_str(&home.join("google-cloud-sdk/bin").to_string_lossy());
    }
    for suffix in CLI_PATH_SUFFIXES {
        path.push(':');
        path.push_str(suffix);
    }
    path
}

fn spawn_stream_reader<R>(mut stream: R) -> JoinHandle<std::io::Result<String>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = String::new();
        stream.read_to_string(&mut buffer)?;
        Ok(buffer)
    })
}

fn collect_stream(reader: Option<JoinHandle<std::io::Result<String>>>) -> std::io::Result<String> {
    match reader {
        Some(handle) => match handle.join() {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::other("stream reader thread panicked")),
        },
        None => Ok(String::new()),
    }
}

fn elapsed_ms(started: &Instant) -> u64 {
    // Elapsed time is always well under u64::MAX
    #[allow(clippy::cast_possible_truncation)]
    let value = started.elapsed().as_millis() as u64;
    value
}
