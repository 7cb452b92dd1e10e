pub mod command;
pub mod verdict;

pub use command::{CommandResult, ExecOutcome, RetryPolicy};
pub use verdict::SignedUrlVerdict;
