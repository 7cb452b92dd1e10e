//! Signed-URL validation verdicts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Structured verdict of one signed-URL validation call.
///
/// `status` is the HTTP status observed for the target URL: 0 when no
/// response was ever observed, -1 when validation itself failed (navigation
/// error unrelated to a download start), in which case `page_content`
/// carries the error message instead of a page snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedUrlVerdict {
    /// The URL that was validated.
    pub url: String,
    /// Observed HTTP status, or a 0/-1 sentinel.
    pub status: i64,
    /// True iff any phishing/warning indicator matched.
    pub phishing_detected: bool,
    /// Page title at inspection time; empty when a download preempted rendering.
    pub page_title: String,
    /// Page content snapshot, or the validation error message.
    pub page_content: String,
    /// Screenshot captured on anomaly, if any.
    pub screenshot: Option<PathBuf>,
}

impl SignedUrlVerdict {
    /// The URL is both functional and trustworthy.
    pub fn is_success(&self) -> bool {
        self.status == 200 && !self.phishing_detected
    }

    /// Verdict for a validation call that itself failed.
    pub(crate) fn from_error(url: &str, message: &str) -> Self {
        Self {
            url: url.to_string(),
            status: -1,
            phishing_detected: false,
            page_title: String::new(),
            page_content: format!("validation error: {message}"),
            screenshot: None,
        }
    }
}
