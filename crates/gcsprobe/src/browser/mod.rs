//! Browser-driven signed-URL trust validation.
//!
//! A signed URL that "works" is not necessarily safe to hand to a user: the
//! response may carry an interstitial warning page instead of the object
//! bytes. [`SignedUrlValidator`] drives a real headless browser at the URL,
//! captures the HTTP status through a response observer, and inspects the
//! rendered page for deception indicators. Every failure mode folds into the
//! returned [`SignedUrlVerdict`]; validation itself never errors.
//!
//! One browser process is shared across all validations through
//! [`BrowserHandle`]; each call gets its own incognito context and tab.

use crate::error::{HarnessError, HarnessResult};
use crate::model::SignedUrlVerdict;
use headless_chrome::browser::context::Context;
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Phrases that mark a warning interstitial rather than real object content.
/// Compared case-insensitively against the page title and body.
pub const PHISHING_INDICATORS: &[&str] = &[
    "Deceptive site ahead",
    "Dangerous site",
    "Phishing",
    "This site ahead contains harmful programs",
    "Attack site ahead",
    "Suspicious site",
    "Your connection is not private",
    "Security Warning",
];

/// Selectors of known warning-banner elements.
const WARNING_SELECTORS: &[&str] = &[
    "#warning",
    ".warning-message",
    "[class*='phishing']",
    "[class*='warning']",
    "[class*='dangerous']",
];

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause after a download-start abort so the response observer can fire.
const SETTLE_PAUSE: Duration = Duration::from_secs(1);
const STATUS_POLL_WINDOW: Duration = Duration::from_secs(2);
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DOWNLOAD_WAIT: Duration = Duration::from_secs(30);
const DOWNLOAD_POLL_INTERVAL: Duration = Duration::from_millis(250);

static SHARED_BROWSER: Mutex<Option<Browser>> = Mutex::new(None);

/// Handle to the process-wide shared browser.
///
/// The browser is launched lazily on the first [`shared`](Self::shared) call
/// and reused by every subsequent one; [`shutdown`](Self::shutdown) tears it
/// down explicitly (e.g. at the end of a test suite). The handle itself is a
/// cheap clone of the underlying connection.
pub struct BrowserHandle {
    browser: Browser,
}

impl BrowserHandle {
    /// Obtain the shared browser, launching it if needed.
    pub fn shared() -> HarnessResult<Self> {
        let mut slot = SHARED_BROWSER
            .lock()
            .map_err(|_| HarnessError::browser("shared browser lock poisoned"))?;
        if slot.is_none() {
            info!("launching shared headless browser");
            *slot = Some(launch()?);
        }
        match slot.as_ref() {
            Some(browser) => Ok(Self {
                browser: browser.clone(),
            }),
            None => Err(HarnessError::browser("shared browser slot empty")),
        }
    }

    /// Tear down the shared browser. Later [`shared`](Self::shared) calls
    /// launch a fresh one.
    pub fn shutdown() {
        if let Ok(mut slot) = SHARED_BROWSER.lock() {
            if slot.take().is_some() {
                info!("shared browser shut down");
            }
        }
    }

    /// Fresh incognito browsing context; no cookies or cache shared with any
    /// other context.
    fn new_context(&self) -> HarnessResult<Context<'_>> {
        self.browser.new_context().map_err(HarnessError::browser)
    }
}

fn launch() -> HarnessResult<Browser> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .window_size(Some((1920, 1080)))
        .idle_browser_timeout(Duration::from_secs(120))
        .build()
        .map_err(HarnessError::browser)?;
    Browser::new(options).map_err(HarnessError::browser)
}

/// Validates signed URLs by driving the shared browser at them.
#[derive(Clone, Debug)]
pub struct SignedUrlValidator {
    screenshot_dir: PathBuf,
}

impl Default for SignedUrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SignedUrlValidator {
    /// Validator writing anomaly screenshots under `target/screenshots`.
    pub fn new() -> Self {
        Self {
            screenshot_dir: PathBuf::from("target/screenshots"),
        }
    }

    /// Validator with an explicit screenshot directory.
    pub fn with_screenshot_dir(screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshot_dir: screenshot_dir.into(),
        }
    }

    /// Validate one signed URL.
    ///
    /// Never fails: navigation and inspection errors come back as a verdict
    /// with status -1 and the error message in the content field.
    pub fn validate(&self, url: &str) -> SignedUrlVerdict {
        info!(url, "validating signed url");
        match self.try_validate(url) {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(url, error = %err, "signed url validation failed");
                SignedUrlVerdict::from_error(url, &err.to_string())
            }
        }
    }

    fn try_validate(&self, url: &str) -> HarnessResult<SignedUrlVerdict> {
        let handle = BrowserHandle::shared()?;
        let context = handle.new_context()?;
        let tab = context.new_tab().map_err(HarnessError::browser)?;
        tab.set_default_timeout(NAVIGATION_TIMEOUT);

        // The tab is closed on every exit path, success or not.
        let verdict = self.inspect(&tab, url);
        if tab.close(true).is_err() {
            warn!(url, "failed to close validation tab");
        }
        verdict
    }

    fn inspect(&self, tab: &Arc<Tab>, url: &str) -> HarnessResult<SignedUrlVerdict> {
        let observed = Arc::new(AtomicI64::new(0));
        arm_status_observer(tab, url, &observed)?;

        let mut download_started = false;
        if let Err(err) = tab.navigate_to(url).and_then(|t| t.wait_until_navigated()) {
            let message = err.to_string();
            if is_download_interrupt(&message) {
                // Navigation aborts when the response is a download; the
                // observer may still be in flight.
                info!(url, "navigation aborted by download start");
                download_started = true;
                thread::sleep(SETTLE_PAUSE);
            } else {
                return Err(HarnessError::browser(message));
            }
        }

        let mut status = observed.load(Ordering::SeqCst);
        if download_started && status == 0 {
            status = wait_for_download_status(&observed);
        }
        info!(url, status, "resolved http status");

        let mut page_title = String::new();
        let mut page_content = String::new();
        let mut indicator = None;
        if !download_started {
            page_title = tab.get_title().unwrap_or_default();
            page_content = tab.get_content().unwrap_or_default();
            // The containment scan runs on rendered text only; markup that
            // merely mentions an indicator (an href, a script, a hidden
            // element) must not flip the verdict.
            let body_text = visible_body_text(tab);
            indicator = detect_deception(tab, &page_title, &body_text);
        }
        let phishing_detected = indicator.is_some();
        if let Some(found) = &indicator {
            warn!(url, indicator = %found, "deception indicator detected");
        }

        let mut screenshot = None;
        if phishing_detected || (status != 200 && status != 302) {
            screenshot = self.capture_screenshot(tab);
        }

        Ok(SignedUrlVerdict {
            url: url.to_string(),
            status,
            phishing_detected,
            page_title,
            page_content,
            screenshot,
        })
    }

    fn capture_screenshot(&self, tab: &Arc<Tab>) -> Option<PathBuf> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let path = self.screenshot_dir.join(format!("validation-{millis}.png"));
        let captured = fs::create_dir_all(&self.screenshot_dir)
            .map_err(HarnessError::from)
            .and_then(|()| {
                tab.capture_screenshot(
                    Page::CaptureScreenshotFormatOption::Png,
                    None,
                    None,
                    true,
                )
                .map_err(HarnessError::browser)
            })
            .and_then(|bytes| fs::write(&path, bytes).map_err(HarnessError::from));
        match captured {
            Ok(()) => {
                info!(path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(err) => {
                warn!(error = %err, "failed to capture screenshot");
                None
            }
        }
    }

    /// Download the object behind a signed URL to `destination`.
    ///
    /// Returns false on any failure; the download path is best-effort by
    /// contract, callers assert on the destination file instead.
    pub fn download_via_url(&self, url: &str, destination: &Path) -> bool {
        match try_download(url, destination) {
            Ok(()) => {
                info!(url, destination = %destination.display(), "file downloaded");
                true
            }
            Err(err) => {
                warn!(url, error = %err, "download via signed url failed");
                false
            }
        }
    }
}

fn arm_status_observer(tab: &Arc<Tab>, url: &str, observed: &Arc<AtomicI64>) -> HarnessResult<()> {
    let target = url.to_string();
    let slot = Arc::clone(observed);
    tab.register_response_handling(
        "signed-url-status",
        Box::new(move |params, _fetch_body| {
            if params.response.url == target {
                slot.store(i64::from(params.response.status), Ordering::SeqCst);
            }
        }),
    )
    .map_err(HarnessError::browser)?;
    Ok(())
}

/// Bounded wait for a late response event after a download start; a download
/// would not begin on an error response, so 200 is assumed when nothing
/// arrives.
fn wait_for_download_status(observed: &Arc<AtomicI64>) -> i64 {
    let deadline = Instant::now() + STATUS_POLL_WINDOW;
    while Instant::now() < deadline {
        let status = observed.load(Ordering::SeqCst);
        if status != 0 {
            return status;
        }
        thread::sleep(STATUS_POLL_INTERVAL);
    }
    info!("download started with no observed response, assuming 200");
    200
}

/// First deception indicator found, checking the title, then the visible
/// body text, then known warning elements, then a meta-refresh tag
/// mentioning phishing.
fn detect_deception(tab: &Arc<Tab>, title: &str, body_text: &str) -> Option<String> {
    if let Some(indicator) = find_deception_indicator(title, body_text) {
        return Some(indicator);
    }
    for selector in WARNING_SELECTORS {
        if warning_element_visible(tab, selector) {
            return Some(format!("warning element matching {selector}"));
        }
    }
    if let Ok(meta) = tab.find_element("meta[http-equiv='refresh']") {
        if let Ok(Some(value)) = meta.get_attribute_value("content") {
            if value.to_lowercase().contains("phishing") {
                return Some("meta refresh mentioning phishing".to_string());
            }
        }
    }
    None
}

/// Rendered body text of the page, as a user would see it. Raw page source
/// is deliberately not used here: attribute values, scripts, and hidden
/// nodes are not part of what the page shows.
fn visible_body_text(tab: &Arc<Tab>) -> String {
    match tab.evaluate("document.body ? document.body.innerText : ''", false) {
        Ok(object) => object
            .value
            .and_then(|value| value.as_str().map(ToString::to_string))
            .unwrap_or_default(),
        Err(err) => {
            warn!(error = %err, "failed to read visible body text");
            String::new()
        }
    }
}

/// True iff an element matches the selector and is actually rendered.
/// Presence alone is not enough: an unrelated style hook on a hidden node
/// is not a warning banner.
fn warning_element_visible(tab: &Arc<Tab>, selector: &str) -> bool {
    let expression = format!(
        "(() => {{ const el = document.querySelector({selector:?}); if (!el) return false; \
         const style = window.getComputedStyle(el); \
         return style.display !== 'none' && style.visibility !== 'hidden' \
         && el.getClientRects().length > 0; }})()"
    );
    match tab.evaluate(&expression, false) {
        Ok(object) => object.value.and_then(|value| value.as_bool()).unwrap_or(false),
        Err(err) => {
            warn!(selector, error = %err, "failed to check warning element visibility");
            false
        }
    }
}

/// Scan title and visible body text for catalogue phrases, title first.
pub fn find_deception_indicator(title: &str, body_text: &str) -> Option<String> {
    let title = title.to_lowercase();
    let body_text = body_text.to_lowercase();
    for indicator in PHISHING_INDICATORS {
        if title.contains(&indicator.to_lowercase()) {
            return Some(format!("title contains \"{indicator}\""));
        }
    }
    for indicator in PHISHING_INDICATORS {
        if body_text.contains(&indicator.to_lowercase()) {
            return Some(format!("page text contains \"{indicator}\""));
        }
    }
    None
}

/// True iff a navigation error message is the download-start abort rather
/// than a real failure.
pub fn is_download_interrupt(message: &str) -> bool {
    message.contains("ERR_ABORTED") || message.contains("Download is starting")
}

fn try_download(url: &str, destination: &Path) -> HarnessResult<()> {
    let handle = BrowserHandle::shared()?;
    let context = handle.new_context()?;
    let tab = context.new_tab().map_err(HarnessError::browser)?;
    tab.set_default_timeout(NAVIGATION_TIMEOUT);

    let result = download_into(&tab, url, destination);
    if tab.close(true).is_err() {
        warn!(url, "failed to close download tab");
    }
    result
}

fn download_into(tab: &Arc<Tab>, url: &str, destination: &Path) -> HarnessResult<()> {
    let scratch = tempfile::tempdir()?;
    tab.call_method(Page::SetDownloadBehavior {
        behavior: Page::SetDownloadBehaviorBehaviorOption::Allow,
        download_path: Some(scratch.path().to_string_lossy().into_owned()),
    })
    .map_err(HarnessError::browser)?;

    // The navigation itself aborts once the download takes over.
    if let Err(err) = tab.navigate_to(url).and_then(|t| t.wait_until_navigated()) {
        let message = err.to_string();
        if !is_download_interrupt(&message) {
            return Err(HarnessError::browser(message));
        }
    }

    let downloaded = wait_for_download(scratch.path())?;
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::copy(&downloaded, destination)?;
    Ok(())
}

/// Poll the scratch directory until the browser finishes writing the file.
/// In-progress downloads carry a `.crdownload` suffix.
fn wait_for_download(dir: &Path) -> HarnessResult<PathBuf> {
    let deadline = Instant::now() + DOWNLOAD_WAIT;
    while Instant::now() < deadline {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let partial = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("crdownload"));
            if path.is_file() && !partial {
                return Ok(path);
            }
        }
        thread::sleep(DOWNLOAD_POLL_INTERVAL);
    }
    Err(HarnessError::browser("download did not complete in time"))
}
