// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

//! Deception-indicator and verdict unit tests

use gcsprobe::browser::{find_deception_indicator, is_download_interrupt, PHISHING_INDICATORS};
use gcsprobe::model::SignedUrlVerdict;

#[test]
fn clean_page_has_no_indicator() {
    assert!(find_deception_indicator("My Report", "quarterly numbers").is_none());
    assert!(find_deception_indicator("", "").is_none());
}

#[test]
fn scan_input_is_rendered_text_not_markup() {
    // The validator feeds this function the page's rendered text. A page
    // whose markup merely links to safety docs renders as "Safety docs";
    // the href never reaches the scan and must not flip the verdict.
    let rendered = "Safety docs";
    assert!(find_deception_indicator("Safety docs", rendered).is_none());
    // The same page scanned as raw source would false-positive, which is
    // exactly why the raw source is not what gets scanned.
    let source = "<a href='/docs/anti-phishing-guide.html'>Safety docs</a>";
    assert!(find_deception_indicator("Safety docs", source).is_some());
}

#[test]
fn title_indicator_is_detected_case_insensitively() {
    let found = find_deception_indicator("DECEPTIVE SITE AHEAD", "").unwrap();
    assert!(found.contains("title"), "unexpected match: {found}");
}

#[test]
fn body_indicator_is_detected() {
    let found =
        find_deception_indicator("Untitled", "your connection is not private").unwrap();
    assert!(found.contains("text"), "unexpected match: {found}");
}

#[test]
fn title_match_wins_over_body_match() {
    let found = find_deception_indicator("Phishing alert", "dangerous site contents").unwrap();
    assert!(found.contains("title"), "unexpected match: {found}");
}

#[test]
fn catalogue_is_nonempty_and_detected() {
    for indicator in PHISHING_INDICATORS {
        assert!(find_deception_indicator("", &indicator.to_lowercase()).is_some());
    }
}

#[test]
fn download_interrupt_signatures() {
    assert!(is_download_interrupt("Navigate failed: net::ERR_ABORTED"));
    assert!(is_download_interrupt("Download is starting"));
    assert!(!is_download_interrupt("net::ERR_NAME_NOT_RESOLVED"));
    assert!(!is_download_interrupt(""));
}

#[test]
fn verdict_success_requires_ok_status_and_no_phishing() {
    let mut verdict = SignedUrlVerdict {
        url: "https://example.com/object".to_string(),
        status: 200,
        phishing_detected: false,
        page_title: String::new(),
        page_content: String::new(),
        screenshot: None,
    };
    assert!(verdict.is_success());

    verdict.phishing_detected = true;
    assert!(!verdict.is_success());

    verdict.phishing_detected = false;
    verdict.status = 403;
    assert!(!verdict.is_success());

    // 302 avoids a screenshot but is still not a success.
    verdict.status = 302;
    assert!(!verdict.is_success());
}

#[test]
fn verdict_serializes_round_trip() {
    let verdict = SignedUrlVerdict {
        url: "https://example.com/o".to_string(),
        status: -1,
        phishing_detected: false,
        page_title: String::new(),
        page_content: "validation error: boom".to_string(),
        screenshot: None,
    };
    let json = serde_json::to_string(&verdict).unwrap();
    let back: SignedUrlVerdict = serde_json::from_str(&json).unwrap();
    assert_eq!(back.status, -1);
    assert!(back.page_content.contains("boom"));
}
