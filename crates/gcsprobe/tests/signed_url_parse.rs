// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

//! Signed-URL output parser unit tests

use gcsprobe::storage::parse_signed_url;

#[test]
fn parses_signed_url_field() {
    let stdout = "---\nexpiration: '2025-01-01 00:00:00'\nsigned_url: https://storage.googleapis.com/bucket/key?X-Goog-Signature=abc\n";
    assert_eq!(
        parse_signed_url(stdout).unwrap(),
        "https://storage.googleapis.com/bucket/key?X-Goog-Signature=abc"
    );
}

#[test]
fn parses_url_field() {
    let stdout = "url: https://storage.googleapis.com/bucket/key?sig=1\n";
    assert_eq!(
        parse_signed_url(stdout).unwrap(),
        "https://storage.googleapis.com/bucket/key?sig=1"
    );
}

#[test]
fn parses_bare_url_line() {
    let stdout = "https://storage.googleapis.com/bucket/key?sig=2";
    assert_eq!(
        parse_signed_url(stdout).unwrap(),
        "https://storage.googleapis.com/bucket/key?sig=2"
    );
}

#[test]
fn first_match_wins() {
    let stdout = "signed_url: https://first.example/a\nhttps://second.example/b\n";
    assert_eq!(parse_signed_url(stdout).unwrap(), "https://first.example/a");
}

#[test]
fn ignores_unrelated_lines() {
    let stdout = "resource: gs://bucket/key\nhttp_verb: GET\nsigned_url: https://example.com/x\n";
    assert_eq!(parse_signed_url(stdout).unwrap(), "https://example.com/x");
}

#[test]
fn unrecognized_output_is_none() {
    assert!(parse_signed_url("").is_none());
    assert!(parse_signed_url("resource: gs://bucket/key\nhttp_verb: GET\n").is_none());
}
