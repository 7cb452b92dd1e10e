// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]
#![allow(missing_docs)]

//! Test data generator unit tests

use gcsprobe::fixtures::{
    binary_content, csv_content, html_content, json_content, random_content, unique_object_name,
};

#[test]
fn object_names_carry_prefix_and_extension() {
    let name = unique_object_name("test-", "txt");
    assert!(name.starts_with("test-"), "unexpected name: {name}");
    assert!(name.ends_with(".txt"), "unexpected name: {name}");
}

#[test]
fn object_names_embed_timestamp_and_id() {
    let name = unique_object_name("test-", "txt");
    // test-<millis>-<8 hex chars>.txt
    let stem = name
        .strip_prefix("test-")
        .unwrap()
        .strip_suffix(".txt")
        .unwrap();
    let (timestamp, id) = stem.split_once('-').unwrap();
    assert!(timestamp.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(id.len(), 8);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn object_names_are_unique() {
    let a = unique_object_name("test-", "txt");
    let b = unique_object_name("test-", "txt");
    assert_ne!(a, b);
}

#[test]
fn random_content_has_requested_bulk() {
    let content = random_content(2);
    assert!(content.len() >= 2 * 1024);
    // Trailer keeps distinct calls from colliding even within one millisecond.
    assert_ne!(random_content(1), random_content(1));
}

#[test]
fn json_content_parses() {
    let value: serde_json::Value = serde_json::from_str(&json_content()).unwrap();
    assert!(value["id"].is_string());
    assert_eq!(value["data"]["size"], "small");
}

#[test]
fn csv_content_has_header_and_rows() {
    let content = csv_content(5);
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "id,name,value,timestamp");
    for row in &lines[1..] {
        assert_eq!(row.split(',').count(), 4);
    }
}

#[test]
fn html_content_is_a_page() {
    let content = html_content();
    assert!(content.starts_with("<!DOCTYPE html>"));
    assert!(content.contains("<title>"));
}

#[test]
fn binary_content_has_exact_size() {
    assert_eq!(binary_content(3).len(), 3 * 1024);
    assert_ne!(binary_content(1), binary_content(1));
}
