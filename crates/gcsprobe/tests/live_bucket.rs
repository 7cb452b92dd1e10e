// Test module - relaxed lint rules
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::print_stderr)]
#![allow(missing_docs)]

//! Live bucket scenarios
//!
//! These exercise the real storage CLI against the bucket named by
//! `GCS_BUCKET_NAME`. Without that variable (or without an installed,
//! authenticated CLI) each test skips rather than fails, so the suite stays
//! green on machines with no cloud access.

use gcsprobe::config::HarnessConfig;
use gcsprobe::fixtures::{random_content, BucketFixture, TrackedObjects};

fn live_fixture() -> Option<BucketFixture> {
    let Ok(config) = HarnessConfig::from_env() else {
        eprintln!("skipping: GCS_BUCKET_NAME not set");
        return None;
    };
    let fixture = BucketFixture::new(config);
    if !fixture.cli().is_available() {
        eprintln!("skipping: storage CLI not installed");
        return None;
    }
    Some(fixture)
}

#[test]
fn upload_download_round_trip() {
    let Some(fixture) = live_fixture() else { return };
    let mut tracked = TrackedObjects::new(fixture.cli().clone());

    let content = random_content(1);
    let name = fixture.unique_name("txt");
    let gs_path = fixture.upload_text(&name, &content).unwrap();
    tracked.track(&gs_path);

    assert_eq!(fixture.read_content(&gs_path).unwrap(), content);
}

#[test]
fn exact_path_listing_yields_singleton() {
    let Some(fixture) = live_fixture() else { return };
    let mut tracked = TrackedObjects::new(fixture.cli().clone());

    let gs_path = fixture
        .upload_text(&fixture.unique_name("txt"), "listing probe")
        .unwrap();
    tracked.track(&gs_path);

    let listed = fixture.cli().list_objects(&gs_path, false).unwrap();
    assert_eq!(listed, vec![gs_path.clone()]);
    assert!(fixture.object_exists(&gs_path));
}

#[test]
fn deletion_is_observable() {
    let Some(fixture) = live_fixture() else { return };

    let gs_path = fixture
        .upload_text(&fixture.unique_name("txt"), "to be deleted")
        .unwrap();
    assert!(fixture.object_exists(&gs_path));

    let outcome = fixture.cli().delete_object(&gs_path).unwrap();
    assert!(outcome.success(), "delete failed: {}", outcome.stderr());
    assert!(!fixture.object_exists(&gs_path));
}

#[test]
fn bulk_delete_removes_every_object() {
    let Some(fixture) = live_fixture() else { return };

    let first = fixture
        .upload_text(&fixture.unique_name("txt"), "one")
        .unwrap();
    let second = fixture
        .upload_text(&fixture.unique_name("txt"), "two")
        .unwrap();

    let outcome = fixture
        .cli()
        .delete_objects(&[first.as_str(), second.as_str()])
        .unwrap();
    assert!(outcome.success(), "bulk delete failed: {}", outcome.stderr());
    assert!(!fixture.object_exists(&first));
    assert!(!fixture.object_exists(&second));
}

#[test]
fn describe_reports_object_metadata() {
    let Some(fixture) = live_fixture() else { return };
    let mut tracked = TrackedObjects::new(fixture.cli().clone());

    let gs_path = fixture
        .upload_text(&fixture.unique_name("txt"), "metadata")
        .unwrap();
    tracked.track(&gs_path);

    let outcome = fixture.cli().describe_object(&gs_path).unwrap();
    assert!(outcome.success(), "describe failed: {}", outcome.stderr());
    let value: serde_json::Value = serde_json::from_str(outcome.stdout()).unwrap();
    assert!(
        value.get("name").is_some() || value.get("url").is_some(),
        "unexpected metadata shape: {value}"
    );
}

#[test]
fn empty_prefix_lists_empty_not_error() {
    let Some(fixture) = live_fixture() else { return };
    let prefix = fixture
        .config()
        .gs_path(&format!("{}no-such-prefix-ever/", fixture.config().object_prefix));
    let listed = fixture.cli().list_objects(&prefix, false).unwrap();
    assert!(listed.is_empty());
}

#[test]
fn tracked_objects_clean_up_on_drop() {
    let Some(fixture) = live_fixture() else { return };

    let gs_path = fixture
        .upload_text(&fixture.unique_name("txt"), "scoped")
        .unwrap();
    {
        let mut tracked = TrackedObjects::new(fixture.cli().clone());
        tracked.track(&gs_path);
        assert_eq!(tracked.paths(), [gs_path.clone()]);
    }
    assert!(!fixture.object_exists(&gs_path));
}

#[test]
fn generated_signed_url_is_well_formed() {
    let Some(fixture) = live_fixture() else { return };
    let mut tracked = TrackedObjects::new(fixture.cli().clone());

    let gs_path = fixture
        .upload_text(&fixture.unique_name("txt"), "URL format test")
        .unwrap();
    tracked.track(&gs_path);

    let duration = fixture.config().signed_url_duration_minutes;
    let url = fixture
        .cli()
        .generate_signed_url(&gs_path, duration)
        .unwrap();

    assert!(url.starts_with("http"), "unexpected scheme: {url}");
    // Marker casing differs between signing backends.
    let lowered = url.to_lowercase();
    assert!(
        lowered.contains("expires=") || lowered.contains("x-goog-expires"),
        "no expiry marker: {url}"
    );
    assert!(
        lowered.contains("signature=") || lowered.contains("x-goog-signature"),
        "no signature marker: {url}"
    );
    // Properly encoded, so never a raw space.
    assert!(!url.contains(' '), "unescaped space: {url}");
}

#[test]
fn concurrent_namespaces_stay_isolated() {
    let Some(fixture) = live_fixture() else { return };

    // Two workers share the bucket but never a namespace: each uploads
    // under its own prefix, then verifies a prefix-scoped listing shows
    // exactly its own objects while the other worker runs.
    let pairs = [("iso-a-", "iso-b-"), ("iso-b-", "iso-a-")];
    std::thread::scope(|scope| {
        for (own, other) in pairs {
            let fixture = fixture.clone();
            scope.spawn(move || {
                let prefix = format!("{}{own}", fixture.config().object_prefix);
                let mut tracked = TrackedObjects::new(fixture.cli().clone());
                for _ in 0..2 {
                    let name = gcsprobe::fixtures::unique_object_name(&prefix, "txt");
                    let path = fixture.upload_text(&name, "isolated").unwrap();
                    tracked.track(path);
                }

                let pattern = fixture.config().gs_path(&format!("{prefix}*"));
                let listed = fixture.cli().list_objects(&pattern, false).unwrap();
                let mut expected: Vec<String> = tracked.paths().to_vec();
                expected.sort();
                let mut listed_sorted = listed.clone();
                listed_sorted.sort();
                assert_eq!(listed_sorted, expected);
                assert!(
                    listed.iter().all(|path| !path.contains(other)),
                    "foreign namespace leaked into {listed:?}"
                );
            });
        }
    });
}
