//! End-to-end pipeline scenarios over real source trees

mod common;

use base64::{prelude::BASE64_STANDARD, Engine};
use url::Url;

use onefile::core::{bundle_app, write_artifact, BundleOptions};
use onefile::utils::url::parse_data_url;
use onefile::verifier::verify_document;

use common::{fixture_source_tree, write_file, LOGO_PNG, TEST_SCRIPT_SENTINEL};

fn bundle_fixture() -> onefile::core::BundleArtifact {
    let dir = fixture_source_tree();
    let options = BundleOptions {
        app_version: "0.7.6".to_string(),
        silent: true,
        ..BundleOptions::default()
    };
    bundle_app(dir.path(), &options).unwrap()
}

#[test]
fn end_to_end_inlines_every_reference() {
    let artifact = bundle_fixture();
    let html = &artifact.html;

    // No stylesheet links or local script references survive
    assert!(!html.contains("rel=\"stylesheet\""));
    assert!(!html.contains("src=\"app.js\""));
    assert!(!html.contains("styles.css?v=3"));

    // One embedded style block and one embedded script block exist
    assert!(html.contains("<style>"));
    assert!(html.contains("/* === styles.css === */"));
    assert!(html.contains("/* === app.js === */"));
    assert!(html.contains("console.log(\"app ready\");"));

    // The logo payload appears at least twice: once from the stylesheet
    // rewrite and once from the img element
    let payload = BASE64_STANDARD.encode(LOGO_PNG);
    assert!(html.matches(payload.as_str()).count() >= 2);

    // CDN script reference is preserved verbatim
    assert!(html.contains("https://cdn.example.com/lib.js"));

    assert_eq!(artifact.stats.css_files_inlined, 1);
    assert_eq!(artifact.stats.js_files_inlined, 1);
    assert_eq!(artifact.stats.images_encoded, 2);
    assert!(artifact.warnings.is_empty());
}

#[test]
fn end_to_end_artifact_passes_verification() {
    let artifact = bundle_fixture();
    let report = verify_document(&artifact.html);
    assert!(report.passed(), "failing checks: {:?}", report.checks);
}

#[test]
fn stripping_precedes_inlining() {
    let artifact = bundle_fixture();

    // The test script exists on disk, yet it must be absent from the
    // artifact in both reference and embedded form
    assert!(!artifact.html.contains("quick-test.js"));
    assert!(!artifact.html.contains(TEST_SCRIPT_SENTINEL));
    assert_eq!(artifact.stats.test_refs_removed, 1);
}

#[test]
fn distribution_metadata_is_removed() {
    let artifact = bundle_fixture();

    assert!(!artifact.html.contains("manifest.json"));
    assert!(!artifact.html.contains("apple-touch-icon"));
    assert!(!artifact.html.contains("serviceWorker"));
    assert_eq!(artifact.stats.pwa_refs_removed, 3);
}

#[test]
fn minification_respects_preservation_markers() {
    let artifact = bundle_fixture();

    assert!(artifact.html.contains("@license MIT banner"));
    assert!(!artifact.html.contains("scratch note for developers"));
}

#[test]
fn build_stamp_lands_after_head_open() {
    let artifact = bundle_fixture();
    let html = &artifact.html;

    let head_pos = html.find("<head>").unwrap();
    let stamp_pos = html.find("Generated by onefile").unwrap();
    assert!(head_pos < stamp_pos);
    assert!(html.contains("Version: 0.7.6"));
    assert!(html.contains("CSS files inlined: 1"));
}

#[test]
fn artifact_name_encodes_version_and_timestamp() {
    let artifact = bundle_fixture();

    assert!(artifact.file_name.starts_with("index_v0.7.6_"));
    assert!(artifact.file_name.ends_with(".html"));
}

#[test]
fn embedded_image_payload_round_trips() {
    let artifact = bundle_fixture();
    let html = &artifact.html;

    let start = html.find("data:image/png;base64,").unwrap();
    let tail = &html[start..];
    let end = tail.find(['"', ')']).unwrap();
    let data_url = Url::parse(&tail[..end]).unwrap();

    let (media_type, decoded) = parse_data_url(&data_url);
    assert_eq!(media_type, "image/png");
    assert_eq!(decoded, LOGO_PNG);
}

#[test]
fn missing_stylesheet_degrades_to_one_warning() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "index.html",
        concat!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\">",
            "<title>t</title>",
            "<link rel=\"stylesheet\" href=\"missing.css\">",
            "</head><body><script src=\"app.js\"></script></body></html>"
        ),
    );
    write_file(dir.path(), "app.js", "console.log(1);");

    let options = BundleOptions {
        silent: true,
        ..BundleOptions::default()
    };
    let artifact = bundle_app(dir.path(), &options).unwrap();

    // The build completes, the unresolved link survives, and exactly one
    // missing-asset warning is recorded
    assert!(artifact.html.contains("missing.css"));
    assert_eq!(artifact.warnings.len(), 1);
    assert!(artifact.warnings[0].contains("missing.css"));
    assert_eq!(artifact.stats.css_files_inlined, 0);
    assert_eq!(artifact.stats.js_files_inlined, 1);
}

#[test]
fn bundling_fails_without_an_entry_document() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "app.js", "console.log(1);");

    let result = bundle_app(dir.path(), &BundleOptions::default());
    assert!(result.is_err());
}

#[test]
fn bundling_fails_on_ambiguous_entry_documents() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.html", "<html></html>");
    write_file(dir.path(), "b.html", "<html></html>");

    let result = bundle_app(dir.path(), &BundleOptions::default());
    assert!(result.is_err());
}

#[test]
fn explicit_entry_overrides_auto_detection() {
    let dir = fixture_source_tree();
    write_file(dir.path(), "other.html", "<html><head></head><body></body></html>");

    let options = BundleOptions {
        entry: Some("index.html".to_string()),
        silent: true,
        ..BundleOptions::default()
    };
    let artifact = bundle_app(dir.path(), &options).unwrap();
    assert!(artifact.file_name.starts_with("index_"));
}

#[test]
fn written_artifact_matches_in_memory_html() {
    let dir = fixture_source_tree();
    let out = tempfile::tempdir().unwrap();

    let options = BundleOptions {
        silent: true,
        ..BundleOptions::default()
    };
    let artifact = bundle_app(dir.path(), &options).unwrap();
    let path = write_artifact(&artifact, out.path()).unwrap();

    assert!(path.ends_with(&artifact.file_name));
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, artifact.html);

    // No staging leftovers
    let leftovers: Vec<_> = std::fs::read_dir(out.path())
        .unwrap()
        .flatten()
        .filter(|e| e.path().extension().map(|x| x == "part").unwrap_or(false))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn non_ascii_asset_names_are_bundled() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "index.html",
        concat!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>t</title>",
            "<link rel=\"stylesheet\" href=\"%E3%82%B9%E3%82%BF%E3%82%A4%E3%83%AB.css\">",
            "</head><body><img src=\"ロゴ.png\"></body></html>"
        ),
    );
    write_file(dir.path(), "スタイル.css", "body { margin: 0; }");
    write_file(dir.path(), "ロゴ.png", LOGO_PNG);

    let options = BundleOptions {
        silent: true,
        ..BundleOptions::default()
    };
    let artifact = bundle_app(dir.path(), &options).unwrap();

    assert!(artifact.warnings.is_empty(), "{:?}", artifact.warnings);
    assert_eq!(artifact.stats.css_files_inlined, 1);
    assert_eq!(artifact.stats.images_encoded, 1);
    assert!(artifact.html.contains("/* === スタイル.css === */"));
    assert!(artifact.html.contains("data:image/png;base64,"));
}
