//! Artifact verification
//!
//! Independently re-parses a finished artifact and asserts the pipeline's
//! output contract through a fixed battery of named checks:
//!
//! - `structure` - doctype, html/head/body/title elements, charset and
//!   viewport declarations all present
//! - `css-inlined` - at least one embedded style block, zero external
//!   stylesheet links
//! - `js-inlined` - at least one embedded script block, zero local script
//!   references (CDN `https://` references are expected and pass)
//! - `images-embedded` - at least one embedded image, zero local image
//!   references
//! - `pwa-removed` - all four distribution-metadata fragment classes absent
//! - `size` - total byte length under the fixed ceiling
//!
//! Every check runs regardless of earlier failures and reports its own
//! detail; the aggregate passes only when every check passes. The verifier
//! holds no shared state: it can run repeatedly, and concurrently across
//! different artifacts. A target that cannot be read or fetched at all is
//! a hard error, not a failed report.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;

use crate::core::BundleError;

/// Artifacts larger than this fail the size check
pub const MAX_ARTIFACT_BYTES: usize = 5 * 1024 * 1024;

/// Default timeout for fetching a verification target over the network
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one named check
#[derive(Clone, Debug)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn new(name: &str, passed: bool, detail: String) -> CheckResult {
        CheckResult {
            name: name.to_string(),
            passed,
            detail,
        }
    }
}

/// Per-check results for one verification run
#[derive(Clone, Debug, Default)]
pub struct VerificationReport {
    pub checks: Vec<CheckResult>,
}

impl VerificationReport {
    /// True when every check passed
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// Number of checks that passed
    pub fn score(&self) -> usize {
        self.checks.iter().filter(|check| check.passed).count()
    }

    /// Total number of checks that ran
    pub fn total(&self) -> usize {
        self.checks.len()
    }
}

/// Runs the full check battery over artifact text
pub fn verify_document(html: &str) -> VerificationReport {
    VerificationReport {
        checks: vec![
            check_structure(html),
            check_css_inlined(html),
            check_js_inlined(html),
            check_images_embedded(html),
            check_pwa_removed(html),
            check_size(html),
        ],
    }
}

/// Verifies an artifact on the local filesystem
pub fn verify_file(path: &Path) -> Result<VerificationReport, BundleError> {
    let html = fs::read_to_string(path).map_err(|e| {
        BundleError::new(&format!("could not read artifact {}: {}", path.display(), e))
    })?;

    Ok(verify_document(&html))
}

/// Verifies an artifact fetched over HTTP(S)
///
/// A timeout or non-success status is a hard failure of the run; no
/// partial verification is attempted against an unreachable artifact.
pub fn verify_url(target: &str, timeout: Duration) -> Result<VerificationReport, BundleError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BundleError::new(&format!("could not build HTTP client: {}", e)))?;

    let response = client
        .get(target)
        .send()
        .map_err(|e| BundleError::new(&format!("could not fetch {}: {}", target, e)))?;

    if !response.status().is_success() {
        return Err(BundleError::new(&format!(
            "fetching {} returned HTTP {}",
            target,
            response.status()
        )));
    }

    let html = response
        .text()
        .map_err(|e| BundleError::new(&format!("could not read response body: {}", e)))?;

    Ok(verify_document(&html))
}

/// Picks the most recently built artifact in a directory
///
/// Artifact names embed their build timestamp in lexicographically
/// sortable form, so the last name in sort order is the newest build.
pub fn find_latest_artifact(dir: &Path) -> Option<PathBuf> {
    let mut artifacts: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .map(|dir_entry| dir_entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|extension| extension.eq_ignore_ascii_case("html"))
                    .unwrap_or(false)
        })
        .collect();

    artifacts.sort();
    artifacts.pop()
}

fn check_structure(html: &str) -> CheckResult {
    let requirements: [(&str, &str); 7] = [
        ("doctype declaration", r"(?i)<!DOCTYPE html>"),
        ("html element", r"(?i)<html[^>]*>"),
        ("head element", r"(?is)<head[^>]*>.*</head>"),
        ("body element", r"(?is)<body[^>]*>.*</body>"),
        ("title element", r"(?is)<title[^>]*>.*</title>"),
        ("charset declaration", r"(?i)<meta[^>]*charset[^>]*>"),
        ("viewport declaration", r"(?i)<meta[^>]*viewport[^>]*>"),
    ];

    let missing: Vec<&str> = requirements
        .iter()
        .filter(|(_, pattern)| !Regex::new(pattern).unwrap().is_match(html))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        CheckResult::new(
            "structure",
            true,
            "all required document elements present".to_string(),
        )
    } else {
        CheckResult::new(
            "structure",
            false,
            format!("missing: {}", missing.join(", ")),
        )
    }
}

fn check_css_inlined(html: &str) -> CheckResult {
    let style_blocks = Regex::new(r"(?is)<style[^>]*>.*?</style>")
        .unwrap()
        .find_iter(html)
        .count();
    let external_links = Regex::new(r#"(?i)<link[^>]*rel=["']?stylesheet["']?[^>]*>"#)
        .unwrap()
        .find_iter(html)
        .count();

    if style_blocks == 0 {
        CheckResult::new("css-inlined", false, "no embedded style block".to_string())
    } else if external_links > 0 {
        CheckResult::new(
            "css-inlined",
            false,
            format!("{} external stylesheet link(s) remain", external_links),
        )
    } else {
        CheckResult::new(
            "css-inlined",
            true,
            format!("{} embedded style block(s), no external links", style_blocks),
        )
    }
}

fn check_js_inlined(html: &str) -> CheckResult {
    let script_tags = Regex::new(r"(?is)<script([^>]*)>").unwrap();
    let src_attr = Regex::new(r#"(?i)src=["']([^"']+)["']"#).unwrap();

    let mut inline_blocks = 0;
    let mut local_refs: Vec<String> = Vec::new();
    let mut cdn_refs = 0;

    for capture in script_tags.captures_iter(html) {
        let attrs = capture.get(1).map(|m| m.as_str()).unwrap_or("");
        match src_attr.captures(attrs) {
            Some(src) => {
                let src_value = src.get(1).map(|m| m.as_str()).unwrap_or("");
                if src_value.starts_with("https://") {
                    cdn_refs += 1;
                } else {
                    local_refs.push(src_value.to_string());
                }
            }
            None => inline_blocks += 1,
        }
    }

    if inline_blocks == 0 {
        CheckResult::new("js-inlined", false, "no embedded script block".to_string())
    } else if !local_refs.is_empty() {
        CheckResult::new(
            "js-inlined",
            false,
            format!(
                "{} local script reference(s) remain: {}",
                local_refs.len(),
                local_refs.join(", ")
            ),
        )
    } else {
        CheckResult::new(
            "js-inlined",
            true,
            format!(
                "{} embedded script block(s), {} CDN reference(s) preserved",
                inline_blocks, cdn_refs
            ),
        )
    }
}

fn check_images_embedded(html: &str) -> CheckResult {
    let embedded = Regex::new(r#"(?:src=|url\()["']?data:image/[^"';\)\s]+"#)
        .unwrap()
        .find_iter(html)
        .count();

    let img_src = Regex::new(r#"(?i)<img[^>]*\ssrc=["']([^"']+)["']"#).unwrap();
    let local_refs: Vec<&str> = img_src
        .captures_iter(html)
        .filter_map(|capture| capture.get(1))
        .map(|m| m.as_str())
        .filter(|src| {
            !src.starts_with("http://") && !src.starts_with("https://") && !src.starts_with("data:")
        })
        .collect();

    if embedded == 0 {
        CheckResult::new(
            "images-embedded",
            false,
            "no embedded image payload found".to_string(),
        )
    } else if !local_refs.is_empty() {
        CheckResult::new(
            "images-embedded",
            false,
            format!(
                "{} local image reference(s) remain: {}",
                local_refs.len(),
                local_refs.join(", ")
            ),
        )
    } else {
        CheckResult::new(
            "images-embedded",
            true,
            format!("{} embedded image(s), no local references", embedded),
        )
    }
}

fn check_pwa_removed(html: &str) -> CheckResult {
    let fragment_classes: [(&str, &str); 4] = [
        ("manifest link", r#"(?i)<link[^>]*rel=["']?manifest["']?[^>]*>"#),
        (
            "apple-touch-icon link",
            r#"(?i)<link[^>]*rel=["']?apple-touch-icon["']?[^>]*>"#,
        ),
        (
            "service-worker registration",
            r"navigator\.serviceWorker\.register",
        ),
        ("manifest fetch", r#"fetch\(["'][^"']*manifest\.json["']"#),
    ];

    let remaining: Vec<&str> = fragment_classes
        .iter()
        .filter(|(_, pattern)| Regex::new(pattern).unwrap().is_match(html))
        .map(|(name, _)| *name)
        .collect();

    if remaining.is_empty() {
        CheckResult::new(
            "pwa-removed",
            true,
            "no installable-app metadata present".to_string(),
        )
    } else {
        CheckResult::new(
            "pwa-removed",
            false,
            format!("still present: {}", remaining.join(", ")),
        )
    }
}

fn check_size(html: &str) -> CheckResult {
    let size = html.len();

    if size < MAX_ARTIFACT_BYTES {
        CheckResult::new(
            "size",
            true,
            format!("{} bytes (ceiling {} bytes)", size, MAX_ARTIFACT_BYTES),
        )
    } else {
        CheckResult::new(
            "size",
            false,
            format!("{} bytes exceeds ceiling of {} bytes", size, MAX_ARTIFACT_BYTES),
        )
    }
}
