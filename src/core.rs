use chrono::{DateTime, Local};
use encoding_rs::Encoding;
use markup5ever_rcdom::RcDom;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::parsers::html::{
    create_build_stamp, get_charset, get_title, html_to_dom, serialize_document,
};
use crate::pipeline::inline::{inline_images, inline_scripts, inline_stylesheets};
use crate::pipeline::minify::{collapse_whitespace, remove_comments};
use crate::pipeline::stamp::insert_build_stamp;
use crate::pipeline::strip::strip_excluded_references;

/// Represents errors that can occur during bundling or verification
///
/// This error type encapsulates all fatal failures: an unreadable entry
/// document, an artifact that cannot be written, or a verification target
/// that cannot be reached. Per-asset failures never take this form; they
/// degrade into warnings on the stage outcome instead.
#[derive(Debug)]
pub struct BundleError {
    details: String,
}

impl BundleError {
    /// Creates a new BundleError with the given message
    pub fn new(msg: &str) -> BundleError {
        BundleError {
            details: msg.to_string(),
        }
    }
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl Error for BundleError {
    fn description(&self) -> &str {
        &self.details
    }
}

/// Comment markers that survive minification by default
///
/// Any HTML comment containing one of these substrings is kept in the
/// output; everything else is dropped. The set is configuration, not
/// behavior: override it through [`BundleOptions::preserve_comment_markers`].
pub const DEFAULT_PRESERVE_MARKERS: &[&str] = &["@preserve", "@license", "@copyright"];

/// Configuration options for one bundling run
///
/// This struct carries everything the pipeline needs besides the source
/// tree itself: naming inputs for the artifact, the stamped application
/// version, and the minifier's comment-preservation markers.
#[derive(Clone)]
pub struct BundleOptions {
    /// Artifact name prefix; defaults to the entry document's file stem.
    pub app_name: Option<String>,
    /// Application version recorded in the artifact name and build stamp.
    pub app_version: String,
    /// Entry document file name within the source root; auto-detected when
    /// the source root contains exactly one `.html` file.
    pub entry: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub silent: bool,
    /// Substrings identifying comments that must survive minification.
    pub preserve_comment_markers: Vec<String>,
}

impl Default for BundleOptions {
    fn default() -> Self {
        BundleOptions {
            app_name: None,
            app_version: "0.1.0".to_string(),
            entry: None,
            output_dir: None,
            silent: false,
            preserve_comment_markers: DEFAULT_PRESERVE_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

/// Statistics collected over one pipeline run
///
/// Every stage returns its own counts; the orchestrator folds them into
/// this record, which ends up printed to the console and embedded in the
/// artifact's build stamp.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BundleStats {
    pub css_files_inlined: usize,
    pub js_files_inlined: usize,
    pub images_encoded: usize,
    pub pwa_refs_removed: usize,
    pub test_refs_removed: usize,
    pub original_size: usize,
    pub final_size: usize,
}

/// The finished product of one pipeline run
pub struct BundleArtifact {
    /// Versioned, timestamped artifact file name.
    pub file_name: String,
    /// Full artifact text, minified and stamped.
    pub html: String,
    /// Character encoding the artifact should be written in.
    pub encoding: String,
    /// Title of the entry document, when present.
    pub title: Option<String>,
    pub stats: BundleStats,
    /// Non-fatal problems encountered along the way (missing or unreadable
    /// assets); the build completes despite them.
    pub warnings: Vec<String>,
}

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

/// Magic-byte signatures for the image formats the encoder recognizes
const IMAGE_FILE_SIGNATURES: [[&[u8]; 2]; 7] = [
    [b"GIF87a", b"image/gif"],
    [b"GIF89a", b"image/gif"],
    [b"\xFF\xD8\xFF", b"image/jpeg"],
    [b"\x89PNG\x0D\x0A\x1A\x0A", b"image/png"],
    [b"<svg ", b"image/svg+xml"],
    [b"RIFF....WEBPVP8 ", b"image/webp"],
    [b"\x00\x00\x01\x00", b"image/x-icon"],
];

/// Determines the media type of image data based on its content signature
pub fn detect_image_media_type(data: &[u8], filename: &str) -> String {
    // First try to detect by magic bytes
    for signature in &IMAGE_FILE_SIGNATURES {
        let sig_bytes = signature[0];
        if data.len() >= sig_bytes.len() && data.starts_with(sig_bytes) {
            return String::from_utf8_lossy(signature[1]).to_string();
        }
    }

    // Fall back to detecting by file extension
    detect_image_media_type_by_file_name(filename)
}

/// Determines the media type of an image based on file extension
///
/// Unknown extensions fall back to a generic image type rather than
/// failing.
pub fn detect_image_media_type_by_file_name(filename: &str) -> String {
    let filename_lowercased = filename.to_lowercase();

    if filename_lowercased.ends_with(".svg") {
        "image/svg+xml".to_string()
    } else if filename_lowercased.ends_with(".png") {
        "image/png".to_string()
    } else if filename_lowercased.ends_with(".jpg") || filename_lowercased.ends_with(".jpeg") {
        "image/jpeg".to_string()
    } else if filename_lowercased.ends_with(".gif") {
        "image/gif".to_string()
    } else if filename_lowercased.ends_with(".webp") {
        "image/webp".to_string()
    } else if filename_lowercased.ends_with(".ico") {
        "image/x-icon".to_string()
    } else {
        "image/png".to_string()
    }
}

/// Checks whether a file name carries a recognized image extension
pub fn has_image_extension(filename: &str) -> bool {
    let filename_lowercased = filename.to_lowercase();

    [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico"]
        .iter()
        .any(|extension| filename_lowercased.ends_with(extension))
}

/// Parses a Content-Type header or meta value
pub fn parse_content_type(content_type: &str) -> (String, String, bool) {
    let mut media_type = String::new();
    let mut charset = String::new();
    let mut is_base64 = false;

    let parts: Vec<&str> = content_type.split(';').collect();

    if !parts.is_empty() {
        media_type = parts[0].trim().to_lowercase();
    }

    for part in parts.iter().skip(1) {
        let part = part.trim();
        if part.starts_with("charset=") {
            charset = part[8..].trim_matches('"').to_string();
        } else if part == "base64" {
            is_base64 = true;
        }
    }

    (media_type, charset, is_base64)
}

/// Formats the artifact file name from naming inputs and build time
///
/// The timestamp format sorts lexicographically; the verifier CLI relies
/// on that to pick the most recent artifact by file name alone.
pub fn format_artifact_name(
    app_name: &str,
    app_version: &str,
    build_time: &DateTime<Local>,
) -> String {
    format!(
        "{}_v{}_{}.html",
        app_name.replace(['/', '\\'], "_"),
        app_version,
        build_time.format("%Y%m%d_%H%M%S"),
    )
}

/// Prints an error or warning message to stderr
pub fn print_error_message(msg: &str) {
    if atty::is(atty::Stream::Stderr) {
        eprintln!("{ANSI_COLOR_RED}{msg}{ANSI_COLOR_RESET}");
    } else {
        eprintln!("{msg}");
    }
}

/// Prints an info message to stdout
pub fn print_info_message(msg: &str) {
    println!("{msg}");
}

/// Locates the entry document within the source root
///
/// When no entry file name is configured, the source root must contain
/// exactly one `.html` file; zero or several is an error since the
/// pipeline has no way to choose.
pub fn find_entry_document(
    source_root: &Path,
    options: &BundleOptions,
) -> Result<PathBuf, BundleError> {
    if let Some(entry) = &options.entry {
        let entry_path = source_root.join(entry);
        if entry_path.is_file() {
            return Ok(entry_path);
        }
        return Err(BundleError::new(&format!(
            "entry document not found: {}",
            entry_path.display()
        )));
    }

    let mut html_files: Vec<PathBuf> = Vec::new();
    let entries = fs::read_dir(source_root).map_err(|e| {
        BundleError::new(&format!(
            "could not read source root {}: {}",
            source_root.display(),
            e
        ))
    })?;
    for dir_entry in entries.flatten() {
        let path = dir_entry.path();
        if path.is_file()
            && path
                .extension()
                .map(|extension| extension.eq_ignore_ascii_case("html"))
                .unwrap_or(false)
        {
            html_files.push(path);
        }
    }

    match html_files.len() {
        0 => Err(BundleError::new(&format!(
            "no entry document found in {}",
            source_root.display()
        ))),
        1 => Ok(html_files.remove(0)),
        n => Err(BundleError::new(&format!(
            "found {} HTML files in {}; use an explicit entry file name",
            n,
            source_root.display()
        ))),
    }
}

/// Parses the entry document, honoring a meta charset declaration
///
/// The document is first parsed as UTF-8; if it declares a different,
/// valid charset, it is re-parsed with that encoding so non-UTF-8 source
/// trees survive the round trip.
fn parse_entry_document(data: &[u8]) -> (RcDom, String) {
    let mut document_encoding = "utf-8".to_string();
    let mut dom = html_to_dom(data, document_encoding.clone());

    if let Some(html_charset) = get_charset(&dom.document) {
        if !html_charset.is_empty() {
            if let Some(charset) = Encoding::for_label_no_replacement(html_charset.as_bytes()) {
                document_encoding = html_charset;
                dom = html_to_dom(data, charset.name().to_string());
            }
        }
    }

    (dom, document_encoding)
}

/// Runs the full bundling pipeline over a source tree
///
/// Stage order is a hard contract: stripping runs before inlining (an
/// inlined script can no longer be matched by source path), CSS inlining
/// runs before script and image inlining (stylesheets may reference
/// images that must resolve against the source tree), and minification
/// runs only once every reference has been inlined. The build stamp goes
/// in last so it escapes the minifier.
pub fn bundle_app(
    source_root: &Path,
    options: &BundleOptions,
) -> Result<BundleArtifact, BundleError> {
    let entry_path = find_entry_document(source_root, options)?;
    let input_data = fs::read(&entry_path).map_err(|e| {
        BundleError::new(&format!(
            "could not read entry document {}: {}",
            entry_path.display(),
            e
        ))
    })?;

    let mut stats = BundleStats {
        original_size: input_data.len(),
        ..BundleStats::default()
    };
    let mut warnings: Vec<String> = Vec::new();

    let (dom, document_encoding) = parse_entry_document(&input_data);
    let title = get_title(&dom.document);

    // 1. Strip test-only and distribution-metadata references
    let strip_outcome = strip_excluded_references(&dom);
    stats.test_refs_removed = strip_outcome.test_refs_removed;
    stats.pwa_refs_removed = strip_outcome.pwa_refs_removed;

    // 2. Inline stylesheets (rewriting their image references first)
    let css_outcome = inline_stylesheets(&dom, source_root);
    stats.css_files_inlined = css_outcome.files_inlined;
    stats.images_encoded += css_outcome.images_encoded;
    warnings.extend(css_outcome.warnings);

    // 3. Inline local scripts, preserving CDN references
    let js_outcome = inline_scripts(&dom, source_root);
    stats.js_files_inlined = js_outcome.files_inlined;
    warnings.extend(js_outcome.warnings);

    // 4. Encode images referenced from markup
    let image_outcome = inline_images(&dom, source_root);
    stats.images_encoded += image_outcome.images_encoded;
    warnings.extend(image_outcome.warnings);

    // 5. Minify: drop non-preserved comments, then collapse whitespace
    remove_comments(&dom, &options.preserve_comment_markers);
    let serialized = serialize_document(&dom);
    let minified = collapse_whitespace(&serialized);

    // 6. Stamp build metadata right after the head-open tag
    let build_time: DateTime<Local> = Local::now();
    let stamp = create_build_stamp(&options.app_version, &build_time, &stats);
    let stamped = insert_build_stamp(&minified, &stamp);

    stats.final_size = stamped.len();

    if !options.silent {
        for warning in &warnings {
            print_error_message(warning);
        }
    }

    let app_name = options.app_name.clone().unwrap_or_else(|| {
        entry_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "bundle".to_string())
    });

    Ok(BundleArtifact {
        file_name: format_artifact_name(&app_name, &options.app_version, &build_time),
        html: stamped,
        encoding: document_encoding,
        title,
        stats,
        warnings,
    })
}

/// Writes a finished artifact into the output directory
///
/// The artifact is staged through a temporary sibling and renamed into
/// place, so a failed write never leaves a partial artifact behind.
pub fn write_artifact(
    artifact: &BundleArtifact,
    output_dir: &Path,
) -> Result<PathBuf, BundleError> {
    let output_path = output_dir.join(&artifact.file_name);
    let staging_path = output_dir.join(format!("{}.part", artifact.file_name));

    let mut data: Vec<u8> = artifact.html.clone().into_bytes();
    if !artifact.encoding.is_empty() && !artifact.encoding.eq_ignore_ascii_case("utf-8") {
        if let Some(encoding) = Encoding::for_label(artifact.encoding.as_bytes()) {
            let (encoded, _, _) = encoding.encode(&artifact.html);
            data = encoded.to_vec();
        }
    }

    if let Err(e) = fs::write(&staging_path, &data) {
        let _ = fs::remove_file(&staging_path);
        return Err(BundleError::new(&format!(
            "could not write artifact {}: {}",
            output_path.display(),
            e
        )));
    }

    if let Err(e) = fs::rename(&staging_path, &output_path) {
        let _ = fs::remove_file(&staging_path);
        return Err(BundleError::new(&format!(
            "could not write artifact {}: {}",
            output_path.display(),
            e
        )));
    }

    Ok(output_path)
}
