//! Asset reference resolution and binary encoding
//!
//! Every reference string found in markup or stylesheet text goes through
//! [`locate_asset`] before anything touches it: the locator strips query
//! parameters and relative-path prefixes, percent-decodes the remainder
//! (so non-ASCII file names resolve), and classifies the reference as
//! local-resolved, local-missing, or external. Resolved image assets are
//! turned into embeddable `data:` URLs by [`encode_image_file`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::core::detect_image_media_type;
use crate::utils::url::{create_data_url, is_external_reference, Url};

/// Asset classes the pipeline distinguishes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Stylesheet,
    Script,
    Image,
}

/// Where a reference resolution ended up
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetResolution {
    /// The reference maps to an existing file under the source root.
    Resolved(PathBuf),
    /// The reference looks local but no such file exists.
    Missing,
    /// The reference points outside the source tree and is never touched.
    External,
}

/// One scanned reference, resolved against the source root
///
/// Created during scanning and consumed exactly once during inlining;
/// nothing retains it afterwards.
#[derive(Clone, Debug)]
pub struct AssetReference {
    /// The reference string exactly as it appeared in the document.
    pub raw: String,
    pub kind: AssetKind,
    pub resolution: AssetResolution,
}

/// Resolves a raw reference string against the source root
///
/// Query parameters and fragments are dropped (cache-busting suffixes like
/// `styles.css?v=3` still map to the file), leading `./` and `/` tokens
/// are removed, and the rest is percent-decoded before joining. External
/// schemes short-circuit to [`AssetResolution::External`].
pub fn locate_asset(source_root: &Path, reference: &str, kind: AssetKind) -> AssetReference {
    if is_external_reference(reference) {
        return AssetReference {
            raw: reference.to_string(),
            kind,
            resolution: AssetResolution::External,
        };
    }

    let trimmed = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference)
        .trim_start_matches("./")
        .trim_start_matches('/');

    let decoded: String = match percent_decode_str(trimmed).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => trimmed.to_string(),
    };

    let path = source_root.join(decoded);
    let resolution = if path.is_file() {
        AssetResolution::Resolved(path)
    } else {
        AssetResolution::Missing
    };

    AssetReference {
        raw: reference.to_string(),
        kind,
        resolution,
    }
}

/// Reads an image file and encodes it as an embeddable `data:` URL
///
/// The media type is inferred from the content signature first and the
/// file extension second. Read failures bubble up so the caller can fall
/// back to leaving the original reference in place.
pub fn encode_image_file(path: &Path) -> Result<Url, io::Error> {
    let data = fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let media_type = detect_image_media_type(&data, &filename);

    Ok(create_data_url(&media_type, &data))
}
