use base64::{prelude::BASE64_STANDARD, Engine};

pub use url::Url;

/// URI schemes whose references are never rewritten by the pipeline.
pub const EXTERNAL_SCHEMES: &[&str] = &["http://", "https://", "data:"];

/// Checks whether a reference points outside the local source tree.
///
/// External references (absolute `http://`/`https://` URLs and already
/// embedded `data:` URIs) are left untouched by every pipeline stage.
pub fn is_external_reference(reference: &str) -> bool {
    EXTERNAL_SCHEMES
        .iter()
        .any(|scheme| reference.starts_with(scheme))
}

/// Builds a `data:` URL embedding the given bytes as base64.
pub fn create_data_url(media_type: &str, data: &[u8]) -> Url {
    let media_type = if media_type.is_empty() {
        "application/octet-stream"
    } else {
        media_type
    };

    Url::parse(&format!(
        "data:{};base64,{}",
        media_type,
        BASE64_STANDARD.encode(data)
    ))
    .unwrap()
}

/// Splits a `data:` URL back into its media type and decoded payload.
///
/// Non-base64 payloads come back percent-decoded; a malformed base64
/// payload decodes to an empty byte vector.
pub fn parse_data_url(url: &Url) -> (String, Vec<u8>) {
    let path: String = url.path().to_string();
    let comma_loc: usize = path.find(',').unwrap_or(path.len());

    let meta_data: String = path.chars().take(comma_loc).collect();
    let raw_data: String = path.chars().skip(comma_loc + 1).collect();

    let mut media_type = meta_data.as_str();
    let mut is_base64 = false;
    if let Some(stripped) = meta_data.strip_suffix(";base64") {
        media_type = stripped;
        is_base64 = true;
    }

    let data: Vec<u8> = if is_base64 {
        BASE64_STANDARD.decode(&raw_data).unwrap_or_default()
    } else {
        percent_encoding::percent_decode_str(&raw_data).collect()
    };

    (media_type.to_string(), data)
}
