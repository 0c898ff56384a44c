//! CSS parser module
//!
//! Rewrites stylesheet text so it can live inside a single-file artifact:
//! every `url(...)` reference that points at a local image in the source
//! tree is replaced with the image's `data:` URL, while external URLs and
//! already-embedded `data:` URIs pass through untouched. The stylesheet is
//! reconstructed token by token with `cssparser`, so irregular markup
//! inside strings or comments cannot confuse the rewrite the way text
//! patterns would.
//!
//! Non-image references (fonts, fragments like `url(#mask)`) are left
//! alone; a stylesheet that imports other stylesheets keeps its `@import`
//! rules as-is, since the pipeline only follows one level of references.

use cssparser::{serialize_identifier, serialize_string, ParseError, Parser, ParserInput, Token};
use std::path::Path;

use crate::assets::{encode_image_file, locate_asset, AssetKind, AssetResolution};
use crate::core::has_image_extension;

/// Counts and warnings produced by one stylesheet rewrite
#[derive(Debug, Default)]
pub struct CssRewriteOutcome {
    pub images_encoded: usize,
    pub warnings: Vec<String>,
}

/// Rewrites local image references inside stylesheet text
///
/// Returns the rewritten stylesheet together with the rewrite outcome.
/// The input comes back unchanged when it contains no local image
/// references.
pub fn rewrite_css_urls(source_root: &Path, css: &str) -> (String, CssRewriteOutcome) {
    let mut outcome = CssRewriteOutcome::default();
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);

    let rewritten = process_css(source_root, &mut parser, "", &mut outcome)
        .unwrap_or_else(|_| css.to_string());

    (rewritten, outcome)
}

/// Formats a CSS identifier, escaping special characters
pub fn format_ident(ident: &str) -> String {
    let mut res: String = "".to_string();
    let _ = serialize_identifier(ident, &mut res);
    res = res.trim_end().to_string();
    res
}

/// Formats a quoted CSS string, adding quotes and escaping as needed
pub fn format_quoted_string(string: &str) -> String {
    let mut res: String = "".to_string();
    let _ = serialize_string(string, &mut res);
    res
}

/// Walks CSS tokens, reconstructing the stylesheet with rewritten URLs
fn process_css(
    source_root: &Path,
    parser: &mut Parser,
    func_name: &str,
    outcome: &mut CssRewriteOutcome,
) -> Result<String, ParseError<'static, String>> {
    let mut result = String::new();

    loop {
        let token_offset = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        let token_result = match &token {
            // Keep comments as they appear in the source
            Token::Comment(_) => parser.slice_from(token_offset).to_string(),
            Token::Semicolon => ";".to_string(),
            Token::Colon => ":".to_string(),
            Token::Comma => ",".to_string(),
            Token::CloseParenthesis => ")".to_string(),
            Token::CloseSquareBracket => "]".to_string(),
            Token::CloseCurlyBracket => "}".to_string(),
            Token::IncludeMatch => "~=".to_string(),
            Token::DashMatch => "|=".to_string(),
            Token::PrefixMatch => "^=".to_string(),
            Token::SuffixMatch => "$=".to_string(),
            Token::SubstringMatch => "*=".to_string(),
            Token::CDO => "<!--".to_string(),
            Token::CDC => "-->".to_string(),
            Token::WhiteSpace(value) => value.to_string(),
            Token::Ident(value) => format_ident(value),
            Token::AtKeyword(value) => format!("@{}", value),
            Token::Hash(value) => format!("#{}", value),
            Token::IDHash(value) => format!("#{}", format_ident(value)),
            Token::QuotedString(value) => {
                if func_name == "url" {
                    match embed_image_reference(source_root, value, outcome) {
                        Some(data_url) => format_quoted_string(&data_url),
                        None => format_quoted_string(value),
                    }
                } else {
                    format_quoted_string(value)
                }
            }
            Token::Number {
                has_sign, value, ..
            } => {
                let mut number = String::new();
                if *has_sign && *value >= 0.0 {
                    number.push('+');
                }
                number.push_str(&value.to_string());
                number
            }
            Token::Percentage {
                has_sign,
                unit_value,
                ..
            } => {
                let mut percentage = String::new();
                if *has_sign && *unit_value >= 0.0 {
                    percentage.push('+');
                }
                percentage.push_str(&(unit_value * 100.0).to_string());
                percentage.push('%');
                percentage
            }
            Token::Dimension {
                has_sign,
                value,
                unit,
                ..
            } => {
                let mut dimension = String::new();
                if *has_sign && *value >= 0.0 {
                    dimension.push('+');
                }
                dimension.push_str(&value.to_string());
                dimension.push_str(unit);
                dimension
            }
            // url(value) without quotes
            Token::UnquotedUrl(value) => {
                if value.is_empty() {
                    "url()".to_string()
                } else if value.starts_with('#') {
                    format!("url({})", value)
                } else {
                    match embed_image_reference(source_root, value, outcome) {
                        Some(data_url) => format!("url({})", format_quoted_string(&data_url)),
                        None => format!("url({})", format_quoted_string(value)),
                    }
                }
            }
            Token::Delim(value) => value.to_string(),
            Token::ParenthesisBlock | Token::SquareBracketBlock | Token::CurlyBracketBlock => {
                let (open_char, close_char) = match &token {
                    Token::ParenthesisBlock => ('(', ')'),
                    Token::SquareBracketBlock => ('[', ']'),
                    _ => ('{', '}'),
                };

                let mut block = String::new();
                block.push(open_char);

                let block_css = parser
                    .parse_nested_block(|parser| {
                        process_css(source_root, parser, func_name, outcome)
                    })
                    .unwrap();
                block.push_str(&block_css);

                block.push(close_char);
                block
            }
            Token::Function(name) => {
                let function_name = name.to_string();
                let mut function = String::new();
                function.push_str(&function_name);
                function.push('(');

                let block_css = parser
                    .parse_nested_block(|parser| {
                        process_css(source_root, parser, &function_name, outcome)
                    })
                    .unwrap();
                function.push_str(&block_css);

                function.push(')');
                function
            }
            Token::BadUrl(_) | Token::BadString(_) => String::new(),
        };

        result.push_str(&token_result);
    }

    // Make sure empty CSS is really empty
    if !result.is_empty() && result.trim().is_empty() {
        result = result.trim().to_string();
    }

    Ok(result)
}

/// Resolves one url() value and encodes it when it is a local image
///
/// Returns the replacement `data:` URL, or `None` when the reference must
/// stay as-is: external URLs, non-image files, and unreadable or missing
/// files (the latter two leave a warning on the outcome).
fn embed_image_reference(
    source_root: &Path,
    value: &str,
    outcome: &mut CssRewriteOutcome,
) -> Option<String> {
    let asset = locate_asset(source_root, value, AssetKind::Image);

    match asset.resolution {
        AssetResolution::Resolved(path) => {
            if !has_image_extension(&path.to_string_lossy()) {
                return None;
            }

            match encode_image_file(&path) {
                Ok(data_url) => {
                    outcome.images_encoded += 1;
                    Some(data_url.to_string())
                }
                Err(e) => {
                    outcome
                        .warnings
                        .push(format!("could not read image {}: {}", path.display(), e));
                    None
                }
            }
        }
        AssetResolution::Missing => {
            if has_image_extension(value.split(['?', '#']).next().unwrap_or(value)) {
                outcome.warnings.push(format!("image not found: {}", value));
            }
            None
        }
        AssetResolution::External => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn local_image_reference_is_embedded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("logo.png"), b"\x89PNG\x0d\x0a\x1a\x0apixels").unwrap();

        let css = "body { background: url(logo.png); }";
        let (rewritten, outcome) = rewrite_css_urls(dir.path(), css);

        assert!(rewritten.contains("data:image/png;base64,"));
        assert!(!rewritten.contains("url(logo.png)"));
        assert_eq!(outcome.images_encoded, 1);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn quoted_image_reference_is_embedded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("logo.png"), b"\x89PNG\x0d\x0a\x1a\x0apixels").unwrap();

        let css = r#"body { background-image: url("logo.png"); }"#;
        let (rewritten, outcome) = rewrite_css_urls(dir.path(), css);

        assert!(rewritten.contains("data:image/png;base64,"));
        assert_eq!(outcome.images_encoded, 1);
    }

    #[test]
    fn external_references_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let css = "body { background: url(https://example.com/bg.png); }";
        let (rewritten, outcome) = rewrite_css_urls(dir.path(), css);

        assert!(rewritten.contains("https://example.com/bg.png"));
        assert_eq!(outcome.images_encoded, 0);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn data_uri_references_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let css = "body { background: url(data:image/gif;base64,R0lGOD); }";
        let (rewritten, outcome) = rewrite_css_urls(dir.path(), css);

        assert!(rewritten.contains("data:image/gif;base64,R0lGOD"));
        assert_eq!(outcome.images_encoded, 0);
    }

    #[test]
    fn missing_image_keeps_reference_and_warns() {
        let dir = tempfile::tempdir().unwrap();
        let css = "body { background: url(gone.png); }";
        let (rewritten, outcome) = rewrite_css_urls(dir.path(), css);

        assert!(rewritten.contains("gone.png"));
        assert_eq!(outcome.images_encoded, 0);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("gone.png"));
    }

    #[test]
    fn fragment_only_url_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let css = "rect { mask: url(#clip); }";
        let (rewritten, _outcome) = rewrite_css_urls(dir.path(), css);

        assert!(rewritten.contains("url(#clip)"));
    }

    #[test]
    fn non_image_local_files_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("font.woff2"), b"wOF2").unwrap();

        let css = "@font-face { src: url(font.woff2); }";
        let (rewritten, outcome) = rewrite_css_urls(dir.path(), css);

        assert!(rewritten.contains("font.woff2"));
        assert_eq!(outcome.images_encoded, 0);
    }

    #[test]
    fn comments_survive_the_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let css = "/* banner */ body { color: red; }";
        let (rewritten, _outcome) = rewrite_css_urls(dir.path(), css);

        assert!(rewritten.contains("/* banner */"));
    }

    #[test]
    fn query_suffixed_reference_resolves() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bg.gif"), b"GIF89a....").unwrap();

        let css = "div { background: url(bg.gif?v=2); }";
        let (rewritten, outcome) = rewrite_css_urls(dir.path(), css);

        assert!(rewritten.contains("data:image/gif;base64,"));
        assert_eq!(outcome.images_encoded, 1);
    }
}
