//! Asset inlining
//!
//! Three sub-stages with the same shape: find references of one kind,
//! resolve each through the asset locator, read the content, and splice it
//! into the document while removing the original reference element.
//!
//! Ordering matters: stylesheets first (they may reference images that
//! must still resolve against the source tree), then scripts, then images.
//! External references survive every sub-stage untouched, and a missing or
//! unreadable asset degrades to a warning with the original reference left
//! in place.

use std::fs;
use std::path::Path;

use markup5ever_rcdom::{Handle, RcDom};

use crate::assets::{encode_image_file, locate_asset, AssetKind, AssetResolution};
use crate::parsers::css::rewrite_css_urls;
use crate::parsers::html::{
    append_child, create_element_with_text, find_nodes, get_node_attr, remove_nodes, set_node_attr,
};

/// Counts and warnings produced by one inlining sub-stage
#[derive(Debug, Default)]
pub struct InlineOutcome {
    pub files_inlined: usize,
    pub images_encoded: usize,
    pub warnings: Vec<String>,
}

/// Wraps file content in a boundary comment so the combined block stays
/// traceable back to its source files
fn file_boundary_block(file_name: &str, content: &str) -> String {
    format!("\n/* === {} === */\n{}\n", file_name, content)
}

/// Inlines every local stylesheet into one embedded style block
///
/// Image references inside each stylesheet are rewritten to `data:` URLs
/// before concatenation. The combined block is appended to the document
/// head; the original link elements are removed by node identity.
pub fn inline_stylesheets(dom: &RcDom, source_root: &Path) -> InlineOutcome {
    let mut outcome = InlineOutcome::default();
    let mut combined_css = String::new();
    let mut doomed: Vec<Handle> = Vec::new();

    for link_node in find_nodes(&dom.document, vec!["html", "link"]).iter() {
        let rel = get_node_attr(link_node, "rel").unwrap_or_default();
        if !rel
            .to_lowercase()
            .split_whitespace()
            .any(|value| value == "stylesheet")
        {
            continue;
        }

        let href = match get_node_attr(link_node, "href") {
            Some(href) if !href.is_empty() => href,
            _ => continue,
        };

        let asset = locate_asset(source_root, &href, AssetKind::Stylesheet);
        match asset.resolution {
            AssetResolution::Resolved(path) => match fs::read_to_string(&path) {
                Ok(css) => {
                    let (rewritten, css_outcome) = rewrite_css_urls(source_root, &css);
                    outcome.images_encoded += css_outcome.images_encoded;
                    outcome.warnings.extend(css_outcome.warnings);

                    let file_name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_else(|| href.clone());
                    combined_css.push_str(&file_boundary_block(&file_name, &rewritten));

                    doomed.push(link_node.clone());
                    outcome.files_inlined += 1;
                }
                Err(e) => {
                    outcome
                        .warnings
                        .push(format!("could not read stylesheet {}: {}", path.display(), e));
                }
            },
            AssetResolution::Missing => {
                outcome
                    .warnings
                    .push(format!("stylesheet not found: {}", href));
            }
            AssetResolution::External => {}
        }
    }

    if !combined_css.is_empty() {
        let style_node = create_element_with_text(dom, "style", &combined_css);
        if let Some(head_node) = find_nodes(&dom.document, vec!["html", "head"]).first() {
            append_child(head_node, &style_node);
        }
    }

    remove_nodes(&dom.document, &doomed);

    outcome
}

/// Inlines every local script into one embedded script block
///
/// CDN references (absolute `https://` URLs) always survive untouched.
/// The combined block is appended to the end of the document body; the
/// original script elements are removed by node identity.
pub fn inline_scripts(dom: &RcDom, source_root: &Path) -> InlineOutcome {
    let mut outcome = InlineOutcome::default();
    let mut combined_js = String::new();
    let mut doomed: Vec<Handle> = Vec::new();

    for script_node in find_nodes(&dom.document, vec!["html", "script"]).iter() {
        let src = match get_node_attr(script_node, "src") {
            Some(src) if !src.is_empty() => src,
            _ => continue,
        };

        let asset = locate_asset(source_root, &src, AssetKind::Script);
        match asset.resolution {
            AssetResolution::Resolved(path) => match fs::read_to_string(&path) {
                Ok(js) => {
                    let file_name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_else(|| src.clone());
                    // Escape closing script tags so the embedded code cannot
                    // terminate the combined block early
                    let escaped = js.replace("</script>", "<\\/script>");
                    combined_js.push_str(&file_boundary_block(&file_name, &escaped));

                    doomed.push(script_node.clone());
                    outcome.files_inlined += 1;
                }
                Err(e) => {
                    outcome
                        .warnings
                        .push(format!("could not read script {}: {}", path.display(), e));
                }
            },
            AssetResolution::Missing => {
                outcome.warnings.push(format!("script not found: {}", src));
            }
            AssetResolution::External => {}
        }
    }

    if !combined_js.is_empty() {
        let script_node = create_element_with_text(dom, "script", &combined_js);
        if let Some(body_node) = find_nodes(&dom.document, vec!["html", "body"]).first() {
            append_child(body_node, &script_node);
        }
    }

    remove_nodes(&dom.document, &doomed);

    outcome
}

/// Replaces every local image reference in markup with its encoded form
///
/// External and already-embedded references pass through; a missing or
/// unreadable image keeps its original reference and leaves a warning.
pub fn inline_images(dom: &RcDom, source_root: &Path) -> InlineOutcome {
    let mut outcome = InlineOutcome::default();

    for img_node in find_nodes(&dom.document, vec!["html", "img"]).iter() {
        let src = match get_node_attr(img_node, "src") {
            Some(src) if !src.is_empty() => src,
            _ => continue,
        };

        let asset = locate_asset(source_root, &src, AssetKind::Image);
        match asset.resolution {
            AssetResolution::Resolved(path) => match encode_image_file(&path) {
                Ok(data_url) => {
                    set_node_attr(img_node, "src", Some(data_url.to_string()));
                    outcome.images_encoded += 1;
                }
                Err(e) => {
                    outcome
                        .warnings
                        .push(format!("could not read image {}: {}", path.display(), e));
                }
            },
            AssetResolution::Missing => {
                outcome.warnings.push(format!("image not found: {}", src));
            }
            AssetResolution::External => {}
        }
    }

    outcome
}
