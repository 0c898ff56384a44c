//! Document metadata handling
//!
//! Reads the metadata the pipeline cares about (charset declaration,
//! document title) and produces the build stamp comment that gets
//! embedded into every finished artifact.

use chrono::{DateTime, Local};
use markup5ever_rcdom::{Handle, NodeData};

use crate::core::{parse_content_type, BundleStats};

use super::dom::{find_nodes, get_node_attr};

/// Gets the document's declared character encoding
///
/// Supports both forms:
/// 1. HTML5: `<meta charset="utf-8">`
/// 2. HTML4: `<meta http-equiv="content-type" content="text/html; charset=utf-8">`
pub fn get_charset(node: &Handle) -> Option<String> {
    for meta_node in find_nodes(node, vec!["html", "head", "meta"]).iter() {
        if let Some(meta_charset_node_attr_value) = get_node_attr(meta_node, "charset") {
            return Some(meta_charset_node_attr_value);
        }

        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            if let Some(meta_content_type_node_attr_value) = get_node_attr(meta_node, "content") {
                let (_media_type, charset, _is_base64) =
                    parse_content_type(&meta_content_type_node_attr_value);
                return Some(charset);
            }
        }
    }

    None
}

/// Gets the text of the document's first TITLE element
pub fn get_title(node: &Handle) -> Option<String> {
    for title_node in find_nodes(node, vec!["html", "head", "title"]).iter() {
        for child_node in title_node.children.borrow().iter() {
            if let NodeData::Text { ref contents } = child_node.data {
                return Some(contents.borrow().to_string());
            }
        }
    }

    None
}

/// Creates the build stamp comment
///
/// One HTML comment carrying the application version, the formatted build
/// time, and every statistic the pipeline stages collected. The stamper
/// inserts it after the head-open tag once minification is done.
pub fn create_build_stamp(
    app_version: &str,
    build_time: &DateTime<Local>,
    stats: &BundleStats,
) -> String {
    format!(
        "<!--\n\
        Generated by {} v{}\n\
        Version: {}\n\
        Built: {}\n\
        CSS files inlined: {}\n\
        JS files inlined: {}\n\
        Images encoded: {}\n\
        PWA references removed: {}\n\
        Test references removed: {}\n\
        This file is generated; edit the source tree and rebuild instead.\n\
        -->",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        app_version,
        build_time.format("%Y-%m-%d %H:%M:%S"),
        stats.css_files_inlined,
        stats.js_files_inlined,
        stats.images_encoded,
        stats.pwa_refs_removed,
        stats.test_refs_removed,
    )
}
