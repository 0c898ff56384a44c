//! Minification
//!
//! Runs only after every reference has been inlined, in two steps:
//! comment nodes are dropped from the DOM unless they carry a
//! preservation marker, and after serialization the document text has its
//! blank-line runs, horizontal whitespace runs, and per-line padding
//! collapsed.
//!
//! The text pass does not special-case embedded style or script blocks;
//! whitespace inside multi-line string literals in embedded script is
//! collapsed along with everything else. Line comments survive because
//! newlines are kept.

use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;

use crate::parsers::html::remove_nodes;

/// Removes HTML comment nodes, keeping those that carry a marker
///
/// Returns how many comments were dropped.
pub fn remove_comments(dom: &RcDom, preserve_markers: &[String]) -> usize {
    let mut doomed: Vec<Handle> = Vec::new();
    collect_comment_nodes(&dom.document, preserve_markers, &mut doomed);

    let removed = doomed.len();
    remove_nodes(&dom.document, &doomed);
    removed
}

fn collect_comment_nodes(node: &Handle, preserve_markers: &[String], doomed: &mut Vec<Handle>) {
    for child_node in node.children.borrow().iter() {
        if let NodeData::Comment { ref contents } = child_node.data {
            let comment_text = contents.to_string();
            if !preserve_markers
                .iter()
                .any(|marker| comment_text.contains(marker.as_str()))
            {
                doomed.push(child_node.clone());
            }
        }

        collect_comment_nodes(child_node, preserve_markers, doomed);
    }
}

/// Collapses redundant whitespace in serialized document text
///
/// Runs of blank lines become one newline, runs of spaces and tabs become
/// one space, every line is trimmed, and lines left empty are dropped.
pub fn collapse_whitespace(html: &str) -> String {
    let blank_lines = Regex::new(r"\n\s*\n").unwrap();
    let horizontal_runs = Regex::new(r"[ \t]+").unwrap();

    let collapsed = blank_lines.replace_all(html, "\n");
    let collapsed = horizontal_runs.replace_all(&collapsed, " ");

    collapsed
        .split('\n')
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<&str>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{html_to_dom, serialize_document};

    fn markers() -> Vec<String> {
        vec!["@preserve".to_string(), "@license".to_string()]
    }

    #[test]
    fn plain_comments_are_removed() {
        let dom = html_to_dom(
            b"<html><head><!-- build note --></head><body><!-- layout hack --><p>text</p></body></html>",
            "utf-8".to_string(),
        );

        let removed = remove_comments(&dom, &markers());
        assert_eq!(removed, 2);

        let html = serialize_document(&dom);
        assert!(!html.contains("build note"));
        assert!(!html.contains("layout hack"));
        assert!(html.contains("<p>text</p>"));
    }

    #[test]
    fn marked_comments_survive() {
        let dom = html_to_dom(
            b"<html><body><!-- @license MIT, keep this banner --><!-- scratch --></body></html>",
            "utf-8".to_string(),
        );

        let removed = remove_comments(&dom, &markers());
        assert_eq!(removed, 1);

        let html = serialize_document(&dom);
        assert!(html.contains("@license MIT, keep this banner"));
        assert!(!html.contains("scratch"));
    }

    #[test]
    fn whitespace_runs_collapse() {
        let input = "<div>\n\n\n   <p>a     b</p>\t\t<p>c</p>   \n\n<span>d</span>\n";
        let output = collapse_whitespace(input);

        assert_eq!(output, "<div>\n<p>a b</p> <p>c</p>\n<span>d</span>");
    }

    #[test]
    fn collapse_drops_blank_lines_only_lines() {
        let input = "a\n   \n\t\nb";
        let output = collapse_whitespace(input);
        assert_eq!(output, "a\nb");
    }

    #[test]
    fn collapse_is_idempotent() {
        let input = "<p>a   b</p>\n\n\n<p>c</p>";
        let once = collapse_whitespace(input);
        let twice = collapse_whitespace(&once);
        assert_eq!(once, twice);
    }
}
