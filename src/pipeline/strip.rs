//! Reference stripping
//!
//! Removes two classes of references before anything is inlined:
//!
//! 1. **Test references** - script elements whose source path contains one
//!    of [`TEST_MARKER_SUBSTRINGS`].
//! 2. **Distribution metadata** - the four fragment classes that declare
//!    installable-web-app capabilities: app-manifest link elements,
//!    touch-icon link elements, service-worker registration statements,
//!    and manifest-fetch statements inside inline scripts.
//!
//! Both policies are static configuration; they are exported so the
//! contract is visible to callers. Stripping has to run before inlining:
//! once a script is embedded its source path is gone, and nothing could
//! match it anymore.

use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;

use crate::parsers::html::{find_nodes, get_node_attr, remove_nodes};

/// Source-path substrings identifying test-only scripts
pub const TEST_MARKER_SUBSTRINGS: &[&str] = &[
    "test",
    "quick-test",
    "version-verification",
    "voice-delete-integration",
];

/// Link rel values identifying installable-app metadata
pub const PWA_LINK_REL_VALUES: &[&str] = &["manifest", "apple-touch-icon"];

/// Counts produced by the stripping stage
#[derive(Debug, Default)]
pub struct StripOutcome {
    pub test_refs_removed: usize,
    pub pwa_refs_removed: usize,
}

/// Removes test-only and distribution-metadata references in one pass
pub fn strip_excluded_references(dom: &RcDom) -> StripOutcome {
    let mut outcome = StripOutcome::default();
    let mut doomed: Vec<Handle> = Vec::new();

    // Script elements referencing test-only files
    for script_node in find_nodes(&dom.document, vec!["html", "script"]).iter() {
        if let Some(src) = get_node_attr(script_node, "src") {
            if TEST_MARKER_SUBSTRINGS
                .iter()
                .any(|marker| src.contains(marker))
            {
                doomed.push(script_node.clone());
                outcome.test_refs_removed += 1;
            }
        }
    }

    // Link elements declaring installable-app metadata
    for link_node in find_nodes(&dom.document, vec!["html", "link"]).iter() {
        let rel = get_node_attr(link_node, "rel").unwrap_or_default();
        if rel
            .to_lowercase()
            .split_whitespace()
            .any(|value| PWA_LINK_REL_VALUES.contains(&value))
        {
            doomed.push(link_node.clone());
            outcome.pwa_refs_removed += 1;
        }
    }

    remove_nodes(&dom.document, &doomed);

    // Service-worker registration and manifest-fetch statements live inside
    // inline script text, below element granularity
    outcome.pwa_refs_removed += strip_pwa_statements(dom);

    outcome
}

/// Removes service-worker and manifest-fetch statements from inline scripts
///
/// Returns how many statements were removed.
fn strip_pwa_statements(dom: &RcDom) -> usize {
    let statement_patterns = [
        Regex::new(r"navigator\.serviceWorker\.register\([^)]*\)[^;]*;?").unwrap(),
        Regex::new(r#"fetch\(\s*["'][^"']*manifest\.json["'][^)]*\)[^;]*;?"#).unwrap(),
    ];

    let mut removed = 0;

    for script_node in find_nodes(&dom.document, vec!["html", "script"]).iter() {
        if get_node_attr(script_node, "src").is_some() {
            continue;
        }

        for child_node in script_node.children.borrow().iter() {
            if let NodeData::Text { ref contents } = child_node.data {
                let mut tendril = contents.borrow_mut();
                let mut text = tendril.to_string();
                let mut changed = false;

                for pattern in &statement_patterns {
                    let matches = pattern.find_iter(&text).count();
                    if matches > 0 {
                        removed += matches;
                        text = pattern.replace_all(&text, "").to_string();
                        changed = true;
                    }
                }

                if changed {
                    tendril.clear();
                    tendril.push_slice(&text);
                }
            }
        }
    }

    removed
}
