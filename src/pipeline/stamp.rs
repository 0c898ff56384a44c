//! Build stamping
//!
//! Inserts the build-metadata comment produced by
//! [`crate::parsers::html::create_build_stamp`] immediately after the
//! document's head-open tag. Stamping runs last, after minification.
//!
//! Re-running the pipeline over an already-stamped artifact adds a second
//! stamp rather than replacing the first; a finished artifact is not
//! expected to be rebuilt.

use regex::Regex;

/// Inserts the stamp comment right after the head-open tag
///
/// Falls back to prepending when the document has no head tag at all.
pub fn insert_build_stamp(html: &str, stamp: &str) -> String {
    let head_open = Regex::new(r"(?i)<head[^>]*>").unwrap();

    match head_open.find(html) {
        Some(m) => {
            let mut stamped = String::with_capacity(html.len() + stamp.len() + 1);
            stamped.push_str(&html[..m.end()]);
            stamped.push('\n');
            stamped.push_str(stamp);
            stamped.push_str(&html[m.end()..]);
            stamped
        }
        None => format!("{}\n{}", stamp, html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_lands_after_head_open() {
        let html = "<!DOCTYPE html><html><head><title>t</title></head><body></body></html>";
        let stamped = insert_build_stamp(html, "<!-- stamp -->");

        let head_pos = stamped.find("<head>").unwrap();
        let stamp_pos = stamped.find("<!-- stamp -->").unwrap();
        let title_pos = stamped.find("<title>").unwrap();
        assert!(head_pos < stamp_pos);
        assert!(stamp_pos < title_pos);
    }

    #[test]
    fn stamp_handles_attributed_head_tags() {
        let html = r#"<html><head data-x="1"><title>t</title></head></html>"#;
        let stamped = insert_build_stamp(html, "<!-- stamp -->");
        assert!(stamped.contains("<head data-x=\"1\">\n<!-- stamp -->"));
    }

    #[test]
    fn headless_documents_get_the_stamp_prepended() {
        let stamped = insert_build_stamp("<p>bare</p>", "<!-- stamp -->");
        assert!(stamped.starts_with("<!-- stamp -->"));
        assert!(stamped.contains("<p>bare</p>"));
    }

    #[test]
    fn restamping_adds_a_second_stamp() {
        let html = "<html><head></head></html>";
        let once = insert_build_stamp(html, "<!-- stamp -->");
        let twice = insert_build_stamp(&once, "<!-- stamp -->");
        assert_eq!(twice.matches("<!-- stamp -->").count(), 2);
    }
}
