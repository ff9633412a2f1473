//! Two-stage pattern scanning for asset references in raw HTML text.
//!
//! The first stage locates tag-opening spans (from `<tagname` to the next
//! `>`); the second extracts the first quoted occurrence of the target
//! attribute within that span. This is deliberately not an HTML parser: a
//! `>` embedded in an attribute value truncates the span. Patterns are built
//! fresh per call, so repeated scans never skip matches.

use regex::Regex;
use tracing::debug;

use crate::models::{AssetKind, AssetReference};

/// Pattern matching a tag-opening span from `<name` to the next `>`.
fn tag_pattern(name: &str) -> Regex {
    Regex::new(&format!("(<{name})[^>]+>")).expect("invalid tag regex")
}

/// Pattern matching a double-quoted attribute value.
fn attr_pattern(name: &str) -> Regex {
    Regex::new(&format!(r#"{name}="([^"]+)""#)).expect("invalid attribute regex")
}

/// First quoted occurrence of a named attribute within a tag span, if any.
pub(crate) fn first_quoted_attr(name: &str, span: &str) -> Option<String> {
    first_attr(&attr_pattern(name), span)
}

fn first_attr(pattern: &Regex, span: &str) -> Option<String> {
    pattern
        .captures(span)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn references(html: &str, tag: &str, attr: &str, kind: AssetKind) -> Vec<AssetReference> {
    let tag_re = tag_pattern(tag);
    let attr_re = attr_pattern(attr);
    let rel_re = attr_pattern("rel");

    tag_re
        .find_iter(html)
        .filter(|span| {
            kind != AssetKind::Stylesheet
                || first_attr(&rel_re, span.as_str()).is_some_and(|rel| rel == "stylesheet")
        })
        .filter_map(|span| match first_attr(&attr_re, span.as_str()) {
            Some(url) => Some(AssetReference {
                kind,
                url,
                raw_tag: span.as_str().to_string(),
            }),
            None => {
                debug!(tag = span.as_str(), "tag without quoted {attr}, skipping");
                None
            }
        })
        .collect()
}

/// Ordered `href` values of every `<link>` tag whose first quoted `rel`
/// attribute equals exactly `stylesheet`.
///
/// Links without that exact `rel` are excluded even when an `href` is
/// present. A missing or malformed quoted `href` yields nothing for that tag.
pub fn extract_stylesheets(html: &str) -> Vec<String> {
    references(html, "link", "href", AssetKind::Stylesheet)
        .into_iter()
        .map(|reference| reference.url)
        .collect()
}

/// Ordered `src` values of every `<script>` tag, regardless of other
/// attributes.
///
/// Inline scripts without a quoted `src` yield nothing.
pub fn extract_scripts(html: &str) -> Vec<String> {
    references(html, "script", "src", AssetKind::Script)
        .into_iter()
        .map(|reference| reference.url)
        .collect()
}

/// Every asset reference in the document, stylesheets first, each kind in
/// scan order.
pub fn scan_asset_references(html: &str) -> Vec<AssetReference> {
    let mut refs = references(html, "link", "href", AssetKind::Stylesheet);
    refs.extend(references(html, "script", "src", AssetKind::Script));
    refs
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = concat!(
        "<head><link rel=\"stylesheet\" href=\"a.css\"></head>",
        "<body><script src=\"b.js\"></script></body>"
    );

    #[test]
    fn extracts_stylesheet_hrefs_and_script_srcs() {
        assert_eq!(extract_stylesheets(DOCUMENT), vec!["a.css"]);
        assert_eq!(extract_scripts(DOCUMENT), vec!["b.js"]);
    }

    #[test]
    fn repeated_scans_never_skip_matches() {
        assert_eq!(extract_stylesheets(DOCUMENT), extract_stylesheets(DOCUMENT));
        assert_eq!(extract_scripts(DOCUMENT), extract_scripts(DOCUMENT));
    }

    #[test]
    fn links_without_stylesheet_rel_are_excluded() {
        let html = r#"<link rel="preload" href="a.css"><link rel="stylesheet" href="b.css">"#;
        assert_eq!(extract_stylesheets(html), vec!["b.css"]);
    }

    #[test]
    fn first_quoted_rel_occurrence_decides_inclusion() {
        // Only the first rel occurrence within the span is consulted.
        let html = r#"<link rel="preload" rel="stylesheet" href="a.css">"#;
        assert!(extract_stylesheets(html).is_empty());
    }

    #[test]
    fn tags_with_missing_quoted_attributes_are_filtered() {
        let html = r#"<link rel="stylesheet"><script type="module"></script>"#;
        assert!(extract_stylesheets(html).is_empty());
        assert!(extract_scripts(html).is_empty());
    }

    #[test]
    fn preserves_first_seen_order_per_kind() {
        let html = concat!(
            "<script src=\"one.js\"></script>",
            "<link rel=\"stylesheet\" href=\"one.css\">",
            "<script src=\"two.js\"></script>",
            "<link rel=\"stylesheet\" href=\"two.css\">",
        );
        assert_eq!(extract_stylesheets(html), vec!["one.css", "two.css"]);
        assert_eq!(extract_scripts(html), vec!["one.js", "two.js"]);

        let refs = scan_asset_references(html);
        let urls: Vec<&str> = refs.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["one.css", "two.css", "one.js", "two.js"]);
    }

    #[test]
    fn raw_tag_spans_cover_the_whole_opening_tag() {
        let refs = scan_asset_references(DOCUMENT);
        assert_eq!(refs[0].raw_tag, r#"<link rel="stylesheet" href="a.css">"#);
        assert_eq!(refs[1].raw_tag, r#"<script src="b.js">"#);
    }
}
