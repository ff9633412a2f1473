//! Removal of previously-scanned asset tags from an HTML document.

use regex::{Captures, Regex};
use tracing::warn;

use crate::models::{AssetKind, AssetReference};
use crate::scan::first_quoted_attr;

/// URL-specific removal pattern for one scanned reference.
///
/// The pattern is reconstructed from the reference's literal URL rather than
/// matching tags generically, so non-stylesheet links and src-less inline
/// scripts are never touched.
fn removal_pattern(reference: &AssetReference) -> Regex {
    let url = regex::escape(&reference.url);
    let pattern = match reference.kind {
        AssetKind::Stylesheet => format!(r#"<link[^>]+href="{url}"[^>]*>"#),
        AssetKind::Script => format!(r#"<script[^>]+src="{url}"[^>]*>[^<]*</script>"#),
    };
    Regex::new(&pattern).expect("invalid removal regex")
}

/// Remove the specific `<link>`/`<script>` elements matching each reference
/// previously scanned from the same document.
///
/// Every occurrence of a reference's tag form is removed. A tag whose live
/// attribute ordering or quoting differs from the scanned form is left in
/// place rather than failing; a warning is emitted when that happens.
pub fn remove_asset_tags(html: &str, references: &[AssetReference]) -> String {
    let mut result = html.to_string();
    for reference in references {
        let pattern = removal_pattern(reference);
        result = match reference.kind {
            // A non-stylesheet link may share the flagged href; only tags
            // whose first quoted rel is "stylesheet" are removed.
            AssetKind::Stylesheet => pattern
                .replace_all(&result, |caps: &Captures| {
                    let span = &caps[0];
                    if first_quoted_attr("rel", span).is_some_and(|rel| rel == "stylesheet") {
                        String::new()
                    } else {
                        span.to_string()
                    }
                })
                .into_owned(),
            AssetKind::Script => pattern.replace_all(&result, "").into_owned(),
        };
        if result.contains(&reference.raw_tag) {
            warn!(
                url = reference.url.as_str(),
                "asset tag left in place, markup differs from scanned form"
            );
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{extract_scripts, extract_stylesheets, scan_asset_references};

    #[test]
    fn removes_every_scanned_reference() {
        let html = concat!(
            "<head><link rel=\"stylesheet\" href=\"a.css\"></head>",
            "<body><script src=\"b.js\"></script></body>"
        );
        let refs = scan_asset_references(html);
        let emptied = remove_asset_tags(html, &refs);
        assert_eq!(emptied, "<head></head><body></body>");
    }

    #[test]
    fn sanitized_output_rescans_to_nothing() {
        let html = concat!(
            "<head>",
            "<link rel=\"stylesheet\" href=\"a.css\">",
            "<link rel=\"stylesheet\" href=\"b.css\">",
            "</head>",
            "<body>",
            "<script src=\"c.js\">var inline = 1;</script>",
            "<script src=\"d.js\"></script>",
            "</body>"
        );
        let refs = scan_asset_references(html);
        let emptied = remove_asset_tags(html, &refs);
        assert!(extract_stylesheets(&emptied).is_empty());
        assert!(extract_scripts(&emptied).is_empty());
    }

    #[test]
    fn non_stylesheet_links_survive_even_with_a_flagged_href() {
        let html = concat!(
            "<link rel=\"stylesheet\" href=\"a.css\">",
            "<link rel=\"preload\" href=\"a.css\">"
        );
        let refs = scan_asset_references(html);
        let emptied = remove_asset_tags(html, &refs);
        assert_eq!(emptied, r#"<link rel="preload" href="a.css">"#);
    }

    #[test]
    fn inline_scripts_without_src_are_untouched() {
        let html = concat!(
            "<script src=\"b.js\"></script>",
            "<script>var keep = true;</script>"
        );
        let refs = scan_asset_references(html);
        let emptied = remove_asset_tags(html, &refs);
        assert_eq!(emptied, "<script>var keep = true;</script>");
    }

    #[test]
    fn removal_is_global_across_duplicate_tags() {
        let html = concat!(
            "<script src=\"b.js\"></script>",
            "<p>between</p>",
            "<script src=\"b.js\"></script>"
        );
        let refs = scan_asset_references(html);
        let emptied = remove_asset_tags(html, &refs);
        assert_eq!(emptied, "<p>between</p>");
    }

    #[test]
    fn urls_with_regex_metacharacters_are_matched_literally() {
        let html = r#"<link rel="stylesheet" href="a+b.css">"#;
        let refs = scan_asset_references(html);
        assert_eq!(refs.len(), 1);
        let emptied = remove_asset_tags(html, &refs);
        assert_eq!(emptied, "");
    }
}
