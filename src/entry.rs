//! Synthetic bundler entry files generated from scanned HTML documents.

use std::path::Path;

use crate::models::SynthesizedEntryFile;
use crate::scan::scan_asset_references;

/// Fixed temp working directory for synthesized entry files.
pub const TEMP_DIR: &str = ".build";

/// Concatenated `require("<url>");` statements for every asset reference in
/// the document, all stylesheets before all scripts, each kind in scan order,
/// with no separators between statements.
pub fn build_entry_contents(html: &str) -> String {
    scan_asset_references(html)
        .iter()
        .map(|reference| format!("require(\"{}\");", reference.url))
        .collect()
}

/// Flatten an entry source path into a single file name: strip one leading
/// `.`, strip one leading `/`, then map `/` to `_` and spaces to `-`.
fn entry_file_stem(src: &str) -> String {
    let stripped = src.strip_prefix('.').unwrap_or(src);
    let stripped = stripped.strip_prefix('/').unwrap_or(stripped);
    stripped.replace('/', "_").replace(' ', "-")
}

/// Deterministic temp file name for an entry source path.
///
/// Two distinct source paths in one entry set must not collide under this
/// transform; it is not formally collision-free for pathological inputs.
pub fn build_entry_file_name(src: &str) -> String {
    format!("{TEMP_DIR}/{}", entry_file_stem(src))
}

/// Synthesize the require-everything module for an HTML entry, rooted at the
/// given temp working directory.
///
/// Content generation is pure; writing is a separate step via
/// [`SynthesizedEntryFile::write`].
pub fn synthesize(temp_dir: &Path, src: &str, html: &str) -> SynthesizedEntryFile {
    SynthesizedEntryFile {
        path: temp_dir.join(entry_file_stem(src)),
        contents: build_entry_contents(html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn entry_contents_require_stylesheets_before_scripts() {
        let html = concat!(
            "<head><link rel=\"stylesheet\" href=\"a.css\"></head>",
            "<body><script src=\"b.js\"></script></body>"
        );
        assert_eq!(build_entry_contents(html), "require(\"a.css\");require(\"b.js\");");
    }

    #[test]
    fn entry_contents_empty_for_documents_without_references() {
        assert_eq!(build_entry_contents("<head></head><body></body>"), "");
    }

    #[test]
    fn file_name_flattens_the_source_path() {
        assert_eq!(
            build_entry_file_name("./src/dashboard/index.html"),
            ".build/src_dashboard_index.html"
        );
    }

    #[test]
    fn file_name_strips_one_leading_dot_and_slash_only() {
        assert_eq!(build_entry_file_name("/src/index.html"), ".build/src_index.html");
        assert_eq!(build_entry_file_name("src/index.html"), ".build/src_index.html");
    }

    #[test]
    fn file_name_replaces_spaces_with_dashes() {
        assert_eq!(
            build_entry_file_name("./src/my page/index.html"),
            ".build/src_my-page_index.html"
        );
    }

    #[test]
    fn synthesized_file_writes_to_the_temp_dir() {
        let dir = tempdir().unwrap();
        let html = r#"<head><link rel="stylesheet" href="a.css"></head>"#;

        let synthesized = synthesize(dir.path(), "./src/index.html", html);
        synthesized.write().unwrap();

        let written = fs::read_to_string(dir.path().join("src_index.html")).unwrap();
        assert_eq!(written, "require(\"a.css\");");
    }
}
