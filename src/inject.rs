//! Post-build rewriting of destination HTML with hashed artifact tags.
//!
//! Runs once per HTML entry after the bundler finishes the phase that
//! produced the final document. The string transforms are pure; all reads and
//! writes live in [`run_post_build`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;

use crate::models::{
    AssetKind, AssetReference, HashedArtifact, ProcessedDocument, to_public_url,
};
use crate::sanitize::remove_asset_tags;

/// Disposable output file produced while resolving in-HTML static assets.
pub const PLACEHOLDER_FILE: &str = "delete_me.js";

const CSS_ARTIFACT_DIR: &str = "assets/css";
const JS_ARTIFACT_DIR: &str = "assets/js";

/// Fatal injection failures for a single HTML entry.
#[derive(Debug, Error)]
pub enum InjectError {
    /// The bundler did not write the destination HTML file.
    #[error("destination file missing at {0}")]
    MissingDestination(PathBuf),
    /// The document lacks a `</head>` or `</body>` insertion marker.
    #[error("insertion marker {0} not found in document")]
    MissingMarker(&'static str),
}

/// Injector inputs captured at configuration time for one HTML entry.
///
/// The references are the ones scanned from the original source document, not
/// re-scanned from the bundler's output.
#[derive(Debug, Clone)]
pub struct PostBuildHook {
    /// Logical entry name, used as the artifact name prefix.
    pub entry_name: String,
    /// Destination HTML path relative to the output root.
    pub dest: String,
    /// Asset references scanned from the source document.
    pub references: Vec<AssetReference>,
}

/// Stylesheet link tag for a public URL.
pub fn to_link_tag(url: &str) -> String {
    format!("<link rel=\"stylesheet\" href=\"{url}\">")
}

/// Script tag for a public URL.
pub fn to_script_tag(url: &str) -> String {
    format!("<script src=\"{url}\"></script>")
}

/// Insert a string immediately before the first occurrence of the marker.
pub fn insert_before(
    marker: &'static str,
    insertion: &str,
    html: &str,
) -> Result<String, InjectError> {
    let index = html.find(marker).ok_or(InjectError::MissingMarker(marker))?;
    let mut result = String::with_capacity(html.len() + insertion.len());
    result.push_str(&html[..index]);
    result.push_str(insertion);
    result.push_str(&html[index..]);
    Ok(result)
}

/// Locate hashed artifacts for one entry by name prefix under the fixed
/// stylesheet and script subpaths of the output directory.
///
/// Result order is whatever the directory scan yields; it is not normalized.
/// A missing subdirectory contributes no artifacts and is not an error.
pub fn discover_hashed_artifacts(
    output_path: &Path,
    public_path: &str,
    entry_name: &str,
) -> Result<Vec<HashedArtifact>> {
    let mut artifacts = Vec::new();
    collect_prefixed(
        output_path,
        CSS_ARTIFACT_DIR,
        entry_name,
        ".css",
        AssetKind::Stylesheet,
        public_path,
        &mut artifacts,
    )?;
    collect_prefixed(
        output_path,
        JS_ARTIFACT_DIR,
        entry_name,
        ".js",
        AssetKind::Script,
        public_path,
        &mut artifacts,
    )?;
    Ok(artifacts)
}

fn collect_prefixed(
    output_path: &Path,
    subdir: &str,
    prefix: &str,
    extension: &str,
    kind: AssetKind,
    public_path: &str,
    artifacts: &mut Vec<HashedArtifact>,
) -> Result<()> {
    let dir = output_path.join(subdir);
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(&dir)
        .with_context(|| format!("failed to read artifact directory {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };

        if name.starts_with(prefix) && name.ends_with(extension) {
            let relative = Path::new(subdir).join(name);
            artifacts.push(HashedArtifact {
                entry_name: prefix.to_string(),
                kind,
                public_url: to_public_url(public_path, &relative),
            });
        }
    }

    Ok(())
}

/// Sanitize an entry's destination HTML against its configuration-time
/// references and inject tags for the discovered artifacts.
///
/// The stylesheet block goes immediately before the first `</head>`, the
/// script block immediately before the first `</body>`. Zero artifacts is
/// valid and produces empty blocks.
pub fn rewrite_document(
    name: &str,
    html: &str,
    references: &[AssetReference],
    artifacts: &[HashedArtifact],
) -> Result<ProcessedDocument, InjectError> {
    let emptied_html = remove_asset_tags(html, references);

    let link_block: String = artifacts
        .iter()
        .filter(|artifact| artifact.kind == AssetKind::Stylesheet)
        .map(|artifact| to_link_tag(&artifact.public_url))
        .collect();
    let script_block: String = artifacts
        .iter()
        .filter(|artifact| artifact.kind == AssetKind::Script)
        .map(|artifact| to_script_tag(&artifact.public_url))
        .collect();

    let with_links = insert_before("</head>", &link_block, &emptied_html)?;
    let final_html = insert_before("</body>", &script_block, &with_links)?;

    Ok(ProcessedDocument {
        name: name.to_string(),
        emptied_html,
        final_html,
    })
}

/// Apply the injector to one finished HTML entry.
///
/// Deletes the phase's placeholder output, reads the bundler-written
/// destination file, rewrites it and overwrites the destination in place.
pub fn run_post_build(hook: &PostBuildHook, output_path: &Path, public_path: &str) -> Result<()> {
    let placeholder = output_path.join(PLACEHOLDER_FILE);
    match fs::remove_file(&placeholder) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to remove placeholder {}", placeholder.display()));
        }
    }

    let dest = output_path.join(&hook.dest);
    if !dest.is_file() {
        return Err(InjectError::MissingDestination(dest).into());
    }
    let html =
        fs::read_to_string(&dest).with_context(|| format!("failed to read {}", dest.display()))?;

    let artifacts = discover_hashed_artifacts(output_path, public_path, &hook.entry_name)?;
    let document = rewrite_document(&hook.entry_name, &html, &hook.references, &artifacts)?;

    fs::write(&dest, &document.final_html)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    debug!(
        entry = hook.entry_name.as_str(),
        artifacts = artifacts.len(),
        "injected hashed assets"
    );
    Ok(())
}
