//! Data structures shared across the bundling pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Kind of asset referenced by an HTML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    /// A `<link rel="stylesheet">` reference.
    Stylesheet,
    /// A `<script src>` reference.
    Script,
}

/// A single asset reference discovered in an HTML document.
///
/// References are ordered by first appearance in the source text, tracked
/// separately per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    /// Whether the reference is a stylesheet or a script.
    pub kind: AssetKind,
    /// The `href` or `src` value exactly as written in the document.
    pub url: String,
    /// The matched opening tag span, kept for mismatch diagnostics.
    pub raw_tag: String,
}

/// Kind of entry point derived from its source file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// An HTML document entry, bundled through the two-phase pipeline.
    Html,
    /// A standalone JavaScript package entry.
    Js,
    /// A stylesheet entry. Accepted but not yet handled.
    Css,
    /// Anything else; skipped with a warning.
    Unknown,
}

impl EntryKind {
    /// Classify an entry by the extension of its source path.
    pub fn from_src(src: &str) -> Self {
        if src.ends_with(".html") {
            EntryKind::Html
        } else if src.ends_with(".js") {
            EntryKind::Js
        } else if src.ends_with(".css") {
            EntryKind::Css
        } else {
            EntryKind::Unknown
        }
    }
}

/// A named build unit with a source file and destination output path.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    /// Logical entry name, also the prefix of its hashed artifacts.
    pub name: String,
    /// Path to the source file.
    pub src: String,
    /// Output path relative to the output root.
    pub dest: String,
}

impl EntryPoint {
    /// Kind of this entry, derived from the source extension.
    pub fn kind(&self) -> EntryKind {
        EntryKind::from_src(&self.src)
    }
}

/// Ephemeral require-everything module synthesized for one HTML entry.
///
/// Lives in the temp working area for the duration of a single orchestration
/// run and is deleted when the run ends, whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct SynthesizedEntryFile {
    /// Location of the file within the temp working area.
    pub path: PathBuf,
    /// Concatenated require statements for every scanned reference.
    pub contents: String,
}

impl SynthesizedEntryFile {
    /// Write the synthesized contents to disk.
    pub fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, &self.contents)
            .with_context(|| format!("failed to write entry file {}", self.path.display()))
    }
}

/// An HTML document in its post-sanitize and post-injection forms.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    /// Logical entry name the document belongs to.
    pub name: String,
    /// Document with every scanned asset tag removed.
    pub emptied_html: String,
    /// Emptied document plus the injected hashed-artifact tags.
    pub final_html: String,
}

/// A hashed output file located by name-prefix scan of the output directory.
///
/// Artifacts are discovered purely from existing filenames, never from a
/// bundler manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedArtifact {
    /// Logical entry name whose bundle produced the artifact.
    pub entry_name: String,
    /// Whether the artifact is a stylesheet or a script.
    pub kind: AssetKind,
    /// URL under which the artifact is served.
    pub public_url: String,
}

/// Convert an output-relative artifact path into a public URL.
pub fn to_public_url(public_path: &str, relative: &Path) -> String {
    format!(
        "{}/{}",
        public_path.trim_end_matches('/'),
        relative.to_string_lossy().replace('\\', "/")
    )
}
