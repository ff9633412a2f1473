//! Project configuration describing entry points and output layout.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::models::EntryPoint;

const DEFAULT_CONFIG_FILE: &str = "bundle.config.json";

/// Source and destination paths for one named entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSpec {
    /// Path to the entry source file, ending in `.html`, `.js` or `.css`.
    pub src: String,
    /// Output path relative to the output root.
    pub dest: String,
}

/// Output location and public base path.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// Directory receiving every build output.
    pub path: String,
    /// Base URL prefix under which the output is served.
    pub public_path: String,
}

/// Static project configuration, read once per run and immutable after.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Mapping of logical entry name to source and destination paths.
    pub files: BTreeMap<String, FileSpec>,
    /// Output location and public base path.
    pub output: OutputConfig,
    /// Opaque loader rules forwarded to the bundler uninterpreted.
    #[serde(default)]
    pub loaders: Value,
    /// Opaque resolve settings forwarded to the bundler uninterpreted.
    #[serde(default)]
    pub resolve: Value,
    /// Accepted for forward compatibility; chunk splitting is not implemented.
    #[serde(default)]
    pub chunks: Option<Value>,
}

impl ProjectConfig {
    /// Read configuration from a specific JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Load `bundle.config.json` from the provided directory.
    pub fn discover(dir: &Path) -> Result<Self> {
        Self::from_path(&dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Entry points in name order.
    pub fn entry_points(&self) -> impl Iterator<Item = EntryPoint> + '_ {
        self.files.iter().map(|(name, spec)| EntryPoint {
            name: name.clone(),
            src: spec.src.clone(),
            dest: spec.dest.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;
    use tempfile::tempdir;

    const CONFIG_JSON: &str = r#"{
        "files": {
            "home": { "src": "./src/index.html", "dest": "index.html" },
            "dashboard": { "src": "./src/dashboard/index.html", "dest": "dashboard/index.html" },
            "package": { "src": "./src/package.js", "dest": "package.js" }
        },
        "output": { "path": "./dist", "publicPath": "/dist/" },
        "loaders": [{ "test": ".css", "loader": "css" }],
        "resolve": { "root": ["src"] },
        "chunks": { "common": ["home", "dashboard"] }
    }"#;

    #[test]
    fn parses_the_full_config_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, CONFIG_JSON).unwrap();

        let config = ProjectConfig::discover(dir.path()).unwrap();
        assert_eq!(config.output.path, "./dist");
        assert_eq!(config.output.public_path, "/dist/");
        assert!(config.loaders.is_array());
        assert!(config.chunks.is_some());

        let entries: Vec<EntryPoint> = config.entry_points().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].name, "home");
        assert_eq!(entries[1].kind(), EntryKind::Html);
        assert_eq!(entries[2].kind(), EntryKind::Js);
    }

    #[test]
    fn opaque_settings_default_to_null() {
        let minimal = r#"{
            "files": { "home": { "src": "./src/index.html", "dest": "index.html" } },
            "output": { "path": "./dist", "publicPath": "/dist/" }
        }"#;
        let config: ProjectConfig = serde_json::from_str(minimal).unwrap();
        assert!(config.loaders.is_null());
        assert!(config.resolve.is_null());
        assert!(config.chunks.is_none());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(ProjectConfig::discover(dir.path()).is_err());
    }
}
