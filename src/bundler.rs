//! Contract with the external module bundler.
//!
//! The bundler is an opaque collaborator: it accepts a set of independent
//! build configurations, runs them together, and guarantees that every
//! declared output file exists on disk by the time the invocation completes.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failure reported by a bundler invocation.
#[derive(Debug, Error)]
pub enum BundlerError {
    /// The bundler ran and reported a compile error.
    #[error("bundler reported a compile error: {0}")]
    Compile(String),
    /// The bundler process could not be started or observed.
    #[error("failed to run bundler: {0}")]
    Io(#[from] std::io::Error),
    /// The invocation could not be encoded for the external tool.
    #[error("failed to encode bundler invocation: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Output location settings for one bundler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    /// Output directory for every file this configuration produces.
    pub path: String,
    /// Base URL prefix under which the output is served.
    pub public_path: String,
    /// Output filename or filename pattern, e.g. `assets/js/[name]-[chunkhash].js`.
    pub filename: String,
}

/// Instruction to write a processed HTML entry to a destination path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlEmit {
    /// Name of the entry whose document should be emitted.
    pub entry: String,
    /// Destination path relative to the output root.
    pub dest: String,
}

/// One independent build configuration within an invocation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerConfig {
    /// Entry map of logical name to module path.
    pub entries: BTreeMap<String, String>,
    /// Opaque loader rules forwarded from project configuration.
    pub loaders: Value,
    /// Opaque resolve settings forwarded from project configuration.
    pub resolve: Value,
    /// Output location settings.
    pub output: OutputSpec,
    /// Filename pattern for extracted stylesheets, when extraction is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css_extract_filename: Option<String>,
    /// HTML emission settings for entries producing a destination document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emit_html: Option<HtmlEmit>,
}

/// A single submission of configurations to the external bundler.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BundlerInvocation {
    /// Configurations run together in this invocation.
    pub configs: Vec<BundlerConfig>,
}

/// External module bundler collaborator.
pub trait Bundler {
    /// Run every configuration in one invocation and block until done.
    ///
    /// An `Ok` return is the completion signal: all declared output files
    /// exist on disk once it is observed. There is exactly one completion per
    /// invocation; cancellation and timeouts are not supported.
    fn run(&mut self, invocation: &BundlerInvocation) -> Result<(), BundlerError>;
}

/// Bundler adapter that hands each invocation to an external command.
///
/// The invocation is serialized as JSON into the working directory and the
/// command is spawned with that file as its only argument. A non-zero exit
/// status is reported as a compile error.
pub struct CommandBundler {
    program: String,
    invocation_dir: PathBuf,
    submitted: usize,
}

impl CommandBundler {
    /// Create an adapter spawning `program` for each invocation, writing
    /// invocation files under `invocation_dir`.
    pub fn new(program: impl Into<String>, invocation_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            invocation_dir: invocation_dir.into(),
            submitted: 0,
        }
    }
}

impl Bundler for CommandBundler {
    fn run(&mut self, invocation: &BundlerInvocation) -> Result<(), BundlerError> {
        self.submitted += 1;
        let file = self
            .invocation_dir
            .join(format!("invocation-{}.json", self.submitted));
        fs::write(&file, serde_json::to_vec_pretty(invocation)?)?;

        let status = Command::new(&self.program).arg(&file).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(BundlerError::Compile(format!(
                "{} exited with {status}",
                self.program
            )))
        }
    }
}
