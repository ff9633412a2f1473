//! Two-phase build orchestration around the external bundler.
//!
//! Phase 1 bundles every synthesized HTML entry together with standalone JS
//! entries, producing hashed CSS and JS artifacts. Phase 2 runs one
//! sub-configuration per HTML entry to resolve in-document static assets and
//! write the destination file, then fires the injector for each entry. Phase
//! 2 never starts before phase 1 completes: artifact discovery depends on the
//! phase-1 filenames already existing on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::bundler::{Bundler, BundlerConfig, BundlerInvocation, HtmlEmit, OutputSpec};
use crate::config::ProjectConfig;
use crate::entry::{TEMP_DIR, synthesize};
use crate::inject::{self, PLACEHOLDER_FILE, PostBuildHook};
use crate::models::EntryKind;
use crate::scan::scan_asset_references;

const JS_FILENAME_PATTERN: &str = "assets/js/[name]-[chunkhash].js";
const CSS_FILENAME_PATTERN: &str = "assets/css/[name]-[chunkhash].css";

/// Observable orchestration state.
///
/// `Failed` is absorbing: once a running phase reports an error the pipeline
/// does not advance further. Partial output already on disk is left as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Prior output and temp directories removed, temp directory recreated.
    Clean,
    /// The combined JS/CSS invocation has been submitted.
    Phase1Running,
    /// Phase 1 completed; hashed artifacts exist on disk.
    Phase1Done,
    /// The per-HTML-entry invocation has been submitted.
    Phase2Running,
    /// Both phases completed and the temp directory was removed.
    Done,
    /// A phase reported an error.
    Failed,
}

/// Everything one orchestration run submits to the bundler.
struct BuildPlan {
    phase1: BundlerInvocation,
    phase2: BundlerInvocation,
    hooks: Vec<PostBuildHook>,
}

/// Sequences the two bundler phases and fires the injector on completion.
pub struct BuildPipeline<'a, B: Bundler> {
    config: &'a ProjectConfig,
    bundler: B,
    temp_dir: PathBuf,
    state: BuildState,
}

impl<'a, B: Bundler> BuildPipeline<'a, B> {
    /// Create a pipeline using the fixed `.build` temp working directory.
    pub fn new(config: &'a ProjectConfig, bundler: B) -> Self {
        Self::with_temp_dir(config, bundler, TEMP_DIR)
    }

    /// Create a pipeline with an explicit temp working directory.
    pub fn with_temp_dir(
        config: &'a ProjectConfig,
        bundler: B,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            bundler,
            temp_dir: temp_dir.into(),
            state: BuildState::Clean,
        }
    }

    /// Current orchestration state.
    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Remove the prior output and temp directories and recreate the temp
    /// directory. Idempotent: pre-existing directories are not required.
    pub fn clean(&mut self) -> Result<()> {
        self.state = BuildState::Clean;
        remove_dir_if_present(Path::new(&self.config.output.path))?;
        remove_dir_if_present(&self.temp_dir)?;
        fs::create_dir_all(&self.temp_dir).with_context(|| {
            format!(
                "failed to create temp working directory {}",
                self.temp_dir.display()
            )
        })?;
        Ok(())
    }

    /// Run the full two-phase build.
    ///
    /// Synthesized entry files are removed when the run ends, whether it
    /// succeeded or failed. A phase error leaves partial output on disk and
    /// surfaces to the caller.
    pub fn run(&mut self) -> Result<()> {
        self.clean()?;
        let outcome = self.run_phases();
        remove_dir_if_present(&self.temp_dir)?;
        match outcome {
            Ok(()) => {
                self.state = BuildState::Done;
                info!("finished");
                Ok(())
            }
            Err(err) => {
                self.state = BuildState::Failed;
                Err(err)
            }
        }
    }

    fn run_phases(&mut self) -> Result<()> {
        self.state = BuildState::Phase1Running;
        let plan = self.plan()?;
        info!(configs = plan.phase1.configs.len(), "starting phase 1");
        self.bundler
            .run(&plan.phase1)
            .context("phase 1 bundler invocation failed")?;
        self.state = BuildState::Phase1Done;

        self.state = BuildState::Phase2Running;
        info!(configs = plan.phase2.configs.len(), "starting phase 2");
        self.bundler
            .run(&plan.phase2)
            .context("phase 2 bundler invocation failed")?;
        for hook in &plan.hooks {
            inject::run_post_build(
                hook,
                Path::new(&self.config.output.path),
                &self.config.output.public_path,
            )?;
        }
        Ok(())
    }

    /// Dispatch every configured entry into the two phases, synthesizing and
    /// writing temp entry files for HTML entries along the way.
    fn plan(&self) -> Result<BuildPlan> {
        let mut combined_entries = BTreeMap::new();
        let mut js_configs = Vec::new();
        let mut phase2_configs = Vec::new();
        let mut hooks = Vec::new();

        for entry_point in self.config.entry_points() {
            match entry_point.kind() {
                EntryKind::Html => {
                    let html = fs::read_to_string(&entry_point.src).with_context(|| {
                        format!("failed to read entry source {}", entry_point.src)
                    })?;
                    let references = scan_asset_references(&html);

                    let synthesized = synthesize(&self.temp_dir, &entry_point.src, &html);
                    synthesized.write()?;
                    combined_entries.insert(
                        entry_point.name.clone(),
                        synthesized.path.to_string_lossy().into_owned(),
                    );

                    // Phase 2 bundles the HTML file itself so static assets
                    // referenced inside it get resolved; the JS it emits is a
                    // disposable placeholder.
                    let mut config = self.base_config(PLACEHOLDER_FILE);
                    config.entries.insert(
                        format!("{}.html", entry_point.name),
                        entry_point.src.clone(),
                    );
                    config.emit_html = Some(HtmlEmit {
                        entry: format!("{}.html", entry_point.name),
                        dest: entry_point.dest.clone(),
                    });
                    phase2_configs.push(config);

                    hooks.push(PostBuildHook {
                        entry_name: entry_point.name.clone(),
                        dest: entry_point.dest.clone(),
                        references,
                    });
                }
                EntryKind::Js => {
                    let mut config = self.base_config(&entry_point.dest);
                    config
                        .entries
                        .insert(entry_point.name.clone(), entry_point.src.clone());
                    js_configs.push(config);
                }
                EntryKind::Css => {
                    // XXX css entry points not handled yet
                }
                EntryKind::Unknown => {
                    warn!(
                        entry = entry_point.name.as_str(),
                        src = entry_point.src.as_str(),
                        "unknown entry type, skipping"
                    );
                }
            }
        }

        let mut combined = self.base_config(JS_FILENAME_PATTERN);
        combined.entries = combined_entries;
        js_configs.push(combined);

        Ok(BuildPlan {
            phase1: BundlerInvocation {
                configs: js_configs,
            },
            phase2: BundlerInvocation {
                configs: phase2_configs,
            },
            hooks,
        })
    }

    fn base_config(&self, filename: &str) -> BundlerConfig {
        BundlerConfig {
            entries: BTreeMap::new(),
            loaders: self.config.loaders.clone(),
            resolve: self.config.resolve.clone(),
            output: OutputSpec {
                path: self.config.output.path.clone(),
                public_path: self.config.output.public_path.clone(),
                filename: filename.to_string(),
            },
            css_extract_filename: Some(CSS_FILENAME_PATTERN.to_string()),
            emit_html: None,
        }
    }
}

fn remove_dir_if_present(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", dir.display())),
    }
}
