//! CLI driver for the two-phase HTML entry build.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use html_entry_bundler::builder::BuildPipeline;
use html_entry_bundler::bundler::CommandBundler;
use html_entry_bundler::config::ProjectConfig;
use html_entry_bundler::entry::TEMP_DIR;

/// Bundle HTML entry points with hashed asset output.
#[derive(Parser)]
#[command(name = "html_entry_bundler", version, about)]
struct Cli {
    /// Path to the project configuration file.
    #[arg(long, default_value = "bundle.config.json")]
    config: PathBuf,

    /// External bundler command invoked once per phase.
    #[arg(long)]
    bundler: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match ProjectConfig::from_path(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            error!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    let bundler = CommandBundler::new(cli.bundler, TEMP_DIR);
    let mut pipeline = BuildPipeline::new(&config, bundler);
    match pipeline.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
