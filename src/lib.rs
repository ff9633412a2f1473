#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod bundler;
pub mod config;
pub mod entry;
pub mod inject;
pub mod models;
pub mod sanitize;
pub mod scan;

pub use builder::{BuildPipeline, BuildState};
pub use bundler::{Bundler, BundlerConfig, BundlerError, BundlerInvocation, CommandBundler};
pub use config::ProjectConfig;
pub use inject::{InjectError, PostBuildHook};
pub use models::{AssetKind, AssetReference, EntryKind, EntryPoint, HashedArtifact};
