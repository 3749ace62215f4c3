//! Error types emitted by the speedcam CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use speedcam_data::{BuildError, BuildRejected, ProviderBuildError};
use thiserror::Error;

/// Errors emitted by the speedcam CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A request timeout of zero seconds was configured.
    #[error("--{field} must be at least one second")]
    ZeroTimeout { field: &'static str },
    /// A referenced archive does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced archive path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced archive path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading a local archive failed.
    #[error("failed to read camera archive {path:?}: {source}")]
    ReadArchive {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Constructing the HTTP provider failed.
    #[error("failed to build camera provider for {base_url:?}: {source}")]
    BuildProvider {
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// Another build was already running on the worker.
    #[error(transparent)]
    Rejected(#[from] BuildRejected),
    /// The build itself failed.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Writing the build summary failed.
    #[error("failed to write build summary: {0}")]
    WriteOutput(#[source] std::io::Error),
}
