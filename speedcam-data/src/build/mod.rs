//! Build orchestration: from provider archive to database on the drive.
//!
//! [`run_build`] and [`run_build_with_archive`] run the pipeline on the
//! calling thread. [`BuildWorker`] runs the same pipeline on a dedicated
//! thread and streams [`BuildProgress`] events over a channel.

mod pipeline;
mod worker;

use std::{fmt, io};

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::{ArchiveFormatError, StoreLoadError, StoreWriteError, TransportError};

pub use pipeline::{check_preconditions, run_build, run_build_with_archive};
pub use worker::{BuildHandle, BuildRejected, BuildWorker};

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStage {
    /// No build has started.
    Idle,
    /// Fetching the archive from the provider.
    Downloading,
    /// Unpacking the archive into camera records.
    Decoding,
    /// Grouping and filtering cameras by the settings.
    Filtering,
    /// Reading the database already on the drive.
    LoadingExisting,
    /// Combining existing and fresh categories.
    Merging,
    /// Writing the merged database.
    Writing,
    /// The build completed.
    Done,
    /// The build stopped with an error.
    Failed,
}

impl BuildStage {
    /// Human-readable description of the stage.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Downloading => "Downloading cameras from the provider",
            Self::Decoding => "Unpacking camera archive",
            Self::Filtering => "Filtering cameras",
            Self::LoadingExisting => "Loading existing POIs from the drive",
            Self::Merging => "Merging categories",
            Self::Writing => "Building database",
            Self::Done => "Database built",
            Self::Failed => "Build failed",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress notification emitted while a build runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildProgress {
    /// The pipeline entered `stage`.
    Stage {
        /// Stage entered.
        stage: BuildStage,
        /// Description of the stage.
        label: &'static str,
    },
    /// A category was placed in the merged set.
    Merged {
        /// Categories emitted so far.
        processed: usize,
        /// Categories the merged set will contain.
        total: usize,
    },
    /// POIs handed to the database file so far.
    Written {
        /// Running POI count.
        pois: usize,
    },
}

impl BuildProgress {
    /// Stage-transition event for `stage`.
    #[must_use]
    pub const fn stage(stage: BuildStage) -> Self {
        Self::Stage {
            stage,
            label: stage.label(),
        }
    }
}

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// POIs written across all categories.
    pub pois_written: usize,
    /// Categories written.
    pub categories_written: usize,
    /// Location of the database.
    pub database_path: Utf8PathBuf,
}

/// A build could not start because its inputs are unusable.
#[derive(Debug, Error)]
pub enum PreconditionError {
    /// The drive path does not exist.
    #[error("target drive {path} does not exist")]
    DriveMissing {
        /// Configured drive root.
        path: Utf8PathBuf,
    },
    /// The drive path is not a directory.
    #[error("target drive {path} is not a directory")]
    DriveNotDirectory {
        /// Configured drive root.
        path: Utf8PathBuf,
    },
    /// The drive cannot be written to.
    #[error("target drive {path} is read-only")]
    DriveReadOnly {
        /// Configured drive root.
        path: Utf8PathBuf,
    },
    /// The drive could not be inspected.
    #[error("failed to inspect target drive {path}: {source}")]
    DriveInspect {
        /// Configured drive root.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// No provider username was configured.
    #[error("a provider username is required")]
    MissingUsername,
    /// No provider password was configured.
    #[error("a provider password is required")]
    MissingPassword,
}

/// Why a build failed.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Inputs were unusable; nothing was attempted.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    /// The provider could not be reached.
    #[error("failed to download cameras: {0}")]
    Transport(#[from] TransportError),
    /// The archive could not be decoded.
    #[error("failed to decode camera archive: {0}")]
    Archive(#[from] ArchiveFormatError),
    /// The existing database could not be read.
    #[error("failed to load existing POIs: {0}")]
    Load(#[from] StoreLoadError),
    /// The merged database could not be written.
    #[error("failed to save POIs: {0}")]
    Write(#[from] StoreWriteError),
    /// The worker thread panicked.
    #[error("build worker panicked")]
    WorkerPanicked,
}

impl BuildError {
    /// Whether the build can be resumed with a manually supplied archive.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
