//! I/O side of the speed-camera POI builder.
//!
//! Responsibilities:
//! - Fetch camera archives from the provider and acknowledge their use.
//! - Decode the zip archive format into camera records.
//! - Read and atomically replace the POI database on the target drive.
//! - Orchestrate a build, in the foreground or on a worker thread.
//!
//! Boundaries:
//! - Do not encode grouping, filtering or merge rules (live in
//!   `speedcam-core`).
//! - Keep network and file access behind [`CameraProvider`] and
//!   [`PoiDatabaseCodec`] so builds can run against stubs.
//!
//! Invariants:
//! - A failed build never leaves a partially written database.
//! - At most one build runs per [`BuildWorker`].

#![forbid(unsafe_code)]

mod archive;
mod build;
pub mod provider;
mod store;

pub use archive::{ArchiveFormatError, RecordError, decode_archive};
pub use build::{
    BuildError, BuildHandle, BuildProgress, BuildRejected, BuildReport, BuildStage, BuildWorker,
    PreconditionError, check_preconditions, run_build, run_build_with_archive,
};
pub use provider::{
    CameraProvider, HttpCameraProvider, HttpCameraProviderConfig, ProviderBuildError,
    TransportError,
};
pub use store::{
    BinaryPoiCodec, DATABASE_DIR, DATABASE_FILE, DATABASE_MAGIC, DATABASE_VERSION,
    PROGRESS_INTERVAL, PoiDatabaseCodec, StoreLoadError, StoreReadError, StoreVersionError,
    StoreWriteError, database_path, load_categories, save_categories,
};
