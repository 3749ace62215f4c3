//! Facade crate for the speed-camera POI builder.
//!
//! This crate re-exports the core domain types and, behind the
//! `store-binary` feature, the provider, database codec and build pipeline.

#![forbid(unsafe_code)]

pub use speedcam_core::{
    CameraCategory, CameraKind, CameraRecord, CameraSettings, Credentials, MergeProgress,
    PointOfInterest, PointOfInterestCategory, PointOfInterestError, Verification,
    merge_categories, normalize_cameras,
};

#[cfg(feature = "store-binary")]
pub use speedcam_data::{
    BinaryPoiCodec, BuildError, BuildHandle, BuildProgress, BuildReport, BuildStage,
    BuildWorker, CameraProvider, HttpCameraProvider, PoiDatabaseCodec, TransportError,
    run_build, run_build_with_archive,
};
