//! Core domain types for the speed-camera POI builder.
//!
//! This crate owns the data model and the pure stages of a build:
//! normalising decoded cameras into categories and merging them with the
//! categories already on the device. Nothing here performs I/O.

#![forbid(unsafe_code)]

mod camera;
mod merge;
mod normalize;
mod poi;
mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use camera::{CAMERA_ALERT_SOUND, CameraCategory, CameraKind, CameraRecord, Verification};
pub use merge::{MergeProgress, dedup_category, is_camera_managed, merge_categories};
pub use normalize::{CameraGroup, filter_cameras, normalize_cameras, sort_cameras};
pub use poi::{
    Fingerprint, PointOfInterest, PointOfInterestCategory, PointOfInterestError,
    category_name_key, category_names_match,
};
pub use settings::{CameraSettings, Credentials};
