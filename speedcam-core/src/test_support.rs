//! Builders for small, valid domain values used by unit and behaviour tests.
#![expect(
    clippy::expect_used,
    reason = "fixtures panic loudly when handed invalid literals"
)]

use geo::Coord;

use crate::{CameraRecord, PointOfInterest, PointOfInterestCategory};

/// Build a POI, panicking on invalid input.
///
/// # Panics
/// Panics when the location is out of range or `name` is blank.
#[must_use]
pub fn poi(name: &str, lon: f64, lat: f64) -> PointOfInterest {
    PointOfInterest::new(Coord { x: lon, y: lat }, name).expect("test POI must be valid")
}

/// Build a camera record, panicking on invalid input.
///
/// # Panics
/// Panics when the location is out of range or `name` is blank.
#[must_use]
pub fn camera(label: &str, name: &str, lon: f64, lat: f64) -> CameraRecord {
    CameraRecord::new(Coord { x: lon, y: lat }, label, name)
        .expect("test camera record must be valid")
}

/// Category named `name` holding `count` distinct POIs along the equator.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "spacing fixture points apart")]
pub fn category_with(name: &str, count: u16) -> PointOfInterestCategory {
    let pois = (0..count)
        .map(|i| poi(&format!("{name} {i}"), f64::from(i) * 0.01, 0.0))
        .collect();
    PointOfInterestCategory::new(name, pois)
}

/// Six decoded cameras: three verified fixed, two unverified fixed and one
/// mobile.
#[must_use]
pub fn sample_cameras() -> Vec<CameraRecord> {
    vec![
        camera("Fixed", "A1 northbound", -0.10, 51.50),
        camera("Fixed", "A2 eastbound", 0.20, 51.40),
        camera("Fixed", "M25 J10", -0.45, 51.30),
        camera("Fixed_Unverified", "B100 village", 0.05, 51.60),
        camera("Fixed_Unverified", "B200 bridge", 0.15, 51.70),
        camera("Mobile", "Layby 4", -0.30, 51.45),
    ]
}
