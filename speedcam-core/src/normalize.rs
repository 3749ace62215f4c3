//! Grouping, canonical ordering and filtering of decoded cameras.
//!
//! [`sort_cameras`] buckets records by [`CameraCategory`] and orders both the
//! buckets and their members canonically. [`filter_cameras`] then applies a
//! [`CameraSettings`] value and converts what survives into
//! [`PointOfInterestCategory`] values. Both steps are pure.

use std::collections::BTreeMap;

use log::debug;

use crate::{
    CAMERA_ALERT_SOUND, CameraCategory, CameraRecord, CameraSettings, PointOfInterest,
    PointOfInterestCategory,
};

/// Records for a single camera category, in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraGroup {
    category: CameraCategory,
    records: Vec<CameraRecord>,
}

impl CameraGroup {
    /// Category the records belong to.
    #[must_use]
    pub const fn category(&self) -> CameraCategory {
        self.category
    }

    /// Records ordered by latitude, longitude, then name.
    #[must_use]
    pub fn records(&self) -> &[CameraRecord] {
        &self.records
    }
}

/// Group records by camera category in canonical order.
///
/// Categories follow [`CameraCategory::ALL`]; records within a category are
/// ordered by latitude, longitude and name, with label and alert radius
/// breaking any remaining ties. The sort is stable.
#[must_use]
pub fn sort_cameras(records: Vec<CameraRecord>) -> Vec<CameraGroup> {
    let mut buckets: BTreeMap<CameraCategory, Vec<CameraRecord>> = BTreeMap::new();
    for record in records {
        buckets
            .entry(record.kind().category())
            .or_default()
            .push(record);
    }

    buckets
        .into_iter()
        .map(|(category, mut records)| {
            records.sort_by(|a, b| {
                a.location()
                    .y
                    .total_cmp(&b.location().y)
                    .then_with(|| a.location().x.total_cmp(&b.location().x))
                    .then_with(|| a.name().cmp(b.name()))
                    .then_with(|| a.label().cmp(b.label()))
                    .then_with(|| a.alert_radius().cmp(&b.alert_radius()))
            });
            CameraGroup { category, records }
        })
        .collect()
}

/// Apply `settings` to sorted groups, producing device categories.
///
/// Groups whose category is switched off are dropped whole. Unverified
/// records are dropped when `include_unverified` is false. A category left
/// with no members is not emitted.
#[must_use]
pub fn filter_cameras(
    groups: Vec<CameraGroup>,
    settings: &CameraSettings,
) -> Vec<PointOfInterestCategory> {
    groups
        .into_iter()
        .filter(|group| {
            let wanted = settings.includes(group.category);
            if !wanted {
                debug!("excluding camera category {}", group.category);
            }
            wanted
        })
        .filter_map(|group| {
            let pois: Vec<_> = group
                .records
                .into_iter()
                .filter(|record| settings.accepts(record.verification()))
                .map(PointOfInterest::from_camera)
                .collect();
            (!pois.is_empty()).then(|| camera_category(group.category, pois))
        })
        .collect()
}

/// Sort then filter: the full normalisation step.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use speedcam_core::{normalize_cameras, CameraRecord, CameraSettings, Credentials};
///
/// # fn main() -> Result<(), speedcam_core::PointOfInterestError> {
/// let records = vec![
///     CameraRecord::new(Coord { x: 0.1, y: 51.0 }, "Mobile", "Van site")?,
///     CameraRecord::new(Coord { x: 0.2, y: 51.0 }, "Fixed", "A12")?,
/// ];
/// let settings = CameraSettings {
///     include_mobile: false,
///     ..CameraSettings::new("/media/sdcard", Credentials::new("u", "p"))
/// };
/// let categories = normalize_cameras(records, &settings);
/// assert_eq!(categories.len(), 1);
/// assert_eq!(categories[0].name(), "Fixed Cameras");
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn normalize_cameras(
    records: Vec<CameraRecord>,
    settings: &CameraSettings,
) -> Vec<PointOfInterestCategory> {
    filter_cameras(sort_cameras(records), settings)
}

/// Device category for `category` carrying its icon and alert sound.
pub(crate) fn camera_category(
    category: CameraCategory,
    pois: Vec<PointOfInterest>,
) -> PointOfInterestCategory {
    PointOfInterestCategory::new(category.name(), pois)
        .with_icon(Some(category.icon().to_owned()))
        .with_alert_sound(Some(CAMERA_ALERT_SOUND.to_owned()))
}
