//! Combine the categories already on the device with fresh camera data.
//!
//! Camera-managed categories are replaced wholesale: whatever the device held
//! under "Fixed Cameras" is discarded and the incoming set takes its place, so
//! cameras the provider has removed do not linger. Every other category is
//! carried through untouched and in its original position ahead of the camera
//! categories, unless an incoming category claims its name.

use std::collections::HashSet;

use log::{debug, warn};

use crate::{CameraCategory, PointOfInterestCategory};

/// Progress notification emitted once per category placed in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeProgress {
    /// Categories emitted so far.
    pub processed: usize,
    /// Categories the result will contain.
    pub total: usize,
}

/// Whether `category` is owned by this tool and replaced on every build.
#[must_use]
pub fn is_camera_managed(category: &PointOfInterestCategory) -> bool {
    CameraCategory::from_name(category.name()).is_some()
}

/// Drop POIs whose fingerprint already appeared earlier in the category.
///
/// The first occurrence wins, so applying this twice changes nothing.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use speedcam_core::{dedup_category, PointOfInterest, PointOfInterestCategory};
///
/// # fn main() -> Result<(), speedcam_core::PointOfInterestError> {
/// let poi = PointOfInterest::new(Coord { x: 1.0, y: 2.0 }, "A1")?;
/// let category = PointOfInterestCategory::new("Fixed Cameras", vec![poi.clone(), poi]);
/// assert_eq!(dedup_category(category).len(), 1);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn dedup_category(mut category: PointOfInterestCategory) -> PointOfInterestCategory {
    let before = category.len();
    let mut seen = HashSet::with_capacity(before);
    category
        .pois_mut()
        .retain(|poi| seen.insert(poi.fingerprint()));
    let dropped = before - category.len();
    if dropped > 0 {
        warn!(
            "dropped {dropped} duplicate POIs from category '{}'",
            category.name()
        );
    }
    category
}

/// Merge `incoming` camera categories into the `existing` device categories.
///
/// The result holds every non-camera category from `existing` in its
/// original order, followed by the incoming categories in their given order.
/// Existing camera-managed categories are discarded, as is any existing
/// category whose name matches a non-empty incoming one, so names in the
/// result stay unique ignoring case. Incoming categories are deduplicated;
/// incoming categories sharing a name are folded into the first and empty ones
/// are skipped. `on_progress` fires once per category emitted.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use speedcam_core::{merge_categories, PointOfInterest, PointOfInterestCategory};
///
/// # fn main() -> Result<(), speedcam_core::PointOfInterestError> {
/// let stale = PointOfInterest::new(Coord { x: 0.0, y: 0.0 }, "old")?;
/// let fresh = PointOfInterest::new(Coord { x: 1.0, y: 1.0 }, "new")?;
/// let existing = vec![PointOfInterestCategory::new("Fixed Cameras", vec![stale])];
/// let incoming = vec![PointOfInterestCategory::new("Fixed Cameras", vec![fresh.clone()])];
///
/// let merged = merge_categories(existing, incoming, |_| {});
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].pois(), &[fresh]);
/// # Ok(())
/// # }
/// ```
pub fn merge_categories<F>(
    existing: Vec<PointOfInterestCategory>,
    incoming: Vec<PointOfInterestCategory>,
    mut on_progress: F,
) -> Vec<PointOfInterestCategory>
where
    F: FnMut(MergeProgress),
{
    let cameras: Vec<_> = fold_by_name(incoming)
        .into_iter()
        .map(dedup_category)
        .filter(|category| !category.is_empty())
        .collect();
    let incoming_names: HashSet<String> = cameras
        .iter()
        .map(PointOfInterestCategory::name_key)
        .collect();

    let (replaced, preserved): (Vec<_>, Vec<_>) = existing.into_iter().partition(|category| {
        is_camera_managed(category) || incoming_names.contains(&category.name_key())
    });
    for category in &replaced {
        debug!(
            "replacing {} existing POIs in category '{}'",
            category.len(),
            category.name()
        );
    }

    let total = preserved.len() + cameras.len();
    let mut merged = Vec::with_capacity(total);
    for category in preserved.into_iter().chain(cameras) {
        merged.push(category);
        on_progress(MergeProgress {
            processed: merged.len(),
            total,
        });
    }
    merged
}

fn fold_by_name(incoming: Vec<PointOfInterestCategory>) -> Vec<PointOfInterestCategory> {
    let mut folded: Vec<PointOfInterestCategory> = Vec::with_capacity(incoming.len());
    for mut category in incoming {
        if let Some(target) = folded
            .iter_mut()
            .find(|candidate| candidate.has_name(category.name()))
        {
            target.pois_mut().append(category.pois_mut());
            continue;
        }
        folded.push(category);
    }
    folded
}
