//! Property tests for deduplication and filtering.

use geo::Coord;
use proptest::prelude::*;
use speedcam_core::{
    CameraRecord, CameraSettings, Credentials, PointOfInterest, PointOfInterestCategory,
    Verification, dedup_category, is_camera_managed, merge_categories, normalize_cameras,
};

const LABELS: &[&str] = &[
    "Fixed",
    "Fixed_Unverified",
    "Mobile",
    "Mobile_Unverified",
    "RedLight",
    "SPECS",
    "Toll_Booth",
];

fn arb_poi() -> impl Strategy<Value = PointOfInterest> {
    // A small coordinate grid makes fingerprint collisions likely.
    (0_u8..4, 0_u8..4, "[ab]").prop_map(|(x, y, name)| {
        PointOfInterest::new(Coord { x: f64::from(x), y: f64::from(y) }, name).expect("valid poi")
    })
}

fn arb_record() -> impl Strategy<Value = CameraRecord> {
    (0..LABELS.len(), -10_i8..10, -10_i8..10).prop_map(|(label, x, y)| {
        let label = LABELS.get(label).copied().expect("label index in range");
        CameraRecord::new(Coord { x: f64::from(x), y: f64::from(y) }, label, "site")
            .expect("valid record")
    })
}

fn arb_settings() -> impl Strategy<Value = CameraSettings> {
    proptest::collection::vec(any::<bool>(), 6).prop_map(|flags| {
        let flag = |i: usize| flags.get(i).copied().unwrap_or(true);
        CameraSettings {
            include_fixed: flag(0),
            include_mobile: flag(1),
            include_specs: flag(2),
            include_red_light: flag(3),
            include_unrecognised: flag(4),
            include_unverified: flag(5),
            ..CameraSettings::new("/drive", Credentials::new("u", "p"))
        }
    })
}

proptest! {
    #[test]
    fn dedup_is_idempotent(pois in proptest::collection::vec(arb_poi(), 0..24)) {
        let once = dedup_category(PointOfInterestCategory::new("Fixed Cameras", pois));
        let twice = dedup_category(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn deduplicated_fingerprints_are_unique(pois in proptest::collection::vec(arb_poi(), 0..24)) {
        let category = dedup_category(PointOfInterestCategory::new("Fixed Cameras", pois));
        let mut seen = std::collections::HashSet::new();
        for poi in category.pois() {
            prop_assert!(seen.insert(poi.fingerprint()));
        }
    }

    #[test]
    fn filtering_only_keeps_what_settings_allow(
        records in proptest::collection::vec(arb_record(), 0..32),
        settings in arb_settings(),
    ) {
        for category in normalize_cameras(records, &settings) {
            prop_assert!(!category.is_empty());
            prop_assert!(is_camera_managed(&category));
            for poi in category.pois() {
                let label = poi.description().expect("camera label kept");
                let record = CameraRecord::new(poi.location(), label, poi.name())
                    .expect("valid record");
                prop_assert!(settings.includes(record.kind().category()));
                if record.verification() == Verification::Unverified {
                    prop_assert!(settings.include_unverified);
                }
            }
        }
    }

    #[test]
    fn merged_names_are_unique(
        pois in proptest::collection::vec(arb_poi(), 0..8),
        names in proptest::collection::vec("(Fixed Cameras|fixed cameras|Fuel|FUEL|Parks)", 0..6),
        incoming_names in proptest::collection::vec(
            "(Fixed Cameras|fixed cameras|Fuel|FUEL|Parks)",
            0..4,
        ),
    ) {
        // Existing databases never repeat a name, so keep the first spelling of each.
        let mut seen = std::collections::HashSet::new();
        let existing: Vec<_> = names
            .iter()
            .filter(|name| seen.insert(name.to_lowercase()))
            .map(|name| PointOfInterestCategory::new(name.as_str(), pois.clone()))
            .collect();
        let incoming: Vec<_> = incoming_names
            .iter()
            .map(|name| PointOfInterestCategory::new(name.as_str(), pois.clone()))
            .collect();
        let merged = merge_categories(existing, incoming, |_| {});
        for (i, category) in merged.iter().enumerate() {
            for other in merged.iter().skip(i + 1) {
                prop_assert!(!category.has_name(other.name()));
            }
        }
    }
}
