//! End-to-end builds against a scratch drive.

mod support;

use rstest::rstest;
use speedcam_core::test_support::poi;
use speedcam_core::{CameraSettings, Credentials, PointOfInterestCategory, merge_categories};
use speedcam_data::provider::test_support::StubProvider;
use speedcam_data::{
    BinaryPoiCodec, BuildProgress, BuildStage, BuildWorker, database_path, load_categories,
    run_build, save_categories,
};
use support::{sample_archive, scratch_drive, zip_archive};

fn stages(events: &[BuildProgress]) -> Vec<BuildStage> {
    events
        .iter()
        .filter_map(|event| match event {
            BuildProgress::Stage { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect()
}

#[rstest]
fn rebuilding_with_the_same_inputs_is_byte_identical() {
    let drive = scratch_drive();
    let settings = CameraSettings::new(drive.root.clone(), Credentials::new("driver", "secret"));
    let provider = StubProvider::with_archive(sample_archive());

    run_build(&provider, &BinaryPoiCodec, &settings, &mut |_| {}).expect("first build");
    let first = std::fs::read(database_path(&drive.root)).expect("read first");
    run_build(&provider, &BinaryPoiCodec, &settings, &mut |_| {}).expect("second build");
    let second = std::fs::read(database_path(&drive.root)).expect("read second");

    assert_eq!(first, second);
}

#[rstest]
#[case::no_mobile(false, true, &["Fixed Cameras"], 5)]
#[case::no_unverified(true, false, &["Fixed Cameras", "Mobile Cameras"], 4)]
#[case::verified_fixed(false, false, &["Fixed Cameras"], 3)]
fn excluded_cameras_never_reach_the_drive(
    #[case] include_mobile: bool,
    #[case] include_unverified: bool,
    #[case] expected_names: &[&str],
    #[case] expected_pois: usize,
) {
    let drive = scratch_drive();
    let settings = CameraSettings {
        include_mobile,
        include_unverified,
        ..CameraSettings::new(drive.root.clone(), Credentials::new("driver", "secret"))
    };
    let provider = StubProvider::with_archive(sample_archive());

    let report = run_build(&provider, &BinaryPoiCodec, &settings, &mut |_| {}).expect("build");
    let stored = load_categories(&drive.root).expect("database readable");

    let names: Vec<&str> = stored.iter().map(|category| category.name()).collect();
    assert_eq!(names, expected_names);
    assert_eq!(report.pois_written, expected_pois);
    for poi in stored.iter().flat_map(|category| category.pois()) {
        let label = poi.description().expect("camera POIs carry their label");
        assert!(include_mobile || !label.contains("Mobile"));
        assert!(include_unverified || !label.contains("Unverified"));
    }
}

#[rstest]
fn worker_streams_every_stage_in_order() {
    let drive = scratch_drive();
    let settings = CameraSettings::new(drive.root.clone(), Credentials::new("driver", "secret"));
    let worker = BuildWorker::new(StubProvider::with_archive(sample_archive()));

    let handle = worker.start(settings).expect("worker idle");
    let events: Vec<BuildProgress> = handle.progress().iter().collect();
    let report = handle.wait().expect("build succeeds");

    assert_eq!(
        stages(&events),
        vec![
            BuildStage::Downloading,
            BuildStage::Decoding,
            BuildStage::Filtering,
            BuildStage::LoadingExisting,
            BuildStage::Merging,
            BuildStage::Writing,
            BuildStage::Done,
        ]
    );
    assert!(events.contains(&BuildProgress::Merged {
        processed: 2,
        total: 2
    }));
    assert_eq!(
        events.iter().rev().find_map(|event| match event {
            BuildProgress::Written { pois } => Some(*pois),
            _ => None,
        }),
        Some(6)
    );
    assert_eq!(report.database_path, database_path(&drive.root));
    assert!(!worker.is_busy());
    assert_eq!(worker.provider().fetches(), 1);
}

#[rstest]
fn unknown_labels_land_in_the_other_category() {
    let drive = scratch_drive();
    let settings = CameraSettings::new(drive.root.clone(), Credentials::new("driver", "secret"));
    let archive = zip_archive(&[
        ("cameras/Fixed.csv", "-0.10,51.50,A1 northbound\n"),
        ("cameras/Tunnel_Watch.csv", "-0.20,51.52,Blackwall\n"),
    ]);
    let provider = StubProvider::with_archive(archive);

    run_build(&provider, &BinaryPoiCodec, &settings, &mut |_| {}).expect("build");
    let stored = load_categories(&drive.root).expect("database readable");

    let names: Vec<&str> = stored.iter().map(|category| category.name()).collect();
    assert_eq!(names, vec!["Fixed Cameras", "Other Cameras"]);
}

#[rstest]
fn merged_names_colliding_with_user_categories_still_reload() {
    let drive = scratch_drive();
    let existing = vec![
        PointOfInterestCategory::new("Fuel", vec![poi("Shell", 0.0, 0.0)]),
        PointOfInterestCategory::new("My Favorites", vec![poi("Home", 1.0, 1.0)]),
    ];
    save_categories(&existing, &drive.root, |_| {}).expect("seed database");

    let incoming = vec![PointOfInterestCategory::new("FUEL", vec![poi("Esso", 2.0, 2.0)])];
    let stored = load_categories(&drive.root).expect("seeded database");
    let merged = merge_categories(stored, incoming, |_| {});
    save_categories(&merged, &drive.root, |_| {}).expect("merged names are unique");

    let reloaded = load_categories(&drive.root).expect("database readable");
    let names: Vec<&str> = reloaded.iter().map(|category| category.name()).collect();
    assert_eq!(names, vec!["My Favorites", "FUEL"]);
}
