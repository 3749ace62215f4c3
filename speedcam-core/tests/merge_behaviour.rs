//! Behavioural tests for replacing camera categories on a device.

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use speedcam_core::{MergeProgress, PointOfInterest, PointOfInterestCategory, merge_categories};
use std::cell::RefCell;

fn poi(name: &str, lon: f64, lat: f64) -> PointOfInterest {
    PointOfInterest::new(Coord { x: lon, y: lat }, name).expect("valid poi")
}

#[derive(Debug, Default)]
struct MergeWorld {
    existing: RefCell<Vec<PointOfInterestCategory>>,
    incoming: RefCell<Vec<PointOfInterestCategory>>,
    merged: RefCell<Vec<PointOfInterestCategory>>,
    progress: RefCell<Vec<MergeProgress>>,
}

impl MergeWorld {
    fn merged_names(&self) -> Vec<String> {
        self.merged
            .borrow()
            .iter()
            .map(|category| category.name().to_owned())
            .collect()
    }
}

#[fixture]
fn world() -> MergeWorld {
    MergeWorld::default()
}

#[given("a device holding a stale fixed camera and two favourites")]
fn device_with_stale_camera(#[from(world)] world: &MergeWorld) {
    *world.existing.borrow_mut() = vec![
        PointOfInterestCategory::new("Fixed Cameras", vec![poi("Old A3", -0.5, 51.2)]),
        PointOfInterestCategory::new(
            "My Favorites",
            vec![poi("Home", -0.1, 51.5), poi("Work", -0.2, 51.6)],
        ),
    ];
}

#[given("an empty device")]
fn empty_device(#[from(world)] world: &MergeWorld) {
    world.existing.borrow_mut().clear();
}

#[given("fresh data with two fixed cameras")]
fn fresh_fixed_cameras(#[from(world)] world: &MergeWorld) {
    *world.incoming.borrow_mut() = vec![PointOfInterestCategory::new(
        "Fixed Cameras",
        vec![poi("A1 north", -0.1, 51.0), poi("A2 east", 0.2, 51.1)],
    )];
}

#[given("fresh data with no cameras")]
fn fresh_nothing(#[from(world)] world: &MergeWorld) {
    world.incoming.borrow_mut().clear();
}

#[given("fresh data listing the same fixed camera twice")]
fn fresh_duplicates(#[from(world)] world: &MergeWorld) {
    *world.incoming.borrow_mut() = vec![PointOfInterestCategory::new(
        "Fixed Cameras",
        vec![poi("A1 north", -0.1, 51.0), poi("A1 north", -0.1, 51.0)],
    )];
}

#[when("I merge the fresh data into the device categories")]
fn merge(#[from(world)] world: &MergeWorld) {
    let existing = world.existing.take();
    let incoming = world.incoming.take();
    let mut progress = Vec::new();
    let merged = merge_categories(existing, incoming, |event| progress.push(event));
    *world.merged.borrow_mut() = merged;
    *world.progress.borrow_mut() = progress;
}

#[then("the favourites come first followed by the fixed cameras")]
fn favourites_first(#[from(world)] world: &MergeWorld) {
    assert_eq!(world.merged_names(), vec!["My Favorites", "Fixed Cameras"]);
    let last = world.progress.borrow().last().copied().expect("progress reported");
    assert_eq!(last, MergeProgress { processed: 2, total: 2 });
}

#[then("the stale fixed camera is gone")]
fn stale_camera_gone(#[from(world)] world: &MergeWorld) {
    let merged = world.merged.borrow();
    let fixed = merged
        .iter()
        .find(|category| category.has_name("fixed cameras"))
        .expect("fixed category present");
    assert!(fixed.pois().iter().all(|poi| poi.name() != "Old A3"));
    assert_eq!(fixed.len(), 2);
}

#[then("only the favourites remain")]
fn only_favourites(#[from(world)] world: &MergeWorld) {
    assert_eq!(world.merged_names(), vec!["My Favorites"]);
}

#[then("the fixed camera category holds one camera")]
fn one_camera(#[from(world)] world: &MergeWorld) {
    let merged = world.merged.borrow();
    let fixed = merged.first().expect("fixed category present");
    assert_eq!(fixed.len(), 1);
}

#[scenario(path = "tests/features/merge.feature", index = 0)]
fn stale_cameras_replaced(world: MergeWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/merge.feature", index = 1)]
fn empty_download_clears_cameras(world: MergeWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/merge.feature", index = 2)]
fn duplicates_collapsed(world: MergeWorld) {
    let _ = world;
}
