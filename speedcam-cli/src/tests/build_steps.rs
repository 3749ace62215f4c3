//! Behaviour-driven step definitions driving the build CLI scenarios.

use super::helpers::{Workspace, sample_archive, write_utf8};
use super::*;
use crate::build::run_build_with;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use speedcam_data::provider::test_support::StubProvider;
use std::cell::RefCell;

#[derive(Debug)]
struct BuildWorld {
    workspace: Workspace,
    include_drive: RefCell<bool>,
    provider: RefCell<Option<StubProvider>>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl BuildWorld {
    fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            include_drive: RefCell::new(true),
            provider: RefCell::new(None),
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["speedcam".to_owned(), "build".to_owned()];
        if *self.include_drive.borrow() {
            argv.extend([
                format!("--{ARG_DRIVE}"),
                self.workspace.drive().as_str().to_owned(),
            ]);
        }
        argv.extend([
            format!("--{ARG_USERNAME}"),
            "driver".to_owned(),
            format!("--{ARG_PASSWORD}"),
            "secret".to_owned(),
            format!("--{ARG_PROVIDER_URL}"),
            "https://cameras.example".to_owned(),
        ]);
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }
}

#[fixture]
fn world() -> BuildWorld {
    BuildWorld::new()
}

#[given("the provider serves a camera archive")]
fn provider_serves_archive(#[from(world)] world: &BuildWorld) {
    *world.provider.borrow_mut() = Some(StubProvider::with_archive(sample_archive()));
}

#[given("the provider cannot be reached")]
fn provider_unreachable(#[from(world)] world: &BuildWorld) {
    *world.provider.borrow_mut() = Some(StubProvider::unreachable());
}

#[given("a fallback archive exists on disk")]
fn fallback_archive_exists(#[from(world)] world: &BuildWorld) {
    let path = world.workspace.archive_path();
    write_utf8(&path, &sample_archive());
    world
        .cli_args
        .borrow_mut()
        .extend([format!("--{ARG_FALLBACK_ARCHIVE}"), path.as_str().to_owned()]);
}

#[given("I omit the drive option")]
fn omit_drive(#[from(world)] world: &BuildWorld) {
    *world.include_drive.borrow_mut() = false;
}

#[when("I run the build command")]
fn run_build_command(#[from(world)] world: &BuildWorld) {
    let invocation = world.build_command_line();
    let provider = world
        .provider
        .borrow_mut()
        .take()
        .expect("provider configured");
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Build(args) => {
            let config = args.into_config()?;
            config.validate_sources()?;
            let mut buffer = world.stdout.borrow_mut();
            run_build_with(&config, provider, &mut *buffer)
        }
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and reports 4 POIs")]
fn command_succeeds(#[from(world)] world: &BuildWorld) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    result.as_ref().expect("expected success");

    let stdout = String::from_utf8(world.stdout.borrow().clone()).expect("stdout utf-8");
    assert!(
        stdout.starts_with("wrote 4 POIs in 2 categories"),
        "unexpected summary {stdout:?}"
    );
    let stored = speedcam_data::load_categories(&world.workspace.drive()).expect("database");
    assert_eq!(stored.len(), 2);
}

#[then("the command fails with a recoverable download error")]
fn command_fails_recoverably(#[from(world)] world: &BuildWorld) {
    match &*world.error() {
        CliError::Build(err) => assert!(err.is_recoverable()),
        other => panic!("expected Build, found {other:?}"),
    }
    assert!(!speedcam_data::database_path(&world.workspace.drive()).exists());
}

#[then("the command fails because the drive is missing")]
fn command_fails_missing_drive(#[from(world)] world: &BuildWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, env } => {
            assert_eq!(*field, ARG_DRIVE);
            assert_eq!(*env, ENV_DRIVE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

macro_rules! register_build_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/build_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: BuildWorld) {
            let _ = world;
        }
    };
}

register_build_scenario!(build_from_provider, "building from the provider");
register_build_scenario!(
    build_with_fallback,
    "falling back to a local archive after a failed download"
);
register_build_scenario!(
    build_without_fallback,
    "reporting a failed download without a fallback"
);
register_build_scenario!(build_missing_drive, "rejecting a missing drive");
