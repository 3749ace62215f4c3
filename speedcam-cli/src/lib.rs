//! Command-line interface for the speed-camera POI builder.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod build;
mod error;

pub use error::CliError;

use build::{BuildArgs, run_build_command};

const ARG_DRIVE: &str = "drive";
const ARG_USERNAME: &str = "username";
const ARG_PASSWORD: &str = "password";
const ARG_PROVIDER_URL: &str = "provider-url";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_ARCHIVE: &str = "archive";
const ARG_FALLBACK_ARCHIVE: &str = "fallback-archive";
const ENV_DRIVE: &str = "SPEEDCAM_CMDS_BUILD_DRIVE";
const ENV_USERNAME: &str = "SPEEDCAM_CMDS_BUILD_USERNAME";
const ENV_PASSWORD: &str = "SPEEDCAM_CMDS_BUILD_PASSWORD";
const ENV_PROVIDER_URL: &str = "SPEEDCAM_CMDS_BUILD_PROVIDER_URL";

/// Run the speedcam CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Build(args) => run_build_command(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "speedcam",
    about = "Load speed-camera data onto a navigation unit's POI database",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download cameras and rebuild the POI database on a drive.
    Build(BuildArgs),
}

#[cfg(test)]
mod tests;
