//! Build command implementation for the speedcam CLI.

use std::io::{Read, Write};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::{debug, info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use speedcam_core::{CameraSettings, Credentials};
use speedcam_data::provider::DEFAULT_TIMEOUT;
use speedcam_data::{
    BuildError, BuildHandle, BuildProgress, BuildReport, BuildWorker, CameraProvider,
    HttpCameraProvider, HttpCameraProviderConfig,
};
use speedcam_fs::DriveState;

use crate::{
    ARG_ARCHIVE, ARG_DRIVE, ARG_FALLBACK_ARCHIVE, ARG_PASSWORD, ARG_PROVIDER_URL,
    ARG_TIMEOUT_SECS, ARG_USERNAME, CliError, ENV_DRIVE, ENV_PASSWORD, ENV_PROVIDER_URL,
    ENV_USERNAME,
};

/// CLI arguments for the `build` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Download the current camera archive for an account, keep \
                 the camera kinds you ask for and merge them into the POI \
                 database on the navigation unit's drive. Categories that \
                 were not created by this tool are left untouched.",
    about = "Rebuild the camera POI database on a drive"
)]
#[ortho_config(prefix = "SPEEDCAM")]
pub(crate) struct BuildArgs {
    /// Root of the removable drive holding the navigation unit's database.
    #[arg(long = ARG_DRIVE, value_name = "dir")]
    #[serde(default)]
    pub(crate) drive: Option<Utf8PathBuf>,
    /// Provider account name.
    #[arg(long = ARG_USERNAME, value_name = "name")]
    #[serde(default)]
    pub(crate) username: Option<String>,
    /// Provider account password.
    #[arg(long = ARG_PASSWORD, value_name = "secret")]
    #[serde(default)]
    pub(crate) password: Option<String>,
    /// Base URL of the camera provider.
    #[arg(long = ARG_PROVIDER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) provider_url: Option<String>,
    /// Request timeout for provider calls, in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Keep fixed cameras (default true).
    #[arg(long, value_name = "bool")]
    #[serde(default)]
    pub(crate) include_fixed: Option<bool>,
    /// Keep mobile enforcement sites (default true).
    #[arg(long, value_name = "bool")]
    #[serde(default)]
    pub(crate) include_mobile: Option<bool>,
    /// Keep average-speed cameras (default true).
    #[arg(long, value_name = "bool")]
    #[serde(default)]
    pub(crate) include_specs: Option<bool>,
    /// Keep red-light cameras (default true).
    #[arg(long, value_name = "bool")]
    #[serde(default)]
    pub(crate) include_red_light: Option<bool>,
    /// Keep cameras with labels this tool does not recognise (default true).
    #[arg(long, value_name = "bool")]
    #[serde(default)]
    pub(crate) include_unrecognised: Option<bool>,
    /// Keep cameras the provider has not verified (default true).
    #[arg(long, value_name = "bool")]
    #[serde(default)]
    pub(crate) include_unverified: Option<bool>,
    /// Build from a local archive instead of downloading one.
    #[arg(long = ARG_ARCHIVE, value_name = "path")]
    #[serde(default)]
    pub(crate) archive: Option<Utf8PathBuf>,
    /// Local archive to use if the download fails.
    #[arg(long = ARG_FALLBACK_ARCHIVE, value_name = "path")]
    #[serde(default)]
    pub(crate) fallback_archive: Option<Utf8PathBuf>,
}

impl BuildArgs {
    pub(crate) fn into_config(self) -> Result<BuildConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        BuildConfig::try_from(merged)
    }
}

/// Resolved `build` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BuildConfig {
    /// Filter flags, drive and account.
    pub(crate) settings: CameraSettings,
    /// Base URL of the camera provider.
    pub(crate) provider_url: String,
    /// Request timeout for provider calls.
    pub(crate) timeout: Duration,
    /// Archive to build from without downloading.
    pub(crate) archive: Option<Utf8PathBuf>,
    /// Archive to fall back to after a failed download.
    pub(crate) fallback_archive: Option<Utf8PathBuf>,
}

impl BuildConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        if let Some(path) = &self.archive {
            Self::require_existing(path, ARG_ARCHIVE)?;
        }
        if let Some(path) = &self.fallback_archive {
            Self::require_existing(path, ARG_FALLBACK_ARCHIVE)?;
        }
        Ok(())
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        let inspect_error = |source| CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        };
        if speedcam_fs::file_is_file(path).map_err(inspect_error)? {
            return Ok(());
        }
        match speedcam_fs::inspect_drive(path).map_err(inspect_error)? {
            DriveState::Missing => Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            }),
            _ => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
        }
    }
}

impl TryFrom<BuildArgs> for BuildConfig {
    type Error = CliError;

    fn try_from(args: BuildArgs) -> Result<Self, Self::Error> {
        let drive = args.drive.ok_or(CliError::MissingArgument {
            field: ARG_DRIVE,
            env: ENV_DRIVE,
        })?;
        let provider_url = args.provider_url.ok_or(CliError::MissingArgument {
            field: ARG_PROVIDER_URL,
            env: ENV_PROVIDER_URL,
        })?;

        // A local archive needs no account. Without one, no acknowledgment is sent.
        let (username, password) = if args.archive.is_some() {
            (
                args.username.unwrap_or_default(),
                args.password.unwrap_or_default(),
            )
        } else {
            let username = args.username.ok_or(CliError::MissingArgument {
                field: ARG_USERNAME,
                env: ENV_USERNAME,
            })?;
            let password = args.password.ok_or(CliError::MissingArgument {
                field: ARG_PASSWORD,
                env: ENV_PASSWORD,
            })?;
            (username, password)
        };

        let timeout = match args.timeout_secs {
            None => DEFAULT_TIMEOUT,
            Some(0) => {
                return Err(CliError::ZeroTimeout {
                    field: ARG_TIMEOUT_SECS,
                });
            }
            Some(secs) => Duration::from_secs(secs),
        };

        let settings = CameraSettings {
            include_fixed: args.include_fixed.unwrap_or(true),
            include_mobile: args.include_mobile.unwrap_or(true),
            include_specs: args.include_specs.unwrap_or(true),
            include_red_light: args.include_red_light.unwrap_or(true),
            include_unrecognised: args.include_unrecognised.unwrap_or(true),
            include_unverified: args.include_unverified.unwrap_or(true),
            ..CameraSettings::new(drive, Credentials::new(username, password))
        };

        Ok(Self {
            settings,
            provider_url,
            timeout,
            archive: args.archive,
            fallback_archive: args.fallback_archive,
        })
    }
}

pub(crate) fn run_build_command(args: BuildArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let provider = HttpCameraProvider::with_config(
        HttpCameraProviderConfig::new(config.provider_url.clone()).with_timeout(config.timeout),
    )
    .map_err(|source| CliError::BuildProvider {
        base_url: config.provider_url.clone(),
        source,
    })?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    run_build_with(&config, provider, &mut handle)
}

/// Run a build against `provider` and write a one-line summary to `out`.
pub(crate) fn run_build_with<P>(
    config: &BuildConfig,
    provider: P,
    out: &mut dyn Write,
) -> Result<(), CliError>
where
    P: CameraProvider + Send + Sync + 'static,
{
    let worker = BuildWorker::new(provider);
    let first = match &config.archive {
        Some(path) => {
            let archive = read_archive(path)?;
            follow(worker.start_with_archive(config.settings.clone(), archive)?)
        }
        None => follow(worker.start(config.settings.clone())?),
    };

    let report = match (first, &config.fallback_archive) {
        (Err(err), Some(path)) if err.is_recoverable() => {
            warn!("{err}; building from {path} instead");
            let archive = read_archive(path)?;
            follow(worker.start_with_archive(config.settings.clone(), archive)?)?
        }
        (outcome, _) => outcome?,
    };

    writeln!(
        out,
        "wrote {} POIs in {} categories to {}",
        report.pois_written, report.categories_written, report.database_path
    )
    .map_err(CliError::WriteOutput)
}

fn follow(handle: BuildHandle) -> Result<BuildReport, BuildError> {
    for event in handle.progress() {
        match event {
            BuildProgress::Stage { stage, .. } => debug!("entered stage {stage:?}"),
            BuildProgress::Merged { processed, total } => {
                info!("merged {processed} of {total} categories");
            }
            BuildProgress::Written { pois } => info!("{pois} POIs written"),
        }
    }
    handle.wait()
}

fn read_archive(path: &Utf8Path) -> Result<Vec<u8>, CliError> {
    let read_error = |source| CliError::ReadArchive {
        path: path.to_path_buf(),
        source,
    };
    let mut file = speedcam_fs::open_utf8_file(path).map_err(read_error)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_error)?;
    info!("read {} byte camera archive from {path}", bytes.len());
    Ok(bytes)
}
