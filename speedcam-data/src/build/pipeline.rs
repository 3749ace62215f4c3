use log::{error, info, warn};
use speedcam_core::{CameraSettings, MergeProgress, merge_categories, normalize_cameras};
use speedcam_fs::DriveState;

use super::{BuildError, BuildProgress, BuildReport, BuildStage, PreconditionError};
use crate::{CameraProvider, PoiDatabaseCodec, decode_archive, database_path};

/// Check everything a full build needs before any network traffic.
///
/// The drive must exist, be a directory and be writable; the username and
/// password must be non-empty. Pass `require_password = false` when the
/// archive is already in hand.
///
/// # Errors
///
/// Returns the first [`PreconditionError`] found, checking the drive first.
pub fn check_preconditions(
    settings: &CameraSettings,
    require_password: bool,
) -> Result<(), PreconditionError> {
    let path = &settings.target_drive;
    match speedcam_fs::inspect_drive(path) {
        Ok(DriveState::Writable) => {}
        Ok(DriveState::Missing) => {
            return Err(PreconditionError::DriveMissing { path: path.clone() });
        }
        Ok(DriveState::NotADirectory) => {
            return Err(PreconditionError::DriveNotDirectory { path: path.clone() });
        }
        Ok(DriveState::ReadOnly) => {
            return Err(PreconditionError::DriveReadOnly { path: path.clone() });
        }
        Err(source) => {
            return Err(PreconditionError::DriveInspect {
                path: path.clone(),
                source,
            });
        }
    }
    if !require_password {
        return Ok(());
    }
    if settings.credentials.username().trim().is_empty() {
        return Err(PreconditionError::MissingUsername);
    }
    if settings.credentials.password().is_empty() {
        return Err(PreconditionError::MissingPassword);
    }
    Ok(())
}

/// Download cameras from `provider` and rebuild the database on the drive.
///
/// On a [`BuildError::Transport`] failure nothing on the drive has changed
/// and the caller may resume with [`run_build_with_archive`].
///
/// # Errors
///
/// Returns [`BuildError`] naming the stage that failed. A
/// [`BuildProgress::Stage`] event for [`BuildStage::Failed`] is emitted first.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use speedcam_core::{CameraSettings, Credentials};
/// use speedcam_data::{BinaryPoiCodec, BuildError, run_build};
/// use speedcam_data::provider::test_support::StubProvider;
///
/// let tmp = tempfile::tempdir().expect("tempdir");
/// let drive = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8");
/// let settings = CameraSettings::new(drive, Credentials::new("driver", "secret"));
///
/// let outcome = run_build(&StubProvider::unreachable(), &BinaryPoiCodec, &settings, &mut |_| {});
/// assert!(matches!(outcome, Err(ref err @ BuildError::Transport(_)) if err.is_recoverable()));
/// ```
pub fn run_build<P, C>(
    provider: &P,
    codec: &C,
    settings: &CameraSettings,
    on_progress: &mut dyn FnMut(BuildProgress),
) -> Result<BuildReport, BuildError>
where
    P: CameraProvider + ?Sized,
    C: PoiDatabaseCodec + ?Sized,
{
    report_failure(on_progress, |on_progress| {
        check_preconditions(settings, true)?;
        enter(on_progress, BuildStage::Downloading);
        let archive = provider.fetch_archive(&settings.credentials)?;
        info!("downloaded {} byte camera archive", archive.len());
        acknowledge(provider, settings.credentials.username(), &archive);
        build_from_archive(codec, settings, &archive, on_progress)
    })
}

/// Rebuild the database from archive bytes obtained without the provider.
///
/// Only the drive is checked; the provider is still told the archive was
/// consumed when a username is configured.
///
/// # Errors
///
/// As for [`run_build`], minus credential and transport failures.
pub fn run_build_with_archive<P, C>(
    provider: &P,
    codec: &C,
    settings: &CameraSettings,
    archive: &[u8],
    on_progress: &mut dyn FnMut(BuildProgress),
) -> Result<BuildReport, BuildError>
where
    P: CameraProvider + ?Sized,
    C: PoiDatabaseCodec + ?Sized,
{
    report_failure(on_progress, |on_progress| {
        check_preconditions(settings, false)?;
        let username = settings.credentials.username();
        if username.trim().is_empty() {
            info!("no provider username configured; skipping archive acknowledgment");
        } else {
            acknowledge(provider, username, archive);
        }
        build_from_archive(codec, settings, archive, on_progress)
    })
}

fn report_failure<F>(
    on_progress: &mut dyn FnMut(BuildProgress),
    build: F,
) -> Result<BuildReport, BuildError>
where
    F: FnOnce(&mut dyn FnMut(BuildProgress)) -> Result<BuildReport, BuildError>,
{
    build(&mut *on_progress).inspect_err(|err| {
        error!("camera database build failed: {err}");
        on_progress(BuildProgress::stage(BuildStage::Failed));
    })
}

fn enter(on_progress: &mut dyn FnMut(BuildProgress), stage: BuildStage) {
    info!("{stage}");
    on_progress(BuildProgress::stage(stage));
}

fn acknowledge<P: CameraProvider + ?Sized>(provider: &P, username: &str, archive: &[u8]) {
    if let Err(err) = provider.acknowledge_archive(username, archive) {
        warn!("failed to acknowledge camera archive: {err}");
    }
}

fn build_from_archive<C: PoiDatabaseCodec + ?Sized>(
    codec: &C,
    settings: &CameraSettings,
    archive: &[u8],
    on_progress: &mut dyn FnMut(BuildProgress),
) -> Result<BuildReport, BuildError> {
    enter(on_progress, BuildStage::Decoding);
    let records = decode_archive(archive)?;
    info!("decoded {} cameras", records.len());

    enter(on_progress, BuildStage::Filtering);
    let incoming = normalize_cameras(records, settings);

    enter(on_progress, BuildStage::LoadingExisting);
    let existing = match codec.load(&settings.target_drive) {
        Ok(categories) => categories,
        Err(err) if err.is_missing() => {
            info!("no existing database on the drive; starting empty");
            Vec::new()
        }
        Err(err) => return Err(err.into()),
    };

    enter(on_progress, BuildStage::Merging);
    let merged = merge_categories(existing, incoming, |MergeProgress { processed, total }| {
        on_progress(BuildProgress::Merged { processed, total });
    });

    enter(on_progress, BuildStage::Writing);
    let pois_written = codec.save(&merged, &settings.target_drive, &mut |pois| {
        on_progress(BuildProgress::Written { pois });
    })?;

    enter(on_progress, BuildStage::Done);
    Ok(BuildReport {
        pois_written,
        categories_written: merged.len(),
        database_path: database_path(&settings.target_drive),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryPoiCodec;
    use crate::provider::test_support::StubProvider;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use speedcam_core::Credentials;
    use tempfile::TempDir;

    struct Drive {
        _tmp: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn drive() -> Drive {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 tempdir");
        Drive { _tmp: tmp, root }
    }

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
    #[case("", "secret", PreconditionError::MissingUsername)]
    #[case("driver", "", PreconditionError::MissingPassword)]
    fn missing_credentials_fail_before_download(
        drive: Drive,
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: PreconditionError,
    ) {
        let provider = StubProvider::with_archive(Vec::new());
        let settings = CameraSettings::new(drive.root.clone(), Credentials::new(username, password));
        let mut events = Vec::new();
        let err = run_build(&provider, &BinaryPoiCodec, &settings, &mut |e| events.push(e))
            .expect_err("precondition");
        assert_eq!(err.to_string(), expected.to_string());
        assert_eq!(provider.fetches(), 0);
        assert_eq!(stages(&events), vec![BuildStage::Failed]);
    }

    #[rstest]
    fn missing_drive_fails_before_download(drive: Drive) {
        let provider = StubProvider::with_archive(Vec::new());
        let settings = CameraSettings::new(
            drive.root.join("not-mounted"),
            Credentials::new("driver", "secret"),
        );
        let err = run_build(&provider, &BinaryPoiCodec, &settings, &mut |_| {})
            .expect_err("missing drive");
        assert!(matches!(
            err,
            BuildError::Precondition(PreconditionError::DriveMissing { .. })
        ));
        assert_eq!(provider.fetches(), 0);
    }

    #[rstest]
    fn manual_archive_does_not_need_a_password(drive: Drive) {
        let settings = CameraSettings::new(drive.root.clone(), Credentials::new("", ""));
        assert!(check_preconditions(&settings, false).is_ok());
        assert!(matches!(
            check_preconditions(&settings, true),
            Err(PreconditionError::MissingUsername)
        ));
    }

    #[rstest]
    fn transport_failure_is_recoverable_and_touches_nothing(drive: Drive) {
        let provider = StubProvider::with_status(500);
        let settings = CameraSettings::new(drive.root.clone(), Credentials::new("driver", "secret"));
        let mut events = Vec::new();
        let err = run_build(&provider, &BinaryPoiCodec, &settings, &mut |e| events.push(e))
            .expect_err("transport failure");
        assert!(err.is_recoverable());
        assert_eq!(
            stages(&events),
            vec![BuildStage::Downloading, BuildStage::Failed]
        );
        assert!(provider.acknowledgments().is_empty());
        assert!(!database_path(&drive.root).exists());
    }

    #[rstest]
    fn corrupt_archive_is_not_recoverable(drive: Drive) {
        let provider = StubProvider::with_archive(b"garbage".to_vec());
        let settings = CameraSettings::new(drive.root.clone(), Credentials::new("driver", "secret"));
        let err = run_build(&provider, &BinaryPoiCodec, &settings, &mut |_| {})
            .expect_err("bad archive");
        assert!(matches!(err, BuildError::Archive(_)));
        assert!(!err.is_recoverable());
        assert_eq!(provider.acknowledgments(), vec![("driver".to_owned(), 7)]);
    }
}
