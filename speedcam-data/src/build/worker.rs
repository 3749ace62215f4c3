use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};

use crossbeam_channel::{Receiver, unbounded};
use log::debug;
use speedcam_core::CameraSettings;
use thiserror::Error;

use super::{BuildError, BuildProgress, BuildReport, run_build, run_build_with_archive};
use crate::{BinaryPoiCodec, CameraProvider, PoiDatabaseCodec};

/// A build was requested while another was still running.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("a camera database build is already running")]
pub struct BuildRejected;

/// Clears the in-flight flag when the worker thread exits, panicking or not.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Result<Self, BuildRejected> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(Arc::clone(flag)))
            .map_err(|_| BuildRejected)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs builds on a dedicated thread, one at a time.
///
/// There is no cancellation: once started, a build runs to completion or
/// failure.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use speedcam_core::{CameraSettings, Credentials};
/// use speedcam_data::{BuildProgress, BuildWorker};
/// use speedcam_data::provider::test_support::StubProvider;
///
/// let tmp = tempfile::tempdir().expect("tempdir");
/// let drive = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8");
/// let settings = CameraSettings::new(drive, Credentials::new("driver", "secret"));
///
/// let worker = BuildWorker::new(StubProvider::unreachable());
/// let handle = worker.start(settings.clone()).expect("worker idle");
/// let events: Vec<BuildProgress> = handle.progress().iter().collect();
/// let err = handle.wait().expect_err("provider unreachable");
/// assert!(err.is_recoverable());
/// assert!(!events.is_empty());
/// ```
#[derive(Debug)]
pub struct BuildWorker<P, C = BinaryPoiCodec> {
    provider: Arc<P>,
    codec: Arc<C>,
    in_flight: Arc<AtomicBool>,
}

impl<P> BuildWorker<P>
where
    P: CameraProvider + Send + Sync + 'static,
{
    /// Worker writing the shipped binary format.
    pub fn new(provider: P) -> Self {
        Self::with_codec(provider, BinaryPoiCodec)
    }
}

impl<P, C> BuildWorker<P, C>
where
    P: CameraProvider + Send + Sync + 'static,
    C: PoiDatabaseCodec + Send + Sync + 'static,
{
    /// Worker writing through `codec`.
    pub fn with_codec(provider: P, codec: C) -> Self {
        Self {
            provider: Arc::new(provider),
            codec: Arc::new(codec),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a build is currently running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The provider shared with running builds.
    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Start a full build that downloads from the provider.
    ///
    /// # Errors
    ///
    /// Returns [`BuildRejected`] while another build is running.
    pub fn start(&self, settings: CameraSettings) -> Result<BuildHandle, BuildRejected> {
        self.spawn(settings, None)
    }

    /// Start a build from archive bytes obtained without the provider.
    ///
    /// # Errors
    ///
    /// Returns [`BuildRejected`] while another build is running.
    pub fn start_with_archive(
        &self,
        settings: CameraSettings,
        archive: Vec<u8>,
    ) -> Result<BuildHandle, BuildRejected> {
        self.spawn(settings, Some(archive))
    }

    fn spawn(
        &self,
        settings: CameraSettings,
        archive: Option<Vec<u8>>,
    ) -> Result<BuildHandle, BuildRejected> {
        let guard = InFlight::acquire(&self.in_flight)?;
        let provider = Arc::clone(&self.provider);
        let codec = Arc::clone(&self.codec);
        let (sender, progress) = unbounded();

        let thread = spawn(move || {
            let _guard = guard;
            let mut emit = |event: BuildProgress| {
                if sender.send(event).is_err() {
                    debug!("build progress receiver dropped");
                }
            };
            match archive {
                Some(bytes) => {
                    run_build_with_archive(&*provider, &*codec, &settings, &bytes, &mut emit)
                }
                None => run_build(&*provider, &*codec, &settings, &mut emit),
            }
        });

        Ok(BuildHandle { progress, thread })
    }
}

/// A running build.
///
/// The progress channel closes when the build finishes, so iterating
/// [`BuildHandle::progress`] to the end and then calling
/// [`BuildHandle::wait`] never blocks on a finished build.
#[derive(Debug)]
pub struct BuildHandle {
    progress: Receiver<BuildProgress>,
    thread: JoinHandle<Result<BuildReport, BuildError>>,
}

impl BuildHandle {
    /// Progress events in the order they were emitted.
    #[must_use]
    pub const fn progress(&self) -> &Receiver<BuildProgress> {
        &self.progress
    }

    /// Block until the build finishes and return its outcome.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's error, or [`BuildError::WorkerPanicked`] if the
    /// worker thread panicked.
    pub fn wait(self) -> Result<BuildReport, BuildError> {
        self.thread
            .join()
            .unwrap_or(Err(BuildError::WorkerPanicked))
    }
}
