//! In-memory [`CameraProvider`] for tests.
#![expect(
    clippy::expect_used,
    reason = "a poisoned lock means an earlier test assertion already failed"
)]

use std::io;
use std::sync::Mutex;

use speedcam_core::Credentials;

use super::{CameraProvider, TransportError};

const STUB_URL: &str = "https://stub.invalid/cameras/download";

#[derive(Debug, Clone)]
enum StubResponse {
    Archive(Vec<u8>),
    Status(u16),
    Unreachable,
}

/// Stub provider returning a fixed archive or a fixed failure.
///
/// Every call is recorded so tests can assert on what the build asked for.
///
/// # Example
///
/// ```
/// use speedcam_core::Credentials;
/// use speedcam_data::provider::{CameraProvider, test_support::StubProvider};
///
/// let provider = StubProvider::with_archive(b"PK".to_vec());
/// let bytes = provider.fetch_archive(&Credentials::new("driver", "secret"));
/// assert_eq!(bytes.ok(), Some(b"PK".to_vec()));
/// assert_eq!(provider.fetches(), 1);
/// ```
#[derive(Debug)]
pub struct StubProvider {
    response: StubResponse,
    reject_acknowledgments: bool,
    fetches: Mutex<usize>,
    acknowledgments: Mutex<Vec<(String, usize)>>,
}

impl StubProvider {
    fn from_response(response: StubResponse) -> Self {
        Self {
            response,
            reject_acknowledgments: false,
            fetches: Mutex::new(0),
            acknowledgments: Mutex::new(Vec::new()),
        }
    }

    /// Provider that always returns `archive`.
    #[must_use]
    pub fn with_archive(archive: Vec<u8>) -> Self {
        Self::from_response(StubResponse::Archive(archive))
    }

    /// Provider that always answers with HTTP `status`.
    #[must_use]
    pub fn with_status(status: u16) -> Self {
        Self::from_response(StubResponse::Status(status))
    }

    /// Provider whose server cannot be reached.
    #[must_use]
    pub fn unreachable() -> Self {
        Self::from_response(StubResponse::Unreachable)
    }

    /// Make every acknowledgment fail.
    #[must_use]
    pub const fn rejecting_acknowledgments(mut self) -> Self {
        self.reject_acknowledgments = true;
        self
    }

    /// Number of fetches attempted.
    ///
    /// # Panics
    /// Panics if a previous call panicked while holding the lock.
    #[must_use]
    pub fn fetches(&self) -> usize {
        *self.fetches.lock().expect("fetch counter lock")
    }

    /// `(username, archive length)` for every acknowledgment received.
    ///
    /// # Panics
    /// Panics if a previous call panicked while holding the lock.
    #[must_use]
    pub fn acknowledgments(&self) -> Vec<(String, usize)> {
        self.acknowledgments
            .lock()
            .expect("acknowledgment log lock")
            .clone()
    }
}

impl CameraProvider for StubProvider {
    fn fetch_archive(&self, _credentials: &Credentials) -> Result<Vec<u8>, TransportError> {
        *self.fetches.lock().expect("fetch counter lock") += 1;
        match &self.response {
            StubResponse::Archive(bytes) => Ok(bytes.clone()),
            StubResponse::Status(status) => Err(TransportError::Http {
                url: STUB_URL.to_owned(),
                status: *status,
                message: "stubbed failure".to_owned(),
            }),
            StubResponse::Unreachable => Err(TransportError::Network {
                url: STUB_URL.to_owned(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            }),
        }
    }

    fn acknowledge_archive(&self, username: &str, archive: &[u8]) -> Result<(), TransportError> {
        self.acknowledgments
            .lock()
            .expect("acknowledgment log lock")
            .push((username.to_owned(), archive.len()));
        if self.reject_acknowledgments {
            return Err(TransportError::Http {
                url: STUB_URL.replace("download", "usage"),
                status: 503,
                message: "stubbed acknowledgment failure".to_owned(),
            });
        }
        Ok(())
    }
}
