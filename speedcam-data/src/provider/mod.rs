//! Boundary to the remote camera-data provider.
//!
//! The build only needs two things from the provider: the raw archive for an
//! account, and a way to tell the provider that the archive was consumed.
//! [`CameraProvider`] is synchronous so the build can run on a plain worker
//! thread; [`HttpCameraProvider`] bridges to `reqwest` internally.

mod http;

#[doc(hidden)]
pub mod test_support;

use std::io;

use speedcam_core::Credentials;
use thiserror::Error;

pub use http::{
    DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, HttpCameraProvider, HttpCameraProviderConfig,
    ProviderBuildError,
};

/// Transport-level errors encountered while talking to the provider.
///
/// These are the only recoverable build failures: the caller can fall back to
/// an archive obtained by other means.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The server returned an HTTP error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short error description.
        message: String,
    },
    /// The request failed before a response arrived.
    #[error("network error contacting {url}: {source}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// I/O error reported by the transport.
        #[source]
        source: io::Error,
    },
}

/// Source of camera archives.
pub trait CameraProvider {
    /// Download the current archive for the account in `credentials`.
    fn fetch_archive(&self, credentials: &Credentials) -> Result<Vec<u8>, TransportError>;

    /// Tell the provider that `username` consumed `archive`.
    ///
    /// Build orchestration logs failures from this call and carries on.
    fn acknowledge_archive(&self, username: &str, archive: &[u8]) -> Result<(), TransportError>;
}

impl<P: CameraProvider + ?Sized> CameraProvider for std::sync::Arc<P> {
    fn fetch_archive(&self, credentials: &Credentials) -> Result<Vec<u8>, TransportError> {
        (**self).fetch_archive(credentials)
    }

    fn acknowledge_archive(&self, username: &str, archive: &[u8]) -> Result<(), TransportError> {
        (**self).acknowledge_archive(username, archive)
    }
}
