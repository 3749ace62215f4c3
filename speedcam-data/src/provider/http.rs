//! HTTP implementation of [`CameraProvider`].
//!
//! The provider owns a current-thread Tokio runtime and blocks on it for each
//! request, so callers never need an async context.

use std::io;
use std::time::Duration;

use log::debug;
use reqwest::Client;
use speedcam_core::Credentials;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::{CameraProvider, TransportError};

/// Default user agent for provider requests.
pub const DEFAULT_USER_AGENT: &str = "speedcam/0.1";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const DOWNLOAD_PATH: &str = "/cameras/download";
const USAGE_PATH: &str = "/cameras/usage";

/// Error type for [`HttpCameraProvider`] construction failures.
#[derive(Debug)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// Failed to build the Tokio runtime.
    Runtime(io::Error),
}

impl std::fmt::Display for ProviderBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::Runtime(err) => write!(f, "failed to build Tokio runtime: {err}"),
        }
    }
}

impl std::error::Error for ProviderBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::Runtime(err) => Some(err),
        }
    }
}

/// Configuration for [`HttpCameraProvider`].
#[derive(Debug, Clone)]
pub struct HttpCameraProviderConfig {
    /// Base URL of the provider, without a trailing slash.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl HttpCameraProviderConfig {
    /// Create a configuration for the provider at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let raw = base_url.into();
        Self {
            base_url: raw.trim_end_matches('/').to_owned(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Camera provider reached over HTTP.
///
/// The archive is fetched with `POST {base}/cameras/download` carrying the
/// account as form fields. Consumption is acknowledged with
/// `POST {base}/cameras/usage?username=...` carrying the archive as the body.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the provider blocks on its own runtime. Inside a
/// multi-threaded runtime it uses [`tokio::task::block_in_place`] on the
/// caller's handle. Inside a `current_thread` runtime it falls back to its own
/// runtime.
pub struct HttpCameraProvider {
    client: Client,
    config: HttpCameraProviderConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpCameraProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCameraProvider")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpCameraProvider {
    /// Create a provider with default timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(HttpCameraProviderConfig::new(base_url))
    }

    /// Create a provider with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: HttpCameraProviderConfig) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    fn download_url(&self) -> String {
        format!("{}{DOWNLOAD_PATH}", self.config.base_url)
    }

    fn usage_url(&self) -> String {
        format!("{}{USAGE_PATH}", self.config.base_url)
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }

    async fn fetch_async(&self, credentials: &Credentials) -> Result<Vec<u8>, TransportError> {
        let url = self.download_url();
        let form = [
            ("username", credentials.username()),
            ("password", credentials.password()),
        ];
        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(&err, &url))?;
        let body = response
            .bytes()
            .await
            .map_err(|err| convert_reqwest_error(&err, &url))?;
        debug!("downloaded {} byte camera archive from {url}", body.len());
        Ok(body.to_vec())
    }

    async fn acknowledge_async(&self, username: &str, archive: &[u8]) -> Result<(), TransportError> {
        let url = self.usage_url();
        self.client
            .post(&url)
            .query(&[("username", username)])
            .body(archive.to_vec())
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(&err, &url))?;
        Ok(())
    }
}

impl CameraProvider for HttpCameraProvider {
    fn fetch_archive(&self, credentials: &Credentials) -> Result<Vec<u8>, TransportError> {
        self.block_on(self.fetch_async(credentials))
    }

    fn acknowledge_archive(&self, username: &str, archive: &[u8]) -> Result<(), TransportError> {
        self.block_on(self.acknowledge_async(username, archive))
    }
}

fn convert_reqwest_error(error: &reqwest::Error, url: &str) -> TransportError {
    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    let kind = if error.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    TransportError::Network {
        url: url.to_owned(),
        source: io::Error::new(kind, error.to_string()),
    }
}
