//! User-supplied build configuration.
//!
//! A [`CameraSettings`] value is built once per build and passed by
//! reference into every pipeline stage.

use std::fmt;

use camino::Utf8PathBuf;

use crate::camera::{CameraCategory, Verification};

/// Provider account credentials.
///
/// The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Construct credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Account password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Which cameras to include and where to write them.
///
/// # Examples
/// ```
/// use speedcam_core::{CameraCategory, CameraSettings, Credentials};
///
/// let settings = CameraSettings {
///     include_mobile: false,
///     ..CameraSettings::new("/media/sdcard", Credentials::new("driver", "secret"))
/// };
/// assert!(settings.includes(CameraCategory::Fixed));
/// assert!(!settings.includes(CameraCategory::Mobile));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraSettings {
    /// Keep fixed cameras.
    pub include_fixed: bool,
    /// Keep mobile enforcement sites.
    pub include_mobile: bool,
    /// Keep average-speed cameras.
    pub include_specs: bool,
    /// Keep red-light cameras.
    pub include_red_light: bool,
    /// Keep cameras whose provider label is not recognised.
    pub include_unrecognised: bool,
    /// Keep cameras the provider has not verified.
    pub include_unverified: bool,
    /// Root of the removable drive holding the device database.
    pub target_drive: Utf8PathBuf,
    /// Provider account.
    pub credentials: Credentials,
}

impl CameraSettings {
    /// Settings that include every camera kind and verification state.
    pub fn new(target_drive: impl Into<Utf8PathBuf>, credentials: Credentials) -> Self {
        Self {
            include_fixed: true,
            include_mobile: true,
            include_specs: true,
            include_red_light: true,
            include_unrecognised: true,
            include_unverified: true,
            target_drive: target_drive.into(),
            credentials,
        }
    }

    /// Whether cameras in `category` are wanted at all.
    #[must_use]
    pub const fn includes(&self, category: CameraCategory) -> bool {
        match category {
            CameraCategory::Fixed => self.include_fixed,
            CameraCategory::Mobile => self.include_mobile,
            CameraCategory::RedLight => self.include_red_light,
            CameraCategory::Specs => self.include_specs,
            CameraCategory::Other => self.include_unrecognised,
        }
    }

    /// Whether a camera with the given verification state is wanted.
    #[must_use]
    pub const fn accepts(&self, verification: Verification) -> bool {
        match verification {
            Verification::Verified => true,
            Verification::Unverified => self.include_unverified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_password() {
        let credentials = Credentials::new("driver", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("driver"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn unverified_cameras_follow_the_flag() {
        let settings = CameraSettings {
            include_unverified: false,
            ..CameraSettings::new("/drive", Credentials::new("u", "p"))
        };
        assert!(settings.accepts(Verification::Verified));
        assert!(!settings.accepts(Verification::Unverified));
    }
}
