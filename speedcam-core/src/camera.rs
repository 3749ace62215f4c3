//! Raw camera records and the fixed set of camera categories.
//!
//! Provider labels are free-form strings. [`CameraKind::from_label`] and
//! [`Verification::from_label`] turn them into the closed vocabulary used by
//! the normaliser; labels that match nothing are kept verbatim as
//! [`CameraKind::Unrecognised`] so new provider data is never discarded.
//!
//! # Examples
//! ```
//! use speedcam_core::{CameraCategory, CameraKind, Verification};
//!
//! assert_eq!(CameraKind::from_label("RedLight_Unverified"), CameraKind::RedLight);
//! assert_eq!(Verification::from_label("RedLight_Unverified"), Verification::Unverified);
//! assert_eq!(CameraKind::Specs.category().name(), "Average Speed Cameras");
//! assert_eq!(CameraCategory::from_name("fixed cameras"), Some(CameraCategory::Fixed));
//! ```

use geo::Coord;

use crate::poi::{PointOfInterestError, category_names_match, validate_location};

/// Alert sound shared by every camera-managed category.
pub const CAMERA_ALERT_SOUND: &str = "camera-alert";

/// Whether the provider has confirmed a camera's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verification {
    /// Confirmed by the provider.
    Verified,
    /// Reported but not yet confirmed.
    Unverified,
}

impl Verification {
    /// Derive the verification state from a provider label.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label.to_lowercase().contains("unverified") {
            Self::Unverified
        } else {
            Self::Verified
        }
    }
}

/// Enforcement type of a camera as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CameraKind {
    /// Permanently installed speed camera.
    Fixed,
    /// Mobile enforcement site.
    Mobile,
    /// Average-speed (SPECS) camera pair.
    Specs,
    /// Red-light camera.
    RedLight,
    /// Provider label that does not map to a known kind.
    Unrecognised(String),
}

impl CameraKind {
    /// Classify a provider label.
    ///
    /// Matching is case-insensitive and looks for keywords anywhere in the
    /// label, so `"UK_Mobile_Unverified"` is a mobile camera.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let lowered = label.to_lowercase();
        if lowered.contains("mobile") {
            Self::Mobile
        } else if ["redlight", "red_light", "red-light", "red light"]
            .iter()
            .any(|needle| lowered.contains(needle))
        {
            Self::RedLight
        } else if lowered.contains("specs") || lowered.contains("average") {
            Self::Specs
        } else if lowered.contains("fixed") || lowered.contains("gatso") {
            Self::Fixed
        } else {
            Self::Unrecognised(label.to_owned())
        }
    }

    /// Category this kind is grouped into.
    #[must_use]
    pub const fn category(&self) -> CameraCategory {
        match self {
            Self::Fixed => CameraCategory::Fixed,
            Self::Mobile => CameraCategory::Mobile,
            Self::Specs => CameraCategory::Specs,
            Self::RedLight => CameraCategory::RedLight,
            Self::Unrecognised(_) => CameraCategory::Other,
        }
    }
}

/// Categories owned by this tool on the device.
///
/// Declaration order is the canonical output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CameraCategory {
    /// "Fixed Cameras".
    Fixed,
    /// "Mobile Cameras".
    Mobile,
    /// "Red Light Cameras".
    RedLight,
    /// "Average Speed Cameras".
    Specs,
    /// "Other Cameras", holding unrecognised provider labels.
    Other,
}

impl CameraCategory {
    /// Every camera category in canonical order.
    pub const ALL: [Self; 5] = [
        Self::Fixed,
        Self::Mobile,
        Self::RedLight,
        Self::Specs,
        Self::Other,
    ];

    /// Category name as written to the device.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fixed => "Fixed Cameras",
            Self::Mobile => "Mobile Cameras",
            Self::RedLight => "Red Light Cameras",
            Self::Specs => "Average Speed Cameras",
            Self::Other => "Other Cameras",
        }
    }

    /// Icon identifier for the category.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Fixed => "speedcam-fixed",
            Self::Mobile => "speedcam-mobile",
            Self::RedLight => "speedcam-redlight",
            Self::Specs => "speedcam-specs",
            Self::Other => "speedcam-other",
        }
    }

    /// Look up a camera category by its device name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category_names_match(category.name(), name))
    }
}

impl std::fmt::Display for CameraCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A camera decoded from the provider archive, before filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRecord {
    location: Coord<f64>,
    kind: CameraKind,
    verification: Verification,
    label: String,
    name: String,
    alert_radius: Option<u16>,
}

impl CameraRecord {
    /// Validate and construct a record.
    ///
    /// Kind and verification are derived from `label`. Coordinates use
    /// `x = longitude` and `y = latitude`.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use speedcam_core::{CameraKind, CameraRecord, Verification};
    ///
    /// # fn main() -> Result<(), speedcam_core::PointOfInterestError> {
    /// let record = CameraRecord::new(Coord { x: -1.5, y: 52.1 }, "Fixed", "A14 J20")?;
    /// assert_eq!(record.kind(), &CameraKind::Fixed);
    /// assert_eq!(record.verification(), Verification::Verified);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        location: Coord<f64>,
        label: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, PointOfInterestError> {
        validate_location(location)?;
        let label = label.into();
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PointOfInterestError::EmptyName);
        }
        Ok(Self {
            location,
            kind: CameraKind::from_label(&label),
            verification: Verification::from_label(&label),
            label,
            name,
            alert_radius: None,
        })
    }

    /// Attach a proximity-alert radius in metres.
    #[must_use]
    pub fn with_alert_radius(mut self, radius: Option<u16>) -> Self {
        self.alert_radius = radius;
        self
    }

    /// Position with `x = longitude`, `y = latitude`.
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        self.location
    }

    /// Camera kind derived from the label.
    #[must_use]
    pub const fn kind(&self) -> &CameraKind {
        &self.kind
    }

    /// Verification state derived from the label.
    #[must_use]
    pub const fn verification(&self) -> Verification {
        self.verification
    }

    /// Raw provider label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional proximity-alert radius in metres.
    #[must_use]
    pub const fn alert_radius(&self) -> Option<u16> {
        self.alert_radius
    }
}
