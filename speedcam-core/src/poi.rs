use std::cmp::Ordering;

use geo::Coord;
use thiserror::Error;

use crate::CameraRecord;

/// Scale applied before rounding coordinates into a [`Fingerprint`].
///
/// Five decimal places is roughly one metre at the equator.
const FINGERPRINT_SCALE: f64 = 100_000.0;

/// Errors returned when constructing a [`PointOfInterest`] or camera record.
#[derive(Debug, Error, PartialEq)]
pub enum PointOfInterestError {
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("latitude {0} is outside the range -90..=90")]
    InvalidLatitude(f64),
    /// Longitude outside `[-180, 180]` or not finite.
    #[error("longitude {0} is outside the range -180..=180")]
    InvalidLongitude(f64),
    /// The display name was empty.
    #[error("point of interest must have a non-empty name")]
    EmptyName,
}

pub(crate) fn validate_location(location: Coord<f64>) -> Result<(), PointOfInterestError> {
    if !location.y.is_finite() || !(-90.0..=90.0).contains(&location.y) {
        return Err(PointOfInterestError::InvalidLatitude(location.y));
    }
    if !location.x.is_finite() || !(-180.0..=180.0).contains(&location.x) {
        return Err(PointOfInterestError::InvalidLongitude(location.x));
    }
    Ok(())
}

/// A named location on the device.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use speedcam_core::PointOfInterest;
///
/// # fn main() -> Result<(), speedcam_core::PointOfInterestError> {
/// let poi = PointOfInterest::new(Coord { x: -0.1276, y: 51.5072 }, "Trafalgar Square")?
///     .with_alert_radius(Some(150));
/// assert_eq!(poi.latitude(), 51.5072);
/// assert_eq!(poi.alert_radius(), Some(150));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    location: Coord<f64>,
    name: String,
    description: Option<String>,
    alert_radius: Option<u16>,
}

impl PointOfInterest {
    /// Validate and construct a [`PointOfInterest`].
    ///
    /// # Errors
    ///
    /// Returns [`PointOfInterestError`] when the location is outside WGS84
    /// bounds or `name` is blank.
    pub fn new(location: Coord<f64>, name: impl Into<String>) -> Result<Self, PointOfInterestError> {
        validate_location(location)?;
        let owned = name.into();
        if owned.trim().is_empty() {
            return Err(PointOfInterestError::EmptyName);
        }
        Ok(Self {
            location,
            name: owned,
            description: None,
            alert_radius: None,
        })
    }

    /// Convert a validated camera record, keeping its label as the
    /// description.
    pub(crate) fn from_camera(record: CameraRecord) -> Self {
        Self {
            location: record.location(),
            name: record.name().to_owned(),
            description: Some(record.label().to_owned()),
            alert_radius: record.alert_radius(),
        }
    }

    /// Attach a description or subtype tag.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
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

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.location.y
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.location.x
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional description or subtype tag.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Optional proximity-alert radius in metres.
    #[must_use]
    pub const fn alert_radius(&self) -> Option<u16> {
        self.alert_radius
    }

    /// Identity used for duplicate detection within a category.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            latitude: round_coordinate(self.location.y),
            longitude: round_coordinate(self.location.x),
            name: self.name.clone(),
        }
    }

    /// Canonical ordering: latitude, longitude, name, then the optional
    /// fields so that the order is total.
    #[must_use]
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.location
            .y
            .total_cmp(&other.location.y)
            .then_with(|| self.location.x.total_cmp(&other.location.x))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.description.cmp(&other.description))
            .then_with(|| self.alert_radius.cmp(&other.alert_radius))
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    reason = "validated coordinates scaled by 1e5 fit comfortably in i64"
)]
fn round_coordinate(value: f64) -> i64 {
    (value * FINGERPRINT_SCALE).round() as i64
}

/// Rounded latitude, rounded longitude and exact name of a POI.
///
/// Two POIs in the same category with equal fingerprints are duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    latitude: i64,
    longitude: i64,
    name: String,
}

/// Case-folded form of a category name.
///
/// Category names are unique within a database ignoring case, using full
/// Unicode lowercasing. Every comparison of category names goes through this
/// key.
#[must_use]
pub fn category_name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Whether two category names are equal ignoring case.
#[must_use]
pub fn category_names_match(left: &str, right: &str) -> bool {
    category_name_key(left) == category_name_key(right)
}

/// A named, ordered group of POIs sharing display and alert behaviour.
///
/// Names compare case-insensitively when checking for uniqueness. Membership
/// is fixed at construction; only the merge engine rewrites it.
///
/// # Examples
/// ```
/// use speedcam_core::PointOfInterestCategory;
///
/// let favourites = PointOfInterestCategory::new("My Favorites", Vec::new())
///     .with_icon(Some("star".into()));
/// assert!(favourites.has_name("my favorites"));
/// assert!(favourites.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterestCategory {
    name: String,
    icon: Option<String>,
    alert_sound: Option<String>,
    pois: Vec<PointOfInterest>,
}

impl PointOfInterestCategory {
    /// Construct a category holding `pois` in the given order.
    pub fn new(name: impl Into<String>, pois: Vec<PointOfInterest>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            alert_sound: None,
            pois,
        }
    }

    /// Set the icon identifier.
    #[must_use]
    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon;
        self
    }

    /// Set the alert-sound identifier.
    #[must_use]
    pub fn with_alert_sound(mut self, alert_sound: Option<String>) -> Self {
        self.alert_sound = alert_sound;
        self
    }

    /// Category name, unique within a database.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this category is called `name`, ignoring case.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        category_names_match(&self.name, name)
    }

    /// The name folded by [`category_name_key`].
    #[must_use]
    pub fn name_key(&self) -> String {
        category_name_key(&self.name)
    }

    /// Icon identifier, if any.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Alert-sound identifier, if any.
    #[must_use]
    pub fn alert_sound(&self) -> Option<&str> {
        self.alert_sound.as_deref()
    }

    /// Members in order.
    #[must_use]
    pub fn pois(&self) -> &[PointOfInterest] {
        &self.pois
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pois.len()
    }

    /// Whether the category has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    pub(crate) fn pois_mut(&mut self) -> &mut Vec<PointOfInterest> {
        &mut self.pois
    }
}
