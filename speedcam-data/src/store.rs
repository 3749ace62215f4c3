//! On-device POI database.
//!
//! The database lives at `<drive>/PersonalPOI/speedcam.pdb` and holds every
//! category on the device, camera-managed or not. The layout is a versioned
//! `bincode` stream with fixed-width little-endian integers:
//!
//! ```text
//! magic "SPDB", version u16, category count u32
//! per category: name, icon?, alert sound?, POI count u32
//! per POI: longitude f64, latitude f64, name, description?, alert radius u16?
//! ```
//!
//! Strings are a `u64` length followed by UTF-8 bytes; `?` marks an option
//! tag byte followed by the value when present.

use std::collections::HashSet;
use std::io::{self, Read};

use bincode::Options;
use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use speedcam_core::{
    PointOfInterest, PointOfInterestCategory, PointOfInterestError, category_name_key,
};
use thiserror::Error;

/// File identifier at the start of every database.
pub const DATABASE_MAGIC: [u8; 4] = *b"SPDB";

/// Newest format version this build reads and the one it writes.
pub const DATABASE_VERSION: u16 = 1;

/// Directory under the drive root holding the database.
pub const DATABASE_DIR: &str = "PersonalPOI";

/// Database file name.
pub const DATABASE_FILE: &str = "speedcam.pdb";

/// Number of POIs written between progress callbacks.
pub const PROGRESS_INTERVAL: usize = 64;

/// Location of the database on `drive`.
#[must_use]
pub fn database_path(drive: &Utf8Path) -> Utf8PathBuf {
    drive.join(DATABASE_DIR).join(DATABASE_FILE)
}

/// The database could not be read or failed validation.
#[derive(Debug, Error)]
pub enum StoreReadError {
    /// No database exists at the expected location.
    #[error("no POI database at {path}")]
    Missing {
        /// Expected database location.
        path: Utf8PathBuf,
    },
    /// Reading the file failed.
    #[error("failed to read POI database {path}: {source}")]
    Io {
        /// Database location.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file does not start with the database magic.
    #[error("{path} is not a POI database: expected magic {expected:?}, found {found:?}")]
    InvalidMagic {
        /// Database location.
        path: Utf8PathBuf,
        /// Expected byte sequence.
        expected: [u8; 4],
        /// Bytes read from the file, zero-padded when the file is shorter.
        found: [u8; 4],
    },
    /// A section was truncated or malformed.
    #[error("failed to decode POI database {path}: {source}")]
    Decode {
        /// Database location.
        path: Utf8PathBuf,
        /// Decoder error returned by `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// Two categories share a name, ignoring case.
    #[error("POI database {path} lists category {name:?} more than once")]
    DuplicateCategory {
        /// Database location.
        path: Utf8PathBuf,
        /// Repeated category name.
        name: String,
    },
    /// The header carries a version no build has written.
    #[error("POI database {path} has invalid version {found}")]
    InvalidVersion {
        /// Database location.
        path: Utf8PathBuf,
        /// Version present in the file header.
        found: u16,
    },
    /// A stored POI has out-of-range coordinates or a blank name.
    #[error("POI database {path} holds an invalid POI in category {category:?}: {source}")]
    InvalidPoi {
        /// Database location.
        path: Utf8PathBuf,
        /// Category holding the POI.
        category: String,
        /// Validation failure.
        #[source]
        source: PointOfInterestError,
    },
    /// Bytes remain after the last declared category.
    #[error("POI database {path} has {remaining} unexpected trailing bytes")]
    TrailingBytes {
        /// Database location.
        path: Utf8PathBuf,
        /// Number of unread bytes.
        remaining: usize,
    },
}

/// The database was written by a newer format version.
#[derive(Debug, Error)]
#[error("POI database {path} has version {found}; supported version is {supported}")]
pub struct StoreVersionError {
    /// Database location.
    pub path: Utf8PathBuf,
    /// Version present in the file header.
    pub found: u16,
    /// Version supported by this build.
    pub supported: u16,
}

/// Errors raised when loading the database.
#[derive(Debug, Error)]
pub enum StoreLoadError {
    /// The file was absent, unreadable or corrupt.
    #[error(transparent)]
    Read(#[from] StoreReadError),
    /// The file uses an unsupported format version.
    #[error(transparent)]
    Version(#[from] StoreVersionError),
}

impl StoreLoadError {
    /// Whether the failure was simply that no database exists yet.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Read(StoreReadError::Missing { .. }))
    }
}

/// Errors raised when saving the database.
#[derive(Debug, Error)]
pub enum StoreWriteError {
    /// Writing or renaming the file failed.
    #[error("failed to write POI database {path}: {source}")]
    Io {
        /// Destination location.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Two categories share a name, ignoring case.
    #[error("cannot store category {name:?} twice in {path}")]
    DuplicateCategory {
        /// Destination location.
        path: Utf8PathBuf,
        /// Repeated category name.
        name: String,
    },
    /// A count does not fit the format's 32-bit fields.
    #[error("cannot store {count} {what} in {path}")]
    Capacity {
        /// Destination location.
        path: Utf8PathBuf,
        /// What overflowed.
        what: &'static str,
        /// Offending count.
        count: usize,
    },
}

/// Reads and writes the complete category set on a drive.
///
/// Implementations must preserve category order and POI order exactly and
/// must leave the previous database intact when a save fails.
pub trait PoiDatabaseCodec {
    /// Load every category from the database on `drive`, in file order.
    fn load(&self, drive: &Utf8Path) -> Result<Vec<PointOfInterestCategory>, StoreLoadError>;

    /// Replace the database on `drive` with `categories`.
    ///
    /// `on_progress` receives the running count of POIs handed to the file.
    /// Returns the total number of POIs written.
    fn save(
        &self,
        categories: &[PointOfInterestCategory],
        drive: &Utf8Path,
        on_progress: &mut dyn FnMut(usize),
    ) -> Result<usize, StoreWriteError>;
}

/// The shipped `SPDB` codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryPoiCodec;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    magic: [u8; 4],
    version: u16,
    categories: u32,
}

#[derive(Debug, Serialize)]
struct CategoryHeaderRef<'a> {
    name: &'a str,
    icon: Option<&'a str>,
    alert_sound: Option<&'a str>,
    pois: u32,
}

#[derive(Debug, Deserialize)]
struct CategoryHeader {
    name: String,
    icon: Option<String>,
    alert_sound: Option<String>,
    pois: u32,
}

#[derive(Debug, Serialize)]
struct PoiRecordRef<'a> {
    longitude: f64,
    latitude: f64,
    name: &'a str,
    description: Option<&'a str>,
    alert_radius: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct PoiRecord {
    longitude: f64,
    latitude: f64,
    name: String,
    description: Option<String>,
    alert_radius: Option<u16>,
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
}

impl PoiDatabaseCodec for BinaryPoiCodec {
    fn load(&self, drive: &Utf8Path) -> Result<Vec<PointOfInterestCategory>, StoreLoadError> {
        let path = database_path(drive);
        let bytes = read_database(&path)?;
        let categories = decode(&path, &bytes)?;
        info!("loaded {} categories from {path}", categories.len());
        Ok(categories)
    }

    fn save(
        &self,
        categories: &[PointOfInterestCategory],
        drive: &Utf8Path,
        on_progress: &mut dyn FnMut(usize),
    ) -> Result<usize, StoreWriteError> {
        let path = database_path(drive);
        let layout = plan_layout(&path, categories)?;
        let mut written = 0_usize;
        speedcam_fs::replace_file(&path, |writer| {
            written = write_sections(writer, categories, &layout, on_progress)?;
            Ok(())
        })
        .map_err(|source| StoreWriteError::Io {
            path: path.clone(),
            source,
        })?;
        info!("wrote {written} POIs in {} categories to {path}", categories.len());
        Ok(written)
    }
}

/// Load the database on `drive` with [`BinaryPoiCodec`].
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use speedcam_data::load_categories;
///
/// match load_categories(Utf8Path::new("/media/sdcard")) {
///     Ok(categories) => println!("{} categories on the device", categories.len()),
///     Err(err) if err.is_missing() => println!("no database yet"),
///     Err(err) => eprintln!("{err}"),
/// }
/// ```
pub fn load_categories(drive: &Utf8Path) -> Result<Vec<PointOfInterestCategory>, StoreLoadError> {
    BinaryPoiCodec.load(drive)
}

/// Save `categories` to `drive` with [`BinaryPoiCodec`].
pub fn save_categories<F>(
    categories: &[PointOfInterestCategory],
    drive: &Utf8Path,
    mut on_progress: F,
) -> Result<usize, StoreWriteError>
where
    F: FnMut(usize),
{
    BinaryPoiCodec.save(categories, drive, &mut on_progress)
}

fn read_database(path: &Utf8Path) -> Result<Vec<u8>, StoreReadError> {
    let mut file = match speedcam_fs::open_utf8_file(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(StoreReadError::Missing {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(StoreReadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| StoreReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(bytes)
}

fn decode(path: &Utf8Path, bytes: &[u8]) -> Result<Vec<PointOfInterestCategory>, StoreLoadError> {
    let mut found = [0_u8; 4];
    for (slot, byte) in found.iter_mut().zip(bytes) {
        *slot = *byte;
    }
    if bytes.len() < DATABASE_MAGIC.len() || found != DATABASE_MAGIC {
        return Err(StoreReadError::InvalidMagic {
            path: path.to_path_buf(),
            expected: DATABASE_MAGIC,
            found,
        }
        .into());
    }

    let limit = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    let mut reader = bytes;
    let decode_error = |source| StoreReadError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let header: Header = options()
        .with_limit(limit)
        .deserialize_from(&mut reader)
        .map_err(decode_error)?;
    if header.version > DATABASE_VERSION {
        return Err(StoreVersionError {
            path: path.to_path_buf(),
            found: header.version,
            supported: DATABASE_VERSION,
        }
        .into());
    }
    if header.version == 0 {
        return Err(StoreReadError::InvalidVersion {
            path: path.to_path_buf(),
            found: header.version,
        }
        .into());
    }

    let mut seen = HashSet::new();
    let mut categories = Vec::new();
    for _ in 0..header.categories {
        let category: CategoryHeader = options()
            .with_limit(limit)
            .deserialize_from(&mut reader)
            .map_err(decode_error)?;
        if !seen.insert(category_name_key(&category.name)) {
            return Err(StoreReadError::DuplicateCategory {
                path: path.to_path_buf(),
                name: category.name,
            }
            .into());
        }

        let mut pois = Vec::new();
        for _ in 0..category.pois {
            let record: PoiRecord = options()
                .with_limit(limit)
                .deserialize_from(&mut reader)
                .map_err(decode_error)?;
            let poi = PointOfInterest::new(
                Coord {
                    x: record.longitude,
                    y: record.latitude,
                },
                record.name,
            )
            .map_err(|source| StoreReadError::InvalidPoi {
                path: path.to_path_buf(),
                category: category.name.clone(),
                source,
            })?
            .with_description(record.description)
            .with_alert_radius(record.alert_radius);
            pois.push(poi);
        }
        debug!("read {} POIs in category '{}'", pois.len(), category.name);
        categories.push(
            PointOfInterestCategory::new(category.name, pois)
                .with_icon(category.icon)
                .with_alert_sound(category.alert_sound),
        );
    }

    if !reader.is_empty() {
        return Err(StoreReadError::TrailingBytes {
            path: path.to_path_buf(),
            remaining: reader.len(),
        }
        .into());
    }
    Ok(categories)
}

/// Section counts checked against the format before any byte is written.
struct Layout {
    categories: u32,
    pois: Vec<u32>,
}

fn plan_layout(
    path: &Utf8Path,
    categories: &[PointOfInterestCategory],
) -> Result<Layout, StoreWriteError> {
    let count = |what, len: usize| {
        u32::try_from(len).map_err(|_| StoreWriteError::Capacity {
            path: path.to_path_buf(),
            what,
            count: len,
        })
    };

    let mut seen = HashSet::with_capacity(categories.len());
    let mut pois = Vec::with_capacity(categories.len());
    for category in categories {
        if !seen.insert(category.name_key()) {
            return Err(StoreWriteError::DuplicateCategory {
                path: path.to_path_buf(),
                name: category.name().to_owned(),
            });
        }
        pois.push(count("POIs in one category", category.len())?);
    }
    Ok(Layout {
        categories: count("categories", categories.len())?,
        pois,
    })
}

fn write_sections(
    writer: &mut dyn io::Write,
    categories: &[PointOfInterestCategory],
    layout: &Layout,
    on_progress: &mut dyn FnMut(usize),
) -> io::Result<usize> {
    let header = Header {
        magic: DATABASE_MAGIC,
        version: DATABASE_VERSION,
        categories: layout.categories,
    };
    write_record(writer, &header)?;

    let mut written = 0_usize;
    for (category, &pois) in categories.iter().zip(&layout.pois) {
        let section = CategoryHeaderRef {
            name: category.name(),
            icon: category.icon(),
            alert_sound: category.alert_sound(),
            pois,
        };
        write_record(writer, &section)?;
        for poi in category.pois() {
            let record = PoiRecordRef {
                longitude: poi.longitude(),
                latitude: poi.latitude(),
                name: poi.name(),
                description: poi.description(),
                alert_radius: poi.alert_radius(),
            };
            write_record(writer, &record)?;
            written += 1;
            if written.is_multiple_of(PROGRESS_INTERVAL) {
                on_progress(written);
            }
        }
    }
    if !written.is_multiple_of(PROGRESS_INTERVAL) {
        on_progress(written);
    }
    Ok(written)
}

fn write_record<T: Serialize>(writer: &mut dyn io::Write, value: &T) -> io::Result<()> {
    options()
        .serialize_into(&mut *writer, value)
        .map_err(|err| match *err {
            bincode::ErrorKind::Io(source) => source,
            other => io::Error::other(other),
        })
}
