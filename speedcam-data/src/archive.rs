//! Decoder for the provider's camera archive.
//!
//! The archive is a ZIP container holding one CSV file per camera label.
//! The file stem is the label (`Fixed.csv`, `Mobile_Unverified.csv`, ...)
//! and each line is `longitude,latitude[,name[,alert_radius]]`.

use std::io::{Cursor, Read};

use geo::Coord;
use log::debug;
use speedcam_core::{CameraRecord, PointOfInterestError};
use thiserror::Error;
use zip::ZipArchive;
use zip::result::ZipError;

const CSV_SUFFIX: &str = ".csv";
const MAX_FIELDS: usize = 4;

/// Errors raised while decoding a provider archive.
#[derive(Debug, Error)]
pub enum ArchiveFormatError {
    /// The bytes are not a readable ZIP container.
    #[error("archive is not a recognised container: {source}")]
    Container {
        /// Error reported by the ZIP reader.
        #[source]
        source: ZipError,
    },
    /// An entry header could not be read.
    #[error("failed to open archive entry #{index}: {source}")]
    Entry {
        /// Position of the entry in the container.
        index: usize,
        /// Error reported by the ZIP reader.
        #[source]
        source: ZipError,
    },
    /// An entry body was truncated or failed its checksum.
    #[error("failed to read archive entry {entry}: {source}")]
    Read {
        /// Entry name.
        entry: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// An entry body was not valid UTF-8.
    #[error("archive entry {entry} is not valid UTF-8")]
    Encoding {
        /// Entry name.
        entry: String,
    },
    /// A camera file has no category label in its name.
    #[error("archive entry {entry} has no category label")]
    MissingLabel {
        /// Entry name.
        entry: String,
    },
    /// A line could not be parsed into a camera record.
    #[error("{entry} line {line}: {source}")]
    Record {
        /// Entry name.
        entry: String,
        /// 1-based line number.
        line: usize,
        /// What was wrong with the line.
        #[source]
        source: RecordError,
    },
}

/// Problems with a single camera line.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    /// A mandatory field was absent or blank.
    #[error("missing {0}")]
    MissingField(&'static str),
    /// A numeric field failed to parse.
    #[error("invalid {field} {value:?}")]
    InvalidNumber {
        /// Field name.
        field: &'static str,
        /// Raw text of the field.
        value: String,
    },
    /// A quoted field was not closed before the end of the line.
    #[error("unterminated quoted field")]
    UnterminatedQuote,
    /// More fields than the format allows.
    #[error("expected at most {MAX_FIELDS} fields, found {0}")]
    TooManyFields(usize),
    /// Coordinates were out of range.
    #[error(transparent)]
    Location(#[from] PointOfInterestError),
}

/// Decode raw archive bytes into camera records.
///
/// Entries are visited in container order and records keep their line order.
/// Entries that are directories or not `.csv` files are skipped.
///
/// # Examples
/// ```
/// use std::io::Write;
/// use speedcam_data::decode_archive;
/// use zip::{ZipWriter, write::FileOptions};
///
/// let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
/// writer.start_file("Fixed.csv", FileOptions::default()).expect("start entry");
/// writer.write_all(b"-0.1276,51.5072,Trafalgar Square,150\n").expect("write entry");
/// let bytes = writer.finish().expect("finish archive").into_inner();
///
/// let records = decode_archive(&bytes).expect("decode");
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].alert_radius(), Some(150));
/// ```
pub fn decode_archive(bytes: &[u8]) -> Result<Vec<CameraRecord>, ArchiveFormatError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|source| ArchiveFormatError::Container { source })?;

    let mut records = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source| ArchiveFormatError::Entry { index, source })?;
        let name = entry.name().to_owned();
        if entry.is_dir() {
            continue;
        }
        let Some(label) = camera_label(&name) else {
            debug!("skipping non-camera archive entry {name}");
            continue;
        };
        if label.trim().is_empty() {
            return Err(ArchiveFormatError::MissingLabel { entry: name });
        }
        let label = label.to_owned();

        let mut raw = Vec::new();
        entry
            .read_to_end(&mut raw)
            .map_err(|source| ArchiveFormatError::Read {
                entry: name.clone(),
                source,
            })?;
        let text = String::from_utf8(raw).map_err(|_| ArchiveFormatError::Encoding {
            entry: name.clone(),
        })?;

        let before = records.len();
        decode_entry(&name, &label, &text, &mut records)?;
        debug!(
            "decoded {} cameras labelled {label} from {name}",
            records.len() - before
        );
    }
    Ok(records)
}

/// Label carried by a camera file name, or `None` for non-camera entries.
fn camera_label(entry: &str) -> Option<&str> {
    let file_name = entry.rsplit(['/', '\\']).next().unwrap_or(entry);
    let stem_len = file_name.len().checked_sub(CSV_SUFFIX.len())?;
    let suffix = file_name.get(stem_len..)?;
    if !suffix.eq_ignore_ascii_case(CSV_SUFFIX) {
        return None;
    }
    file_name.get(..stem_len)
}

fn decode_entry(
    entry: &str,
    label: &str,
    text: &str,
    records: &mut Vec<CameraRecord>,
) -> Result<(), ArchiveFormatError> {
    let body = text.strip_prefix('\u{feff}').unwrap_or(text);
    for (offset, line) in body.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = parse_record(label, trimmed).map_err(|source| ArchiveFormatError::Record {
            entry: entry.to_owned(),
            line: offset + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(())
}

fn parse_record(label: &str, line: &str) -> Result<CameraRecord, RecordError> {
    let split = split_fields(line)?;
    if split.len() > MAX_FIELDS {
        return Err(RecordError::TooManyFields(split.len()));
    }
    let mut fields = split.into_iter();
    let longitude = parse_coordinate(fields.next(), "longitude")?;
    let latitude = parse_coordinate(fields.next(), "latitude")?;
    let name = fields
        .next()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| label.to_owned());
    let alert_radius = fields
        .next()
        .filter(|radius| !radius.is_empty())
        .map(|radius| {
            radius.parse::<u16>().map_err(|_| RecordError::InvalidNumber {
                field: "alert radius",
                value: radius.clone(),
            })
        })
        .transpose()?;

    let record = CameraRecord::new(
        Coord {
            x: longitude,
            y: latitude,
        },
        label,
        name,
    )?;
    Ok(record.with_alert_radius(alert_radius))
}

fn parse_coordinate(field: Option<String>, name: &'static str) -> Result<f64, RecordError> {
    let raw = field
        .filter(|value| !value.is_empty())
        .ok_or(RecordError::MissingField(name))?;
    raw.parse::<f64>().map_err(|_| RecordError::InvalidNumber {
        field: name,
        value: raw,
    })
}

/// Split a line on commas, honouring double quotes with `""` escapes.
///
/// Unquoted fields are trimmed; quoted fields keep their inner whitespace.
fn split_fields(line: &str) -> Result<Vec<String>, RecordError> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while chars.next_if(|c| *c == ' ' || *c == '\t').is_some() {}
        let mut field = String::new();
        if chars.next_if_eq(&'"').is_some() {
            loop {
                match chars.next() {
                    Some('"') if chars.next_if_eq(&'"').is_some() => field.push('"'),
                    Some('"') => break,
                    Some(c) => field.push(c),
                    None => return Err(RecordError::UnterminatedQuote),
                }
            }
            while chars.next_if(|c| *c != ',').is_some() {}
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                field.push(c);
            }
            let kept = field.trim_end().len();
            field.truncate(kept);
        }
        fields.push(field);
        if chars.next().is_none() {
            return Ok(fields);
        }
    }
}
