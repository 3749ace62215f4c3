//! Shared fixtures for the build integration tests.

use std::io::{Cursor, Write};

use camino::Utf8PathBuf;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A scratch directory standing in for the removable drive.
pub struct ScratchDrive {
    _tmp: TempDir,
    /// Drive root.
    pub root: Utf8PathBuf,
}

/// Create an empty scratch drive.
pub fn scratch_drive() -> ScratchDrive {
    let tmp = TempDir::new().expect("create scratch drive");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 tempdir");
    ScratchDrive { _tmp: tmp, root }
}

/// Zip `entries` the way the provider packages its downloads.
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    writer
        .add_directory("cameras/", options)
        .expect("add directory");
    for (name, body) in entries {
        writer.start_file(*name, options).expect("start entry");
        writer.write_all(body.as_bytes()).expect("write entry");
    }
    writer.finish().expect("finish archive").into_inner()
}

/// Three verified fixed cameras, two unverified fixed cameras and one mobile
/// site.
pub fn sample_archive() -> Vec<u8> {
    zip_archive(&[
        (
            "cameras/Fixed.csv",
            "-0.10,51.50,A1 northbound,30\n0.20,51.40,A2 eastbound\n-0.45,51.30,M25 J10\n",
        ),
        (
            "cameras/Fixed_Unverified.csv",
            "0.05,51.60,B100 village\n0.15,51.70,B200 bridge\n",
        ),
        ("cameras/Mobile.csv", "-0.30,51.45,Layby 4\n"),
    ])
}
