//! Test helpers for scratch drives and archive fixtures.

use camino::{Utf8Path, Utf8PathBuf};
use std::io::{Cursor, Write};
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A temporary workspace holding a drive root and local archives.
#[derive(Debug)]
pub(super) struct Workspace {
    _tmp: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        std::fs::create_dir(root.join("drive")).expect("create drive");
        Self { _tmp: tmp, root }
    }

    pub(super) fn drive(&self) -> Utf8PathBuf {
        self.root.join("drive")
    }

    pub(super) fn archive_path(&self) -> Utf8PathBuf {
        self.root.join("cameras.zip")
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write fixture");
}

/// Two verified fixed cameras, one unverified fixed camera and one mobile
/// site.
pub(super) fn sample_archive() -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in [
        ("Fixed.csv", "-0.10,51.50,A1 northbound\n0.20,51.40,A2 eastbound\n"),
        ("Fixed_Unverified.csv", "0.05,51.60,B100 village\n"),
        ("Mobile.csv", "-0.30,51.45,Layby 4\n"),
    ] {
        writer.start_file(name, options).expect("start entry");
        writer.write_all(body.as_bytes()).expect("write entry");
    }
    writer.finish().expect("finish archive").into_inner()
}
