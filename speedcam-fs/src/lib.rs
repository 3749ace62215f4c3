//! Shared filesystem helpers built on `cap-std` and `camino`.
//!
//! Paths arrive from the user as absolute drive roots, so every helper opens
//! its directories with ambient authority and then works relative to them.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Write};
use std::path::Component;

/// What a candidate drive root turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveState {
    /// Nothing exists at the path.
    Missing,
    /// The path exists but is not a directory.
    NotADirectory,
    /// The directory exists but cannot be written to.
    ReadOnly,
    /// The directory exists and accepts writes.
    Writable,
}

/// Classify `path` as a prospective drive root.
///
/// Writability is taken from the directory's permission bits; a mount that
/// advertises write access but rejects it later surfaces as an I/O error on
/// save instead.
pub fn inspect_drive(path: &Utf8Path) -> io::Result<DriveState> {
    let (base, relative) = base_dir_and_relative(path)?;
    let lookup = if relative.as_os_str().is_empty() {
        base.dir_metadata()
    } else {
        base.metadata(&relative)
    };
    let metadata = match lookup {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(DriveState::Missing),
        Err(err) => return Err(err),
    };
    if !metadata.is_dir() {
        return Ok(DriveState::NotADirectory);
    }
    if metadata.permissions().readonly() {
        return Ok(DriveState::ReadOnly);
    }
    Ok(DriveState::Writable)
}

/// Open a UTF-8 file path using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Resolve an ambient directory for the given path and return the directory with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("target should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Return whether a path exists and is a regular file.
///
/// A missing parent directory counts as a missing file.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match open_dir_and_file(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name.as_str()) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Ensure the parent directory for `path` exists, handling absolute paths safely for cap-std.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base_dir, relative) = base_dir_and_relative(parent)?;
    if relative.as_os_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)?;
    Ok(())
}

/// Replace `path` with the bytes produced by `write`.
///
/// The content is written to a temporary file in the destination directory,
/// flushed to disk, then renamed over `path`. If `write` fails the temporary
/// file is removed and the existing file is left untouched. A directory at
/// `path` is reported before `write` runs.
pub fn replace_file<F>(path: &Utf8Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    ensure_parent_dir(path)?;
    if target_is_dir(path)? {
        return Err(io::Error::new(
            io::ErrorKind::IsADirectory,
            format!("{path} is a directory"),
        ));
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".speedcam-")
        .suffix(".tmp")
        .tempfile_in(parent.as_std_path())?;
    {
        let mut writer = io::BufWriter::new(staged.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    staged.as_file().sync_all()?;
    staged.persist(path.as_std_path()).map_err(|err| err.error)?;
    Ok(())
}

fn target_is_dir(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    match dir.metadata(name.as_str()) {
        Ok(meta) => Ok(meta.is_dir()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Split `path` into an ambient base directory and the remainder below it.
///
/// Absolute paths are opened from their root (or Windows prefix); relative
/// paths from the current directory.
pub fn base_dir_and_relative(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();
    let (root, rest) = match std_path.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let prefix_root =
                Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let below = std_path
                .strip_prefix(prefix_root.as_std_path())
                .or_else(|_| std_path.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from drive path"))?
                .to_path_buf();
            (prefix_root, below)
        }
        Some(Component::RootDir) => {
            let fs_root = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let below = std_path
                .strip_prefix(fs_root.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from drive path"))?
                .to_path_buf();
            (fs_root, below)
        }
        _ => (Utf8PathBuf::from("."), std_path.to_path_buf()),
    };

    let dir = fs_utf8::Dir::open_ambient_dir(&root, ambient_authority())?;
    let relative =
        Utf8PathBuf::from_path_buf(rest).map_err(|_| io::Error::other("non-UTF-8 drive path"))?;
    Ok((dir, relative))
}
