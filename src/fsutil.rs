//! Filesystem helpers shared by the writers.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write a file atomically (write-then-rename).
///
/// The temporary file lives next to the target with a `.tmp` suffix, which
/// no CNI config scan treats as a config.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    write_atomic_with_mode(path, contents, None)
}

/// Like [`write_atomic`], but the file is readable by its owner only
/// (`0600` on Unix), from creation of the temporary file onwards.
pub fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    write_atomic_with_mode(path, contents, Some(PRIVATE_MODE))
}

const PRIVATE_MODE: u32 = 0o600;

fn write_atomic_with_mode(path: &Path, contents: &[u8], mode: Option<u32>) -> io::Result<()> {
    let temp_path = temp_path_for(path);

    let result = write_temp(&temp_path, contents, mode)
        .and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

fn write_temp(temp_path: &Path, contents: &[u8], mode: Option<u32>) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if let Some(mode) = mode {
            options.mode(mode);
        }
    }

    let mut file = options.open(temp_path)?;
    // a leftover temp file keeps its old mode, so enforce it explicitly
    restrict_permissions(&file, mode)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(unix)]
fn restrict_permissions(file: &File, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    match mode {
        Some(mode) => file.set_permissions(fs::Permissions::from_mode(mode)),
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
