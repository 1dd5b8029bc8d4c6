//! Platform-specific file operations.

use crate::error::Result;
use log::{debug, trace};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[cfg(unix)]
use nix::unistd::{AccessFlags, access};

/// Mode applied to the staged executable.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Make a file executable by setting its mode to 0755 (Unix only)
#[cfg(unix)]
pub fn make_executable(path: &Path) -> std::io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
}

/// Make a file executable (Windows - no-op)
#[cfg(windows)]
pub fn make_executable(path: &Path) -> std::io::Result<()> {
    // Windows determines executability by file extension
    fs::metadata(path).map(|_| ())
}

/// Check if a file is executable
#[cfg(unix)]
pub fn is_executable(path: &Path) -> std::io::Result<bool> {
    let metadata = fs::metadata(path)?;
    Ok(metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(windows)]
pub fn is_executable(path: &Path) -> std::io::Result<bool> {
    let metadata = fs::metadata(path)?;
    Ok(metadata.is_file() && path.extension().map(|ext| ext == "exe").unwrap_or(false))
}

/// Check whether the current user may read and write the path.
#[cfg(unix)]
pub fn is_accessible(path: &Path) -> bool {
    access(path, AccessFlags::R_OK | AccessFlags::W_OK).is_ok()
}

#[cfg(windows)]
pub fn is_accessible(path: &Path) -> bool {
    fs::metadata(path)
        .map(|metadata| !metadata.permissions().readonly())
        .unwrap_or(false)
}

/// Apply permission bits recorded in an archive entry.
#[cfg(unix)]
pub fn set_permissions_from_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(windows)]
pub fn set_permissions_from_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

/// Atomically rename a file from source to destination.
///
/// On Unix systems, rename is atomic by default.
/// On Windows, we need to remove the destination file first if it exists,
/// as Windows rename fails if the destination already exists.
pub fn atomic_rename(from: &Path, to: &Path) -> std::io::Result<()> {
    #[cfg(windows)]
    {
        if to.exists() {
            fs::remove_file(to)?;
        }
    }

    fs::rename(from, to)
}

/// Delete a directory tree, children before parents.
///
/// Symlinks are removed, never followed. A missing path is not an error.
pub fn remove_dir_tree(path: &Path) -> Result<()> {
    if fs::symlink_metadata(path).is_err() {
        return Ok(());
    }

    debug!("Removing directory tree {}", path.display());
    for entry in WalkDir::new(path).contents_first(true) {
        let entry = entry?;
        trace!("Removing {}", entry.path().display());
        if entry.file_type().is_dir() {
            fs::remove_dir(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Remove a file if it is present, reporting whether anything was deleted.
pub fn remove_file_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
