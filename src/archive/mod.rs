// Copyright 2025 dentsusoken
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Archive extraction for downloaded tunnel binaries.
//!
//! Zip is what the distribution publishes today; gzip-compressed tarballs are
//! accepted as well. Entries that would land outside the destination are
//! rejected before anything is written.

use crate::error::{Result, TunnelError};
use crate::platform::file_ops;
use log::{debug, info};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::Archive as TarArchive;
use zip::ZipArchive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    TarGz,
    Zip,
}

/// Extract `archive_path` into `destination`, creating it if needed.
pub fn extract_archive(archive_path: &Path, destination: &Path) -> Result<()> {
    fs::create_dir_all(destination)?;

    let archive_type = detect_archive_type(archive_path)?;
    debug!("Extracting {archive_type:?} archive {}", archive_path.display());

    match archive_type {
        ArchiveType::TarGz => extract_tar_gz(archive_path, destination),
        ArchiveType::Zip => extract_zip(archive_path, destination),
    }
}

pub fn detect_archive_type(path: &Path) -> Result<ArchiveType> {
    let path_str = path.to_string_lossy().to_lowercase();
    if path_str.ends_with(".tar.gz") || path_str.ends_with(".tgz") {
        return Ok(ArchiveType::TarGz);
    }
    if path_str.ends_with(".zip") {
        return Ok(ArchiveType::Zip);
    }

    detect_by_content(path)
}

fn detect_by_content(path: &Path) -> Result<ArchiveType> {
    let mut file = File::open(path)?;
    let mut magic_bytes = [0u8; 4];
    file.read_exact(&mut magic_bytes).map_err(|_| {
        TunnelError::Extract(format!(
            "Cannot read file to determine archive type: {path:?}"
        ))
    })?;

    match magic_bytes {
        [0x1f, 0x8b, ..] => Ok(ArchiveType::TarGz),
        [0x50, 0x4b, 0x03 | 0x05 | 0x07, _] => Ok(ArchiveType::Zip),
        _ => Err(TunnelError::Extract(format!(
            "Unsupported archive format, expected zip or tar.gz: {path:?}"
        ))),
    }
}

fn tar_error(archive_path: &Path, e: std::io::Error) -> TunnelError {
    TunnelError::Extract(format!("{}: {e}", archive_path.display()))
}

fn extract_tar_gz(archive_path: &Path, destination: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let gz = flate2::read::GzDecoder::new(file);
    let mut archive = TarArchive::new(gz);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    let mut extracted_count = 0usize;
    for entry in archive.entries().map_err(|e| tar_error(archive_path, e))? {
        let mut entry = entry.map_err(|e| tar_error(archive_path, e))?;
        let path = entry
            .path()
            .map_err(|e| tar_error(archive_path, e))?
            .into_owned();
        validate_entry_path(&path)?;

        let dest_path = destination.join(&path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        entry
            .unpack(&dest_path)
            .map_err(|e| tar_error(archive_path, e))?;
        extracted_count += 1;
    }

    if extracted_count == 0 {
        return Err(TunnelError::Extract(format!(
            "Archive is empty: {}",
            archive_path.display()
        )));
    }

    info!("Extracted {extracted_count} entries from tar.gz archive");
    Ok(())
}

fn extract_zip(archive_path: &Path, destination: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    if archive.is_empty() {
        return Err(TunnelError::Extract(format!(
            "Archive is empty: {}",
            archive_path.display()
        )));
    }

    let total_files = archive.len();
    for i in 0..total_files {
        let mut file = archive.by_index(i)?;

        // `enclosed_name` already refuses escaping names; check the raw name so
        // such entries fail loudly instead of being skipped.
        let raw_name = PathBuf::from(file.name());
        validate_entry_path(&raw_name)?;
        let Some(relative) = file.enclosed_name() else {
            return Err(TunnelError::SecurityError(format!(
                "Archive entry has an unsafe name: {raw_name:?}"
            )));
        };
        let outpath = destination.join(relative);

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&outpath)?;
        std::io::copy(&mut file, &mut outfile)?;

        if let Some(mode) = file.unix_mode() {
            file_ops::set_permissions_from_mode(&outpath, mode)?;
        }
    }

    info!("Extracted {total_files} entries from zip archive");
    Ok(())
}

/// Reject entries with parent-directory hops, roots or drive prefixes.
pub fn validate_entry_path(entry_path: &Path) -> Result<()> {
    for component in entry_path.components() {
        match component {
            Component::ParentDir => {
                return Err(TunnelError::SecurityError(format!(
                    "Archive contains path traversal: {entry_path:?}"
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(TunnelError::SecurityError(format!(
                    "Archive contains absolute path: {entry_path:?}"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    let raw = entry_path.to_string_lossy();
    if raw.starts_with('/') || raw.starts_with('\\') || raw.split(['/', '\\']).any(|p| p == "..")
    {
        return Err(TunnelError::SecurityError(format!(
            "Archive entry would extract outside destination: {entry_path:?}"
        )));
    }

    Ok(())
}
