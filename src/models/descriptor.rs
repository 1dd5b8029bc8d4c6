//! The one binary an acquisition run is about.

use crate::error::{Result, TunnelError};
use crate::manifest::VersionManifest;
use crate::models::platform::PlatformKey;
use std::path::{Path, PathBuf};

/// Sub-directory of the staging directory that receives extracted files.
pub const EXTRACT_DIR_NAME: &str = ".extract";

/// Everything needed to fetch and stage the binary for one platform.
///
/// Built once per run from the platform key and the two manifests and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryDescriptor {
    pub platform: PlatformKey,
    pub fetch_url: String,
    pub archive_file_name: String,
    pub executable_base_name: String,
    pub remote_hash: String,
    pub local_hash: Option<String>,
    pub is_windows: bool,
}

impl BinaryDescriptor {
    pub fn resolve(
        platform: PlatformKey,
        remote: &VersionManifest,
        local: &VersionManifest,
    ) -> Result<Self> {
        let entry = remote
            .entry(&platform)
            .ok_or_else(|| TunnelError::UnsupportedPlatform(platform.to_string()))?;

        if entry.new_http_path.trim().is_empty() || entry.new_binary_name.trim().is_empty() {
            return Err(TunnelError::InvalidManifest(format!(
                "Entry for {platform} lacks newHttpPath or newBinaryName"
            )));
        }

        let executable_base_name = executable_base_name(&entry.new_binary_name)?;

        Ok(Self {
            platform,
            fetch_url: entry.new_http_path.clone(),
            archive_file_name: entry.new_binary_name.clone(),
            executable_base_name,
            remote_hash: entry.hash.clone(),
            local_hash: local.hash_for(&platform).map(str::to_string),
            is_windows: platform.is_windows(),
        })
    }

    /// `<base>` or `<base>.exe`.
    pub fn final_executable_name(&self) -> String {
        format!(
            "{}{}",
            self.executable_base_name,
            self.platform.executable_suffix()
        )
    }

    pub fn archive_path(&self, staging_dir: &Path) -> PathBuf {
        staging_dir.join(&self.archive_file_name)
    }

    pub fn extract_dir(&self, staging_dir: &Path) -> PathBuf {
        staging_dir.join(EXTRACT_DIR_NAME)
    }

    /// Where extraction is expected to leave the executable.
    pub fn extracted_path(&self, staging_dir: &Path) -> PathBuf {
        self.extract_dir(staging_dir).join(&self.executable_base_name)
    }

    pub fn final_path(&self, staging_dir: &Path) -> PathBuf {
        staging_dir.join(self.final_executable_name())
    }

    /// True when staging overwrites the downloaded archive, e.g. an
    /// extension-less `LT_Linux` on unix.
    pub fn archive_shares_final_path(&self) -> bool {
        self.archive_file_name == self.final_executable_name()
    }
}

/// Archive name without its extension: everything before the first dot.
fn executable_base_name(archive_file_name: &str) -> Result<String> {
    let file_name = Path::new(archive_file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| *name == archive_file_name)
        .ok_or_else(|| {
            TunnelError::SecurityError(format!(
                "Archive name must be a plain file name: {archive_file_name:?}"
            ))
        })?;

    match file_name.split('.').next() {
        Some(base) if !base.is_empty() => Ok(base.to_string()),
        _ => Err(TunnelError::InvalidManifest(format!(
            "Cannot derive executable name from {archive_file_name:?}"
        ))),
    }
}
