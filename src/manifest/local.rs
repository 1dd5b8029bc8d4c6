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

use crate::error::{Result, TunnelError};
use crate::manifest::VersionManifest;
use crate::platform::file_ops;
use std::fs;
use std::path::Path;

/// Load the locally cached manifest.
///
/// A missing file yields an empty manifest, meaning no version is known to
/// be installed.
pub fn load_local_manifest(path: &Path) -> Result<VersionManifest> {
    if !path.exists() {
        log::debug!("No local manifest at {}", path.display());
        return Ok(VersionManifest::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        TunnelError::InvalidManifest(format!(
            "Failed to read local manifest {}: {e}",
            path.display()
        ))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        TunnelError::InvalidManifest(format!(
            "Failed to parse local manifest {}: {e}",
            path.display()
        ))
    })
}

/// Persist a manifest as the new local copy.
pub fn save_local_manifest(manifest: &VersionManifest, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            TunnelError::ConfigError(format!("Failed to create manifest directory: {e}"))
        })?;
    }

    let json = serde_json::to_string_pretty(manifest)?;

    // Write to temporary file first for atomic operation
    let temp_path = path.with_extension("tmp");

    // Clean up any leftover temp file from previous failed attempts
    if temp_path.exists() {
        fs::remove_file(&temp_path).map_err(|e| {
            TunnelError::ConfigError(format!("Failed to remove old temp file: {e}"))
        })?;
    }

    fs::write(&temp_path, json)
        .map_err(|e| TunnelError::ConfigError(format!("Failed to write manifest file: {e}")))?;

    file_ops::atomic_rename(&temp_path, path)
        .map_err(|e| TunnelError::ConfigError(format!("Failed to rename manifest file: {e}")))?;

    log::debug!("Saved local manifest to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::BinaryEntry;
    use crate::models::platform::{OperatingSystem, PlatformKey, WordSize};
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_manifest_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = load_local_manifest(&temp_dir.path().join("manifest.json")).unwrap();
        assert_eq!(manifest, VersionManifest::default());
    }

    #[test]
    fn test_load_corrupt_manifest_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_local_manifest(&path).unwrap_err();
        assert!(matches!(err, TunnelError::InvalidManifest(_)));
    }

    #[test]
    fn test_save_and_load_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conf").join("manifest.json");
        let key = PlatformKey::new(OperatingSystem::Linux, WordSize::Bit64);

        let mut manifest = VersionManifest::default();
        manifest.insert(
            &key,
            BinaryEntry {
                new_http_path: "https://example.com/LT_Linux.zip".to_string(),
                new_binary_name: "LT_Linux.zip".to_string(),
                hash: "v2".to_string(),
                ..Default::default()
            },
        );

        save_local_manifest(&manifest, &path).unwrap();
        assert!(!path.with_extension("tmp").exists());

        let loaded = load_local_manifest(&path).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_save_replaces_stale_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("manifest.json");
        fs::write(path.with_extension("tmp"), "leftover").unwrap();

        save_local_manifest(&VersionManifest::default(), &path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
