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
//! Staging directory selection and preparation.

use crate::error::{Result, TunnelError};
use crate::platform::file_ops;
use crate::paths::shared::ensure_directory;
use log::{debug, info, warn};
use std::env;
use std::path::{Path, PathBuf};

/// Ordered staging candidates: the app folder under the home directory, the
/// working directory and the system temp directory.
///
/// Bases that cannot be determined (no home directory, deleted cwd) are left
/// out rather than failing.
pub fn candidate_directories(app_dir_name: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(3);

    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(app_dir_name));
    }
    match env::current_dir() {
        Ok(cwd) => candidates.push(cwd.join(app_dir_name)),
        Err(e) => debug!("Skipping working directory candidate: {e}"),
    }
    candidates.push(env::temp_dir().join(app_dir_name));

    candidates
}

/// Return the first candidate that exists (or can be created) and is
/// readable and writable.
pub fn select_directory(candidates: &[PathBuf]) -> Result<PathBuf> {
    for candidate in candidates {
        if usable(candidate) {
            info!("Using staging directory {}", candidate.display());
            return Ok(candidate.clone());
        }
        debug!("Staging candidate {} is not usable", candidate.display());
    }

    warn!("None of {} staging candidates is writable", candidates.len());
    Err(no_writable_directory(candidates))
}

/// Like [`select_directory`] but never creates anything.
///
/// A missing candidate qualifies when its nearest existing ancestor is a
/// readable and writable directory.
pub fn locate_directory(candidates: &[PathBuf]) -> Result<PathBuf> {
    candidates
        .iter()
        .find(|candidate| would_be_usable(candidate))
        .cloned()
        .ok_or_else(|| no_writable_directory(candidates))
}

fn usable(candidate: &Path) -> bool {
    if !candidate.exists() && ensure_directory(candidate.to_path_buf()).is_err() {
        return false;
    }
    accessible_dir(candidate)
}

fn would_be_usable(candidate: &Path) -> bool {
    candidate
        .ancestors()
        .find(|path| path.exists())
        .is_some_and(accessible_dir)
}

fn accessible_dir(path: &Path) -> bool {
    path.is_dir() && file_ops::is_accessible(path)
}

fn no_writable_directory(candidates: &[PathBuf]) -> TunnelError {
    TunnelError::NoWritableDirectory {
        candidates: candidates
            .iter()
            .map(|path| path.display().to_string())
            .collect(),
    }
}

/// Wipe leftovers from an earlier run and recreate the directory empty.
pub fn prepare_directory(dir: &Path) -> Result<()> {
    file_ops::remove_dir_tree(dir).map_err(|e| {
        TunnelError::Filesystem(format!("Failed to clear {}: {e}", dir.display()))
    })?;
    ensure_directory(dir.to_path_buf())?;
    debug!("Prepared empty staging directory {}", dir.display());
    Ok(())
}
