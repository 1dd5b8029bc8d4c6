//! Staleness check for the staged binary.
//!
//! Version fingerprints are opaque: two hashes match only when they are the
//! same string, byte for byte.

use crate::models::descriptor::BinaryDescriptor;
use crate::platform::file_ops;
use log::debug;
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshDecision {
    /// Present and the local hash equals the remote hash.
    UpToDate,
    /// No executable at the final path.
    Missing,
    /// Present, but the hashes differ or no local hash is recorded.
    Stale,
}

impl RefreshDecision {
    pub fn needs_refresh(self) -> bool {
        !matches!(self, RefreshDecision::UpToDate)
    }
}

impl fmt::Display for RefreshDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RefreshDecision::UpToDate => "up to date",
            RefreshDecision::Missing => "missing",
            RefreshDecision::Stale => "stale",
        };
        f.write_str(text)
    }
}

/// A usable binary is a regular file carrying an execute bit.
pub fn is_present(final_path: &Path) -> bool {
    file_ops::is_executable(final_path).unwrap_or(false)
}

pub fn check(descriptor: &BinaryDescriptor, final_path: &Path) -> RefreshDecision {
    let decision = if !is_present(final_path) {
        RefreshDecision::Missing
    } else if descriptor.local_hash.as_deref() == Some(descriptor.remote_hash.as_str()) {
        RefreshDecision::UpToDate
    } else {
        RefreshDecision::Stale
    };

    debug!(
        "{} is {decision} (remote hash {:?}, local hash {:?})",
        final_path.display(),
        descriptor.remote_hash,
        descriptor.local_hash
    );
    decision
}

pub fn needs_refresh(descriptor: &BinaryDescriptor, final_path: &Path) -> bool {
    check(descriptor, final_path).needs_refresh()
}
