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

mod context;
mod exit_codes;
mod format;

pub use context::ErrorContext;
pub use exit_codes::get_exit_code;
pub use format::{format_error_chain, format_error_with_color};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TunnelError {
    #[error("Failed to fetch tunnel binary archive: {0}")]
    Transport(String),

    #[error("Failed to extract archive: {0}")]
    Extract(String),

    #[error("No writable directory available for the tunnel binary")]
    NoWritableDirectory { candidates: Vec<String> },

    #[error("Failed to stage tunnel binary: {0}")]
    Staging(String),

    #[error("Tunnel binary download failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last_error: Box<TunnelError>,
    },

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("No tunnel binary published for platform {0}")]
    UnsupportedPlatform(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Failed to fetch manifest: {0}")]
    ManifestFetch(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Security error: {0}")]
    SecurityError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] attohttpc::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// Coarse classification used by callers that branch on failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Extraction,
    Filesystem,
    Staging,
    RetriesExhausted,
    Manifest,
    Configuration,
    Other,
}

impl TunnelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TunnelError::Transport(_) | TunnelError::Http(_) => ErrorKind::Transport,
            TunnelError::Extract(_) | TunnelError::Zip(_) | TunnelError::SecurityError(_) => {
                ErrorKind::Extraction
            }
            TunnelError::NoWritableDirectory { .. }
            | TunnelError::Filesystem(_)
            | TunnelError::WalkDir(_) => ErrorKind::Filesystem,
            TunnelError::Staging(_) => ErrorKind::Staging,
            TunnelError::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
            TunnelError::UnsupportedPlatform(_)
            | TunnelError::InvalidManifest(_)
            | TunnelError::ManifestFetch(_)
            | TunnelError::Json(_) => ErrorKind::Manifest,
            TunnelError::ConfigError(_)
            | TunnelError::InvalidConfig(_)
            | TunnelError::Config(_) => ErrorKind::Configuration,
            TunnelError::Io(_) => ErrorKind::Other,
        }
    }

    /// Transport and extraction failures are absorbed by the retry loop.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Extraction)
    }

    /// Number of fetch cycles consumed, when the error ended a retry loop.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            TunnelError::RetriesExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TunnelError>;
