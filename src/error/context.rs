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

use crate::error::TunnelError;
use std::fmt;

pub struct ErrorContext<'a> {
    pub error: &'a TunnelError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl<'a> ErrorContext<'a> {
    pub fn new(error: &'a TunnelError) -> Self {
        let (suggestion, details) = match error {
            TunnelError::Transport(msg) => {
                let suggestion = Some(
                    "Check your internet connection and proxy settings (--proxy-host, \
                     --proxy-port) and try again."
                        .to_string(),
                );
                let details = Some(format!("Transport failure: {msg}"));
                (suggestion, details)
            }
            TunnelError::Extract(msg) => {
                let suggestion =
                    Some("Ensure you have enough disk space and try again.".to_string());
                let details = Some(format!("Extraction failed: {msg}"));
                (suggestion, details)
            }
            TunnelError::NoWritableDirectory { candidates } => {
                let suggestion = if cfg!(unix) {
                    Some(
                        "Ensure your home directory, the current directory or the system \
                         temporary directory is writable."
                            .to_string(),
                    )
                } else {
                    Some(
                        "Run from a writable directory or check the permissions of your user \
                         profile folder."
                            .to_string(),
                    )
                };
                let details = if candidates.is_empty() {
                    None
                } else {
                    Some(format!(
                        "Tried:\n{}",
                        candidates
                            .iter()
                            .map(|p| format!("  - {p}"))
                            .collect::<Vec<_>>()
                            .join("\n")
                    ))
                };
                (suggestion, details)
            }
            TunnelError::Staging(msg) => {
                let suggestion = Some(
                    "Another process may be using the binary. Stop running tunnels and retry."
                        .to_string(),
                );
                let details = Some(format!("Staging failed: {msg}"));
                (suggestion, details)
            }
            TunnelError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                let suggestion = Some(
                    "The download server may be unreachable. Check connectivity and run \
                     'tunnel-binary ensure' again."
                        .to_string(),
                );
                let details = Some(format!("Gave up after {attempts} attempts: {last_error}"));
                (suggestion, details)
            }
            TunnelError::UnsupportedPlatform(platform) => {
                let suggestion = Some(
                    "The remote manifest does not list a binary for this machine. Contact the \
                     service provider."
                        .to_string(),
                );
                let details = Some(format!("Missing manifest entry: {platform}"));
                (suggestion, details)
            }
            TunnelError::InvalidManifest(msg) => {
                let suggestion = Some(
                    "Remove the local manifest file to force a fresh download.".to_string(),
                );
                let details = Some(msg.clone());
                (suggestion, details)
            }
            TunnelError::ManifestFetch(msg) => {
                let suggestion = Some(
                    "Check the --remote-manifest location and your network connection."
                        .to_string(),
                );
                let details = Some(msg.clone());
                (suggestion, details)
            }
            TunnelError::Http(http_err) => {
                let error_string = http_err.to_string();
                let suggestion = if error_string.contains("timeout")
                    || error_string.contains("Timeout")
                {
                    Some(
                        "Try increasing the timeout with TUNNEL_BINARY_TIMEOUT_SECS.".to_string(),
                    )
                } else if error_string.contains("proxy") || error_string.contains("Proxy") {
                    Some("Verify the proxy host and port.".to_string())
                } else {
                    Some("Check your internet connection and try again.".to_string())
                };
                let details = Some(format!("HTTP error: {http_err}"));
                (suggestion, details)
            }
            TunnelError::InvalidConfig(_) | TunnelError::Config(_) => {
                let suggestion = Some(
                    "Check config.toml and TUNNEL_BINARY_* environment variables.".to_string(),
                );
                (suggestion, None)
            }
            TunnelError::Io(io_err) => {
                let suggestion = match io_err.kind() {
                    std::io::ErrorKind::PermissionDenied => {
                        if cfg!(unix) {
                            Some("Check file permissions of the staging directory.".to_string())
                        } else {
                            Some("Run as Administrator or check file permissions.".to_string())
                        }
                    }
                    std::io::ErrorKind::NotFound => Some(
                        "Ensure the file or directory exists and the path is correct.".to_string(),
                    ),
                    _ => None,
                };
                let details = Some(format!("I/O error: {io_err}"));
                (suggestion, details)
            }
            _ => (None, None),
        };

        ErrorContext {
            error,
            suggestion,
            details,
        }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

impl<'a> fmt::Display for ErrorContext<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\n\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}
