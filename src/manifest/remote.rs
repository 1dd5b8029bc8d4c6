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

use crate::config::ProxyConfig;
use crate::download::proxy_settings;
use crate::error::{Result, TunnelError};
use crate::manifest::VersionManifest;
use crate::user_agent;
use attohttpc::Session;
use log::{debug, info};
use retry::{OperationResult, delay::Exponential, retry_with_index};
use std::fs;
use std::time::Duration;

const DEFAULT_TIMEOUT: u64 = 30;
const MAX_RETRIES: usize = 3;
const INITIAL_BACKOFF_MS: u64 = 10;

/// Obtain the remote manifest from an `http(s)://` URL or a local file path.
pub fn fetch_remote_manifest(source: &str, proxy: Option<&ProxyConfig>) -> Result<VersionManifest> {
    if source.starts_with("http://") || source.starts_with("https://") {
        fetch_over_http(source, proxy)
    } else {
        debug!("Reading remote manifest from file {source}");
        let body = fs::read_to_string(source).map_err(|e| {
            TunnelError::ManifestFetch(format!("Failed to read manifest {source}: {e}"))
        })?;
        parse_manifest(&body)
    }
}

/// Parse a manifest body, rejecting documents without any binary entries.
pub fn parse_manifest(body: &str) -> Result<VersionManifest> {
    let manifest: VersionManifest = serde_json::from_str(body)
        .map_err(|e| TunnelError::InvalidManifest(format!("Malformed manifest: {e}")))?;

    if manifest.tunnel_binary.is_empty() {
        return Err(TunnelError::InvalidManifest(
            "Manifest has no tunnelBinary entries".to_string(),
        ));
    }
    Ok(manifest)
}

fn fetch_over_http(url: &str, proxy: Option<&ProxyConfig>) -> Result<VersionManifest> {
    let mut session = Session::new();
    session.header("User-Agent", user_agent::manifest_client());
    session.timeout(Duration::from_secs(DEFAULT_TIMEOUT));
    session.proxy_settings(proxy_settings(proxy)?);

    info!("Fetching remote manifest from {url}");

    let body = retry_with_index(
        Exponential::from_millis(INITIAL_BACKOFF_MS).take(MAX_RETRIES),
        |current_try| {
            let response = match session.get(url).send() {
                Ok(resp) => resp,
                Err(e) => {
                    debug!("Manifest request attempt {current_try} failed: {e}");
                    return OperationResult::Retry(TunnelError::ManifestFetch(format!(
                        "Network error fetching manifest: {e}"
                    )));
                }
            };

            let status = response.status();
            if status.is_server_error() {
                return OperationResult::Retry(TunnelError::ManifestFetch(format!(
                    "Server error ({}) fetching manifest",
                    status.as_u16()
                )));
            }
            if !status.is_success() {
                return OperationResult::Err(TunnelError::ManifestFetch(format!(
                    "HTTP error ({}) fetching manifest: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown error")
                )));
            }

            match response.text() {
                Ok(body) => OperationResult::Ok(body),
                Err(e) => OperationResult::Retry(TunnelError::ManifestFetch(format!(
                    "Failed to read manifest body: {e}"
                ))),
            }
        },
    )
    .map_err(|e| e.error)?;

    parse_manifest(&body)
}
