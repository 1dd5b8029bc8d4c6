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

pub mod clean;
pub mod ensure;
pub mod status;

use crate::config::TunnelConfig;
use crate::error::{Result, TunnelError};
use crate::manifest::{VersionManifest, fetch_remote_manifest};

/// Load the remote manifest named on the command line or in configuration.
pub(crate) fn load_remote_manifest(
    config: &TunnelConfig,
    source: Option<&str>,
) -> Result<VersionManifest> {
    let source = source
        .or(config.remote_manifest.as_deref())
        .ok_or_else(|| {
            TunnelError::ConfigError(
                "No remote manifest configured; pass --remote-manifest or set remote_manifest"
                    .to_string(),
            )
        })?;
    fetch_remote_manifest(source, Some(&config.proxy))
}
