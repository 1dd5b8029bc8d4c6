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

use crate::acquisition::BinaryAcquirer;
use crate::commands::load_remote_manifest;
use crate::config::TunnelConfig;
use crate::error::Result;
use crate::version::{RefreshDecision, is_present};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatusOutput {
    platform: String,
    staging_directory: String,
    binary_path: String,
    present: bool,
    remote_hash: String,
    local_hash: Option<String>,
    decision: RefreshDecision,
    manifest_path: String,
}

pub struct StatusCommand<'a> {
    config: &'a TunnelConfig,
}

impl<'a> StatusCommand<'a> {
    pub fn new(config: &'a TunnelConfig) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn execute(&self, remote_manifest: Option<&str>, json: bool) -> Result<()> {
        let remote = load_remote_manifest(self.config, remote_manifest)?;
        let acquirer = BinaryAcquirer::from_config(self.config)?;
        let inspection = acquirer.inspect(&remote)?;

        let output = StatusOutput {
            platform: acquirer.platform().to_string(),
            staging_directory: inspection.staging_dir.display().to_string(),
            binary_path: inspection.final_path.display().to_string(),
            present: is_present(&inspection.final_path),
            remote_hash: inspection.descriptor.remote_hash.clone(),
            local_hash: inspection.descriptor.local_hash.clone(),
            decision: inspection.decision,
            manifest_path: acquirer.manifest_path().display().to_string(),
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Platform:          {}", output.platform);
            println!("Staging directory: {}", output.staging_directory);
            println!("Binary:            {}", output.binary_path);
            println!("Remote hash:       {}", output.remote_hash);
            println!(
                "Local hash:        {}",
                output.local_hash.as_deref().unwrap_or("(none)")
            );
            println!("Local manifest:    {}", output.manifest_path);
            println!("Status:            {}", output.decision);
        }
        Ok(())
    }
}
