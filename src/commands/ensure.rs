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
use log::info;

pub struct EnsureCommand<'a> {
    config: &'a TunnelConfig,
}

impl<'a> EnsureCommand<'a> {
    pub fn new(config: &'a TunnelConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// Print the path of a runnable tunnel binary, downloading it if needed.
    pub fn execute(&self, remote_manifest: Option<&str>) -> Result<()> {
        let remote = load_remote_manifest(self.config, remote_manifest)?;
        let mut acquirer = BinaryAcquirer::from_config(self.config)?;

        let outcome = acquirer.ensure(&remote)?;
        if outcome.attempts > 0 {
            info!(
                "Acquired tunnel binary in {} attempt(s) with {} cleanup(s)",
                outcome.attempts, outcome.cleanups
            );
        }

        println!("{}", outcome.path.display());
        Ok(())
    }
}
