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

use crate::config::TunnelConfig;
use crate::error::Result;
use crate::paths::staging::candidate_directories;
use crate::platform::file_ops;
use log::debug;

pub struct CleanCommand<'a> {
    config: &'a TunnelConfig,
}

impl<'a> CleanCommand<'a> {
    pub fn new(config: &'a TunnelConfig) -> Result<Self> {
        Ok(Self { config })
    }

    /// Remove every staging directory and, optionally, the local manifest.
    pub fn execute(&self, include_manifest: bool) -> Result<()> {
        let mut removed = 0;
        for dir in candidate_directories(&self.config.app_dir_name()) {
            if !dir.is_dir() {
                debug!("Nothing to clean at {}", dir.display());
                continue;
            }
            file_ops::remove_dir_tree(&dir)?;
            println!("Removed {}", dir.display());
            removed += 1;
        }

        if include_manifest {
            let manifest_path = self.config.local_manifest_path()?;
            if file_ops::remove_file_if_exists(&manifest_path)? {
                println!("Removed {}", manifest_path.display());
                removed += 1;
            }
        }

        if removed == 0 {
            println!("Nothing to clean");
        }
        Ok(())
    }
}
