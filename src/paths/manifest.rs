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
use crate::config::CONFIG_DIR_NAME;
use std::path::{Path, PathBuf};

pub const LOCAL_MANIFEST_FILE: &str = "tunnel-manifest.json";

pub fn local_manifest_in(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_DIR_NAME).join(LOCAL_MANIFEST_FILE)
}

/// Local manifest under the platform configuration directory.
pub fn default_local_manifest_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| local_manifest_in(&dir))
}
