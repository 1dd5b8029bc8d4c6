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

//! Version manifests.
//!
//! Both the remote manifest and the locally cached copy share one shape:
//! a `tunnelBinary` table keyed by platform (`mac`, `win`, `freebsd`,
//! `linux`) and word size (`32bit`, `64bit`), each entry naming the archive
//! URL, the archive file name and an opaque version hash. Keys this crate
//! does not know about are carried through untouched.

pub mod local;
pub mod remote;

pub use local::{load_local_manifest, save_local_manifest};
pub use remote::{fetch_remote_manifest, parse_manifest};

use crate::models::platform::PlatformKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    #[serde(default)]
    pub tunnel_binary: BTreeMap<String, BTreeMap<String, BinaryEntry>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryEntry {
    #[serde(default)]
    pub new_http_path: String,

    #[serde(default)]
    pub new_binary_name: String,

    #[serde(default)]
    pub hash: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionManifest {
    pub fn entry(&self, key: &PlatformKey) -> Option<&BinaryEntry> {
        self.tunnel_binary
            .get(key.os.as_str())?
            .get(key.word_size.as_str())
    }

    pub fn insert(&mut self, key: &PlatformKey, entry: BinaryEntry) {
        self.tunnel_binary
            .entry(key.os.as_str().to_string())
            .or_default()
            .insert(key.word_size.as_str().to_string(), entry);
    }

    /// Hash recorded for the platform. `None` only when there is no entry.
    pub fn hash_for(&self, key: &PlatformKey) -> Option<&str> {
        self.entry(key).map(|entry| entry.hash.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::platform::{OperatingSystem, WordSize};

    const SAMPLE: &str = r#"{
        "tunnelBinary": {
            "linux": {
                "64bit": {
                    "newHttpPath": "https://downloads.example.com/linux/64bit/LT_Linux.zip",
                    "newBinaryName": "LT_Linux.zip",
                    "hash": "abc123"
                }
            },
            "win": {
                "32bit": {
                    "newHttpPath": "https://downloads.example.com/win/32bit/LT_Windows.zip",
                    "newBinaryName": "LT_Windows.zip",
                    "hash": "def456",
                    "size": 1024
                }
            }
        },
        "release": "2024.10"
    }"#;

    #[test]
    fn test_entry_lookup() {
        let manifest: VersionManifest = serde_json::from_str(SAMPLE).unwrap();
        let key = PlatformKey::new(OperatingSystem::Linux, WordSize::Bit64);

        let entry = manifest.entry(&key).unwrap();
        assert_eq!(entry.new_binary_name, "LT_Linux.zip");
        assert_eq!(manifest.hash_for(&key), Some("abc123"));

        let missing = PlatformKey::new(OperatingSystem::Mac, WordSize::Bit64);
        assert!(manifest.entry(&missing).is_none());
        assert_eq!(manifest.hash_for(&missing), None);
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let manifest: VersionManifest = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(manifest.extra.get("release"), Some(&Value::from("2024.10")));

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["release"], "2024.10");
        assert_eq!(json["tunnelBinary"]["win"]["32bit"]["size"], 1024);
        assert_eq!(json["tunnelBinary"]["linux"]["64bit"]["newHttpPath"],
            "https://downloads.example.com/linux/64bit/LT_Linux.zip");
    }

    #[test]
    fn test_hash_only_entry_is_accepted() {
        let manifest: VersionManifest =
            serde_json::from_str(r#"{"tunnelBinary":{"mac":{"64bit":{"hash":"v1"}}}}"#).unwrap();
        let key = PlatformKey::new(OperatingSystem::Mac, WordSize::Bit64);
        assert_eq!(manifest.hash_for(&key), Some("v1"));
        assert!(manifest.entry(&key).unwrap().new_http_path.is_empty());
    }

    #[test]
    fn test_insert_creates_platform_table() {
        let mut manifest = VersionManifest::default();
        let key = PlatformKey::new(OperatingSystem::FreeBsd, WordSize::Bit32);
        manifest.insert(
            &key,
            BinaryEntry {
                hash: "h".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(manifest.hash_for(&key), Some("h"));
    }

    #[test]
    fn test_empty_hash_is_kept() {
        let manifest: VersionManifest =
            serde_json::from_str(r#"{"tunnelBinary":{"linux":{"64bit":{"hash":""}}}}"#).unwrap();
        let key = PlatformKey::new(OperatingSystem::Linux, WordSize::Bit64);
        assert_eq!(manifest.hash_for(&key), Some(""));
    }
}
