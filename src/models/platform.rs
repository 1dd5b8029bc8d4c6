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

use crate::error::{Result, TunnelError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Operating system families the tunnel binary is published for.
///
/// The string forms are the keys used by the version manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Mac,
    Win,
    FreeBsd,
    Linux,
}

impl OperatingSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingSystem::Mac => "mac",
            OperatingSystem::Win => "win",
            OperatingSystem::FreeBsd => "freebsd",
            OperatingSystem::Linux => "linux",
        }
    }
}

impl FromStr for OperatingSystem {
    type Err = TunnelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mac" => Ok(OperatingSystem::Mac),
            "win" => Ok(OperatingSystem::Win),
            "freebsd" => Ok(OperatingSystem::FreeBsd),
            "linux" => Ok(OperatingSystem::Linux),
            _ => Err(TunnelError::InvalidConfig(format!(
                "Unknown operating system: {s}"
            ))),
        }
    }
}

impl std::fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordSize {
    #[serde(rename = "32bit")]
    Bit32,
    #[serde(rename = "64bit")]
    Bit64,
}

impl WordSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            WordSize::Bit32 => "32bit",
            WordSize::Bit64 => "64bit",
        }
    }
}

impl FromStr for WordSize {
    type Err = TunnelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "32bit" => Ok(WordSize::Bit32),
            "64bit" => Ok(WordSize::Bit64),
            _ => Err(TunnelError::InvalidConfig(format!("Unknown word size: {s}"))),
        }
    }
}

impl std::fmt::Display for WordSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The (platform, word-size) pair that selects one manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformKey {
    pub os: OperatingSystem,
    pub word_size: WordSize,
}

impl PlatformKey {
    pub fn new(os: OperatingSystem, word_size: WordSize) -> Self {
        Self { os, word_size }
    }

    /// Windows builds carry an `.exe` suffix on the staged executable.
    pub fn is_windows(&self) -> bool {
        self.os == OperatingSystem::Win
    }

    pub fn executable_suffix(&self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }
}

impl std::fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.word_size)
    }
}
