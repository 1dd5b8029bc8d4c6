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
use crate::paths::manifest::default_local_manifest_path;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_DIR_NAME: &str = "tunnel-binary";
const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "TUNNEL_BINARY";

pub const DEFAULT_APP_NAME: &str = "lambdatest";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// When the remote manifest replaces the local copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestWritePolicy {
    /// Only once the new executable is staged and executable.
    #[default]
    AfterInstall,
    /// As soon as a stale binary is detected, before downloading.
    OnStaleDetection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,
}

impl ProxyConfig {
    /// `host:port`, present only when both halves are configured.
    pub fn address(&self) -> Option<String> {
        match (&self.host, self.port) {
            (Some(host), Some(port)) if !host.is_empty() => Some(format!("{host}:{port}")),
            _ => None,
        }
    }
}

/// Identity forwarded to fault reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub settle_delay_ms: u64,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub manifest_path: Option<PathBuf>,

    #[serde(default)]
    pub remote_manifest: Option<String>,

    #[serde(default)]
    pub manifest_write: ManifestWritePolicy,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub no_progress: bool,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            settle_delay_ms: 0,
            timeout_secs: None,
            manifest_path: None,
            remote_manifest: None,
            manifest_write: ManifestWritePolicy::default(),
            proxy: ProxyConfig::default(),
            identity: IdentityConfig::default(),
            no_progress: false,
        }
    }
}

/// Location of `config.toml` under the platform configuration directory.
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl TunnelConfig {
    /// Layer defaults, an optional TOML file and `TUNNEL_BINARY_*` variables.
    ///
    /// Nested keys use a double underscore, e.g. `TUNNEL_BINARY_PROXY__HOST`.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let file = config_file
            .map(Path::to_path_buf)
            .or_else(default_config_file);
        if let Some(path) = file {
            log::debug!("Reading config from {path:?} if present");
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(config_file.is_some()),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: TunnelConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(TunnelError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.app_name.trim().is_empty() || self.app_name.contains(['/', '\\']) {
            return Err(TunnelError::InvalidConfig(format!(
                "app_name '{}' is not a valid directory name",
                self.app_name
            )));
        }
        if self.proxy.host.is_some() != self.proxy.port.is_some() {
            log::warn!("Proxy is ignored unless both proxy.host and proxy.port are set");
        }
        Ok(())
    }

    /// Name of the hidden staging folder, e.g. `.lambdatest`.
    pub fn app_dir_name(&self) -> String {
        format!(".{}", self.app_name)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Where the local manifest lives when not configured explicitly.
    pub fn local_manifest_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.manifest_path {
            return Ok(path.clone());
        }
        default_local_manifest_path().ok_or_else(|| {
            TunnelError::ConfigError(
                "Cannot determine a configuration directory for the local manifest; set \
                 manifest_path"
                    .to_string(),
            )
        })
    }

    /// One-line summary attached to fault reports. Secrets are omitted.
    pub fn snapshot(&self) -> String {
        format!(
            "app={} max_attempts={} settle_delay_ms={} proxy={} manifest_write={:?}",
            self.app_name,
            self.max_attempts,
            self.settle_delay_ms,
            self.proxy.address().unwrap_or_else(|| "none".to_string()),
            self.manifest_write,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    struct EnvGuard {
        vars: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self { vars: Vec::new() }
        }

        fn set(&mut self, key: &str, value: &str) {
            self.vars.push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.vars.iter().rev() {
                match value {
                    Some(v) => unsafe { std::env::set_var(key, v) },
                    None => unsafe { std::env::remove_var(key) },
                }
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = TunnelConfig::default();
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(config.timeout(), None);
        assert_eq!(config.manifest_write, ManifestWritePolicy::AfterInstall);
        assert_eq!(config.app_dir_name(), ".lambdatest");
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
app_name = "acme"
max_attempts = 3
settle_delay_ms = 250
manifest_write = "on_stale_detection"

[proxy]
host = "proxy.local"
port = 3128
"#,
        )
        .unwrap();

        let config = TunnelConfig::load(Some(&path)).unwrap();
        assert_eq!(config.app_name, "acme");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.settle_delay(), Duration::from_millis(250));
        assert_eq!(config.manifest_write, ManifestWritePolicy::OnStaleDetection);
        assert_eq!(config.proxy.address().as_deref(), Some("proxy.local:3128"));
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(TunnelConfig::load(Some(&temp_dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "max_attempts = 3\n").unwrap();

        let mut env = EnvGuard::new();
        env.set("TUNNEL_BINARY_MAX_ATTEMPTS", "7");
        env.set("TUNNEL_BINARY_PROXY__HOST", "envproxy");
        env.set("TUNNEL_BINARY_PROXY__PORT", "8080");

        let config = TunnelConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_attempts, 7);
        assert_eq!(config.proxy.address().as_deref(), Some("envproxy:8080"));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = TunnelConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TunnelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_path_like_app_name() {
        let config = TunnelConfig {
            app_name: "../etc".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_proxy_requires_host_and_port() {
        let half = ProxyConfig {
            host: Some("proxy".to_string()),
            port: None,
        };
        assert_eq!(half.address(), None);

        let empty_host = ProxyConfig {
            host: Some(String::new()),
            port: Some(80),
        };
        assert_eq!(empty_host.address(), None);
    }

    #[test]
    fn test_explicit_manifest_path() {
        let config = TunnelConfig {
            manifest_path: Some(PathBuf::from("/srv/tunnel/manifest.json")),
            ..Default::default()
        };
        assert_eq!(
            config.local_manifest_path().unwrap(),
            PathBuf::from("/srv/tunnel/manifest.json")
        );
    }

    #[test]
    fn test_snapshot_omits_secrets() {
        let config = TunnelConfig {
            identity: IdentityConfig {
                user: Some("alice".to_string()),
                key: Some("s3cr3t".to_string()),
            },
            ..Default::default()
        };
        let snapshot = config.snapshot();
        assert!(!snapshot.contains("s3cr3t"));
        assert!(snapshot.contains("max_attempts=5"));
        assert!(snapshot.contains("proxy=none"));
    }
}
