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
use crate::error::{Result, TunnelError};
use crate::user_agent;
use attohttpc::{ProxySettings, Response, Session};
use std::io::{self, Read};
use std::time::Duration;
use url::Url;

pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<Box<dyn HttpResponse>>;

    fn set_timeout(&mut self, timeout: Duration);
}

pub trait HttpResponse: Read + Send {
    fn status(&self) -> u16;

    fn header(&self, name: &str) -> Option<&str>;

    fn final_url(&self) -> Option<&str>;
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Proxy settings for a session.
///
/// An explicit `host:port` wins over `HTTP_PROXY`/`HTTPS_PROXY`; otherwise the
/// environment is consulted.
pub fn proxy_settings(proxy: Option<&ProxyConfig>) -> Result<ProxySettings> {
    let Some(address) = proxy.and_then(ProxyConfig::address) else {
        return Ok(ProxySettings::from_env());
    };

    let url = Url::parse(&format!("http://{address}"))
        .map_err(|e| TunnelError::InvalidConfig(format!("Invalid proxy '{address}': {e}")))?;
    log::debug!("Routing requests through proxy {url}");

    Ok(ProxySettings::builder()
        .http_proxy(url.clone())
        .https_proxy(url)
        .build())
}

pub struct AttohttpcClient {
    timeout: Duration,
    user_agent: String,
    proxy: Option<ProxyConfig>,
}

impl AttohttpcClient {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: user_agent::download_client(),
            proxy: None,
        }
    }

    pub fn with_proxy(mut self, proxy: Option<&ProxyConfig>) -> Self {
        self.proxy = proxy.cloned();
        self
    }
}

impl Default for AttohttpcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for AttohttpcClient {
    fn get(&self, url: &str) -> Result<Box<dyn HttpResponse>> {
        let mut session = Session::new();
        session.proxy_settings(proxy_settings(self.proxy.as_ref())?);

        let response = session
            .get(url)
            .timeout(self.timeout)
            .header("User-Agent", &self.user_agent)
            .follow_redirects(true)
            .send()?;
        Ok(Box::new(AttohttpcResponse { response }))
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

struct AttohttpcResponse {
    response: Response,
}

impl Read for AttohttpcResponse {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.response.read(buf)
    }
}

impl HttpResponse for AttohttpcResponse {
    fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.response.headers().get(name)?.to_str().ok()
    }

    fn final_url(&self) -> Option<&str> {
        Some(self.response.url().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_settings_from_config() {
        let proxy = ProxyConfig {
            host: Some("proxy.internal".to_string()),
            port: Some(3128),
        };
        assert!(proxy_settings(Some(&proxy)).is_ok());
    }

    #[test]
    fn test_partial_proxy_falls_back_to_env() {
        let proxy = ProxyConfig {
            host: Some("proxy.internal".to_string()),
            port: None,
        };
        assert!(proxy_settings(Some(&proxy)).is_ok());
        assert!(proxy_settings(None).is_ok());
    }

    #[test]
    fn test_invalid_proxy_host_is_config_error() {
        let proxy = ProxyConfig {
            host: Some("bad host name".to_string()),
            port: Some(8080),
        };
        assert!(matches!(
            proxy_settings(Some(&proxy)),
            Err(TunnelError::InvalidConfig(_))
        ));
    }
}
