use super::client::DEFAULT_TIMEOUT;
use std::time::Duration;

/// Maximum allowed archive size (512MB)
pub const MAX_DOWNLOAD_SIZE: u64 = 536_870_912;

/// Options for configuring download behavior
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Timeout for the download operation
    pub timeout: Duration,

    /// Maximum allowed file size
    pub max_size: u64,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_size: MAX_DOWNLOAD_SIZE,
        }
    }
}

impl DownloadOptions {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Some(timeout) = timeout {
            self.timeout = timeout;
        }
        self
    }
}
