//! Archive downloads over HTTP.
//!
//! Transfers stream into a temporary file beside the destination and are
//! renamed into place once complete. Requests honour an explicit proxy or the
//! usual proxy environment variables.
mod client;
mod http_file_downloader;
mod options;
mod progress;

pub use client::{AttohttpcClient, DEFAULT_TIMEOUT, HttpClient, HttpResponse, proxy_settings};
pub use http_file_downloader::{HttpFileDownloader, ProgressReporter};
pub use options::{DownloadOptions, MAX_DOWNLOAD_SIZE};
pub use progress::DownloadProgressAdapter;

use crate::config::TunnelConfig;

/// Downloader wired from configuration: proxy and progress display.
///
/// The timeout travels with [`DownloadOptions`] on each request.
pub fn downloader_for(config: &TunnelConfig) -> HttpFileDownloader {
    let client = AttohttpcClient::new().with_proxy(Some(&config.proxy));

    HttpFileDownloader::with_client(Box::new(client)).with_progress_reporter(Box::new(
        DownloadProgressAdapter::new(config.no_progress, "tunnel binary"),
    ))
}

/// Per-request options derived from configuration.
pub fn options_for(config: &TunnelConfig) -> DownloadOptions {
    DownloadOptions::default().with_timeout(config.timeout())
}
