use crate::download::client::{AttohttpcClient, HttpClient, HttpResponse};
use crate::download::options::DownloadOptions;
use crate::error::{Result, TunnelError};
use log::debug;
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const DOWNLOAD_CHUNK_SIZE: usize = 8192;

pub trait ProgressReporter: Send + Sync {
    fn on_start(&mut self, total_bytes: u64);

    fn on_progress(&mut self, bytes_downloaded: u64);

    fn on_complete(&mut self);
}

pub struct HttpFileDownloader {
    pub(crate) http_client: Box<dyn HttpClient>,
    progress_reporter: Option<Box<dyn ProgressReporter>>,
}

impl Default for HttpFileDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFileDownloader {
    pub fn new() -> Self {
        Self::with_client(Box::new(AttohttpcClient::new()))
    }

    pub fn with_client(http_client: Box<dyn HttpClient>) -> Self {
        Self {
            http_client,
            progress_reporter: None,
        }
    }

    pub fn with_progress_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Stream `url` into `destination`.
    ///
    /// Bytes land in a temporary file next to the destination and are renamed
    /// into place only after the body was read completely, so an interrupted
    /// transfer never leaves a truncated archive behind.
    pub fn download(
        &mut self,
        url: &str,
        destination: &Path,
        options: &DownloadOptions,
    ) -> Result<PathBuf> {
        let parent = destination.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        self.http_client.set_timeout(options.timeout);
        let response = self.http_client.get(url)?;
        self.validate_response(response.as_ref(), options.max_size)?;

        let total_size = content_length(response.as_ref()).unwrap_or(0);
        if let Some(reporter) = &mut self.progress_reporter {
            reporter.on_start(total_size);
        }

        let mut temp_file = NamedTempFile::new_in(parent)?;
        let written = self.copy_body(response, temp_file.as_file_mut(), options.max_size)?;
        if written == 0 {
            return Err(TunnelError::Transport(format!(
                "Empty response body from {url}"
            )));
        }

        temp_file
            .persist(destination)
            .map_err(|e| TunnelError::Io(e.error))?;
        debug!("Downloaded {written} bytes to {}", destination.display());

        if let Some(reporter) = &mut self.progress_reporter {
            reporter.on_complete();
        }

        Ok(destination.to_path_buf())
    }

    fn validate_response(&self, response: &dyn HttpResponse, max_size: u64) -> Result<()> {
        let status = response.status();

        if !(200..300).contains(&status) {
            return Err(TunnelError::Transport(format!(
                "Download failed with status: {status}"
            )));
        }

        if let Some(length) = content_length(response)
            && length > max_size
        {
            return Err(TunnelError::Transport(format!(
                "Download size {length} exceeds maximum allowed size {max_size}"
            )));
        }

        Ok(())
    }

    fn copy_body(
        &mut self,
        mut response: Box<dyn HttpResponse>,
        file: &mut fs::File,
        max_size: u64,
    ) -> Result<u64> {
        let mut writer = BufWriter::new(file);
        let mut downloaded = 0u64;
        let mut buffer = vec![0; DOWNLOAD_CHUNK_SIZE];

        loop {
            match response.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    downloaded += n as u64;
                    if downloaded > max_size {
                        return Err(TunnelError::Transport(format!(
                            "Download exceeds maximum allowed size {max_size}"
                        )));
                    }
                    writer.write_all(&buffer[..n])?;

                    if let Some(reporter) = &mut self.progress_reporter {
                        reporter.on_progress(downloaded);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(TunnelError::Transport(format!(
                        "Connection interrupted after {downloaded} bytes: {e}"
                    )));
                }
            }
        }

        writer.flush()?;
        Ok(downloaded)
    }
}

pub(crate) fn content_length(response: &dyn HttpResponse) -> Option<u64> {
    response
        .header("Content-Length")
        .and_then(|value| value.trim().parse::<u64>().ok())
}

#[cfg(test)]
#[path = "http_file_downloader_tests.rs"]
mod http_file_downloader_tests;
