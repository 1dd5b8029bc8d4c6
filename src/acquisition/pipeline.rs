//! The fetch, extract and stage steps of one acquisition.

use crate::archive;
use crate::download::{DownloadOptions, HttpFileDownloader};
use crate::error::{ErrorKind, Result, TunnelError};
use crate::models::descriptor::BinaryDescriptor;
use crate::paths::staging;
use crate::platform::file_ops;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Decompression collaborator.
pub trait ArchiveExtractor: Send + Sync {
    /// Unpack `archive` into `destination`. All file handles are closed on return.
    fn extract(&self, archive: &Path, destination: &Path) -> Result<()>;
}

/// Extracts zip and tar.gz archives in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeExtractor;

impl ArchiveExtractor for NativeExtractor {
    fn extract(&self, archive: &Path, destination: &Path) -> Result<()> {
        archive::extract_archive(archive, destination)
    }
}

pub struct AcquisitionPipeline {
    downloader: HttpFileDownloader,
    options: DownloadOptions,
    extractor: Box<dyn ArchiveExtractor>,
    settle_delay: Duration,
}

impl AcquisitionPipeline {
    pub fn new(downloader: HttpFileDownloader, options: DownloadOptions) -> Self {
        Self {
            downloader,
            options,
            extractor: Box::new(NativeExtractor),
            settle_delay: Duration::ZERO,
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn ArchiveExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Step 1: start from an empty staging directory.
    pub fn prepare(&self, staging_dir: &Path) -> Result<()> {
        staging::prepare_directory(staging_dir)
    }

    /// Step 2: download the archive into the staging directory.
    pub fn fetch(&mut self, descriptor: &BinaryDescriptor, staging_dir: &Path) -> Result<PathBuf> {
        info!("Downloading latest binary from {}", descriptor.fetch_url);
        let archive_path = descriptor.archive_path(staging_dir);
        self.downloader
            .download(&descriptor.fetch_url, &archive_path, &self.options)
            .map_err(|e| as_kind(e, ErrorKind::Transport))
    }

    /// Step 3: the archive must exist, be a regular file and be readable.
    pub fn verify_presence(&self, archive_path: &Path) -> Result<()> {
        let readable = fs::metadata(archive_path)
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
            && fs::File::open(archive_path).is_ok();

        if readable {
            Ok(())
        } else {
            Err(TunnelError::Transport(format!(
                "Archive {} is missing after download",
                archive_path.display()
            )))
        }
    }

    /// Step 4: unpack into the extraction workspace and locate the executable.
    pub fn extract(&self, descriptor: &BinaryDescriptor, staging_dir: &Path) -> Result<PathBuf> {
        info!("Extracting binary from {}", descriptor.archive_file_name);
        let archive_path = descriptor.archive_path(staging_dir);
        let extract_dir = descriptor.extract_dir(staging_dir);

        file_ops::remove_dir_tree(&extract_dir).map_err(|e| as_kind(e, ErrorKind::Extraction))?;
        self.extractor
            .extract(&archive_path, &extract_dir)
            .map_err(|e| as_kind(e, ErrorKind::Extraction))?;

        let extracted = descriptor.extracted_path(staging_dir);
        if !extracted.is_file() {
            return Err(TunnelError::Extract(format!(
                "{} does not contain {}",
                descriptor.archive_file_name, descriptor.executable_base_name
            )));
        }
        Ok(extracted)
    }

    /// Step 5: move the extracted file to its final name and mark it 0755.
    ///
    /// Fails with [`TunnelError::Staging`] when the extracted file is gone,
    /// which is what a second call for the same extraction sees.
    pub fn stage(&self, descriptor: &BinaryDescriptor, staging_dir: &Path) -> Result<PathBuf> {
        if !self.settle_delay.is_zero() {
            debug!("Waiting {:?} before staging", self.settle_delay);
            thread::sleep(self.settle_delay);
        }

        let source = descriptor.extracted_path(staging_dir);
        if !source.is_file() {
            return Err(TunnelError::Staging(format!(
                "Extracted binary not found at {}",
                source.display()
            )));
        }

        let final_path = descriptor.final_path(staging_dir);
        file_ops::atomic_rename(&source, &final_path).map_err(|e| {
            TunnelError::Staging(format!(
                "Failed to move {} to {}: {e}",
                source.display(),
                final_path.display()
            ))
        })?;
        file_ops::make_executable(&final_path).map_err(|e| {
            TunnelError::Staging(format!(
                "Failed to mark {} executable: {e}",
                final_path.display()
            ))
        })?;

        info!("Staged {}", final_path.display());
        Ok(final_path)
    }

    /// Remove the archive and the extraction workspace after a failed attempt.
    pub fn remove_artifacts(&self, descriptor: &BinaryDescriptor, staging_dir: &Path) {
        self.remove_archive(descriptor, staging_dir);
        self.remove_workspace(descriptor, staging_dir);
    }

    /// Clean up after a successful stage. The staged executable is kept even
    /// when it took the archive's place.
    pub fn finish(&self, descriptor: &BinaryDescriptor, staging_dir: &Path) {
        if descriptor.archive_shares_final_path() {
            debug!(
                "Archive {} was replaced by the staged binary",
                descriptor.archive_file_name
            );
        } else {
            self.remove_archive(descriptor, staging_dir);
        }
        self.remove_workspace(descriptor, staging_dir);
    }

    fn remove_archive(&self, descriptor: &BinaryDescriptor, staging_dir: &Path) {
        let archive_path = descriptor.archive_path(staging_dir);
        match file_ops::remove_file_if_exists(&archive_path) {
            Ok(true) => debug!("Removed archive {}", archive_path.display()),
            Ok(false) => debug!("No archive at {}", archive_path.display()),
            Err(e) => warn!("Failed to remove {}: {e}", archive_path.display()),
        }
    }

    fn remove_workspace(&self, descriptor: &BinaryDescriptor, staging_dir: &Path) {
        if let Err(e) = file_ops::remove_dir_tree(&descriptor.extract_dir(staging_dir)) {
            warn!("Failed to clear extraction workspace: {e}");
        }
    }
}

/// Reclassify a collaborator error so the retry loop sees the step it came from.
fn as_kind(error: TunnelError, kind: ErrorKind) -> TunnelError {
    if error.kind() == kind {
        return error;
    }
    match kind {
        ErrorKind::Extraction => TunnelError::Extract(error.to_string()),
        _ => TunnelError::Transport(error.to_string()),
    }
}
