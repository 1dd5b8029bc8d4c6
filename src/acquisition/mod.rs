//! Making sure a runnable tunnel binary exists.
//!
//! [`BinaryAcquirer::ensure`] resolves the platform entry, picks a staging
//! directory, decides whether the staged binary can be reused and, when it
//! cannot, drives the download pipeline under the retry controller.

pub mod pipeline;
pub mod reporter;
pub mod retry;
pub mod state;

pub use pipeline::{AcquisitionPipeline, ArchiveExtractor, NativeExtractor};
pub use reporter::{FaultContext, FaultReporter, LogFaultReporter};
pub use retry::{RetryController, RetryOutcome};
pub use state::{AcquisitionState, StateTracker};

use crate::config::{ManifestWritePolicy, TunnelConfig};
use crate::download;
use crate::error::{Result, TunnelError};
use crate::manifest::{VersionManifest, load_local_manifest, save_local_manifest};
use crate::models::descriptor::BinaryDescriptor;
use crate::models::platform::PlatformKey;
use crate::paths::staging::{candidate_directories, locate_directory, select_directory};
use crate::platform::current_platform;
use crate::version::{self, RefreshDecision};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of a successful [`BinaryAcquirer::ensure`].
#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionOutcome {
    pub path: PathBuf,
    pub decision: RefreshDecision,
    pub attempts: u32,
    pub cleanups: u32,
    pub history: Vec<AcquisitionState>,
}

/// What `ensure` would act on, without touching the network.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub descriptor: BinaryDescriptor,
    pub staging_dir: PathBuf,
    pub final_path: PathBuf,
    pub decision: RefreshDecision,
}

pub struct BinaryAcquirer {
    platform: PlatformKey,
    candidates: Vec<PathBuf>,
    manifest_path: PathBuf,
    manifest_write: ManifestWritePolicy,
    controller: RetryController,
    pipeline: AcquisitionPipeline,
    reporter: Box<dyn FaultReporter>,
    context: FaultContext,
}

impl BinaryAcquirer {
    pub fn new(pipeline: AcquisitionPipeline, manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            platform: current_platform(),
            candidates: candidate_directories(&TunnelConfig::default().app_dir_name()),
            manifest_path: manifest_path.into(),
            manifest_write: ManifestWritePolicy::default(),
            controller: RetryController::default(),
            pipeline,
            reporter: Box::new(LogFaultReporter),
            context: FaultContext::default(),
        }
    }

    /// Acquirer wired from configuration with the real HTTP client.
    pub fn from_config(config: &TunnelConfig) -> Result<Self> {
        let pipeline = AcquisitionPipeline::new(
            download::downloader_for(config),
            download::options_for(config),
        )
        .with_settle_delay(config.settle_delay());

        let mut acquirer = Self::new(pipeline, config.local_manifest_path()?)
            .with_candidates(candidate_directories(&config.app_dir_name()))
            .with_manifest_write(config.manifest_write)
            .with_max_attempts(config.max_attempts);
        acquirer.context = FaultContext::from_config(config, String::new());
        Ok(acquirer)
    }

    pub fn with_platform(mut self, platform: PlatformKey) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<PathBuf>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_manifest_write(mut self, policy: ManifestWritePolicy) -> Self {
        self.manifest_write = policy;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.controller = RetryController::new(max_attempts);
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn FaultReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn platform(&self) -> PlatformKey {
        self.platform
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Resolve the descriptor and refresh decision for `remote`.
    ///
    /// Read-only: the staging directory `ensure` would use is located but not
    /// created.
    pub fn inspect(&self, remote: &VersionManifest) -> Result<Inspection> {
        let local = self.load_local();
        let descriptor = BinaryDescriptor::resolve(self.platform, remote, &local)?;
        let staging_dir = locate_directory(&self.candidates)?;
        let final_path = descriptor.final_path(&staging_dir);
        let decision = version::check(&descriptor, &final_path);

        Ok(Inspection {
            descriptor,
            staging_dir,
            final_path,
            decision,
        })
    }

    /// Return the path of a runnable, current binary, acquiring it if needed.
    pub fn ensure(&mut self, remote: &VersionManifest) -> Result<AcquisitionOutcome> {
        let mut tracker = StateTracker::new();

        let local = self.load_local();
        let descriptor = BinaryDescriptor::resolve(self.platform, remote, &local)?;
        let context = FaultContext {
            filename: descriptor.archive_file_name.clone(),
            ..self.context.clone()
        };

        let staging_dir = match select_directory(&self.candidates) {
            Ok(dir) => dir,
            Err(e) => {
                tracker.enter(AcquisitionState::Failed);
                self.reporter.report(&context, &e);
                return Err(e);
            }
        };

        let final_path = descriptor.final_path(&staging_dir);
        let decision = version::check(&descriptor, &final_path);
        if !decision.needs_refresh() {
            tracker.enter(AcquisitionState::Ready);
            info!("Tunnel binary {} is up to date", final_path.display());
            return Ok(AcquisitionOutcome {
                path: final_path,
                decision,
                attempts: 0,
                cleanups: 0,
                history: tracker.into_history(),
            });
        }

        info!(
            "Tunnel binary is {decision}; acquiring {}",
            descriptor.archive_file_name
        );
        if decision == RefreshDecision::Stale
            && self.manifest_write == ManifestWritePolicy::OnStaleDetection
        {
            self.store_manifest(remote, &context);
        }

        let outcome = self.controller.run(
            &mut self.pipeline,
            &descriptor,
            &staging_dir,
            &mut tracker,
            self.reporter.as_ref(),
            &context,
        )?;

        if self.manifest_write == ManifestWritePolicy::AfterInstall {
            self.store_manifest(remote, &context);
        }

        Ok(AcquisitionOutcome {
            path: outcome.final_path,
            decision,
            attempts: outcome.attempts,
            cleanups: outcome.cleanups,
            history: tracker.into_history(),
        })
    }

    fn load_local(&self) -> VersionManifest {
        match load_local_manifest(&self.manifest_path) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Ignoring unreadable local manifest: {e}");
                VersionManifest::default()
            }
        }
    }

    /// The local manifest is a cache: a failed write is reported, not fatal.
    fn store_manifest(&self, remote: &VersionManifest, context: &FaultContext) {
        match save_local_manifest(remote, &self.manifest_path) {
            Ok(()) => info!("Updated local manifest {}", self.manifest_path.display()),
            Err(e) => self.reporter.report(
                context,
                &TunnelError::Filesystem(format!("Failed to update local manifest: {e}")),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{DownloadOptions, HttpClient, HttpFileDownloader, HttpResponse};
    use crate::manifest::BinaryEntry;
    use crate::models::platform::{OperatingSystem, WordSize};
    use crate::platform::file_ops;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct RefusingClient(Arc<AtomicUsize>);

    impl HttpClient for RefusingClient {
        fn get(&self, _url: &str) -> Result<Box<dyn HttpResponse>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(TunnelError::Transport("offline".to_string()))
        }

        fn set_timeout(&mut self, _timeout: Duration) {}
    }

    fn linux() -> PlatformKey {
        PlatformKey::new(OperatingSystem::Linux, WordSize::Bit64)
    }

    fn manifest(hash: &str) -> VersionManifest {
        let mut manifest = VersionManifest::default();
        manifest.insert(
            &linux(),
            BinaryEntry {
                new_http_path: "http://downloads.example.com/LT_Linux.zip".to_string(),
                new_binary_name: "LT_Linux.zip".to_string(),
                hash: hash.to_string(),
                ..Default::default()
            },
        );
        manifest
    }

    fn acquirer(temp: &TempDir, calls: Arc<AtomicUsize>) -> BinaryAcquirer {
        let pipeline = AcquisitionPipeline::new(
            HttpFileDownloader::with_client(Box::new(RefusingClient(calls))),
            DownloadOptions::default(),
        );
        BinaryAcquirer::new(pipeline, temp.path().join("manifest.json"))
            .with_platform(linux())
            .with_candidates(vec![temp.path().join(".lambdatest")])
            .with_max_attempts(2)
    }

    fn stage_existing(temp: &TempDir) -> PathBuf {
        let dir = temp.path().join(".lambdatest");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("LT_Linux");
        fs::write(&path, b"old binary").unwrap();
        file_ops::make_executable(&path).unwrap();
        path
    }

    #[test]
    fn up_to_date_binary_skips_network() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let existing = stage_existing(&temp);
        save_local_manifest(&manifest("abc123"), &temp.path().join("manifest.json")).unwrap();

        let outcome = acquirer(&temp, calls.clone())
            .ensure(&manifest("abc123"))
            .unwrap();

        assert_eq!(outcome.path, existing);
        assert_eq!(outcome.decision, RefreshDecision::UpToDate);
        assert_eq!(outcome.attempts, 0);
        assert_eq!(
            outcome.history,
            vec![AcquisitionState::Checking, AcquisitionState::Ready]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_refresh_keeps_old_manifest_by_default() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        stage_existing(&temp);
        let manifest_path = temp.path().join("manifest.json");
        save_local_manifest(&manifest("v1"), &manifest_path).unwrap();

        let err = acquirer(&temp, calls.clone())
            .ensure(&manifest("v2"))
            .unwrap_err();

        assert_eq!(err.attempts(), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let local = load_local_manifest(&manifest_path).unwrap();
        assert_eq!(local.hash_for(&linux()), Some("v1"));
    }

    #[test]
    fn on_stale_detection_writes_manifest_before_download() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        stage_existing(&temp);
        let manifest_path = temp.path().join("manifest.json");
        save_local_manifest(&manifest("v1"), &manifest_path).unwrap();

        let result = acquirer(&temp, calls)
            .with_manifest_write(ManifestWritePolicy::OnStaleDetection)
            .ensure(&manifest("v2"));

        assert!(result.is_err());
        let local = load_local_manifest(&manifest_path).unwrap();
        assert_eq!(local.hash_for(&linux()), Some("v2"));
    }

    #[test]
    fn corrupt_local_manifest_counts_as_empty() {
        let temp = TempDir::new().unwrap();
        stage_existing(&temp);
        fs::write(temp.path().join("manifest.json"), "{ nope").unwrap();

        let inspection = acquirer(&temp, Arc::new(AtomicUsize::new(0)))
            .inspect(&manifest("abc123"))
            .unwrap();

        assert_eq!(inspection.descriptor.local_hash, None);
        assert_eq!(inspection.decision, RefreshDecision::Stale);
    }

    #[test]
    fn inspect_leaves_filesystem_untouched() {
        let temp = TempDir::new().unwrap();

        let inspection = acquirer(&temp, Arc::new(AtomicUsize::new(0)))
            .inspect(&manifest("abc123"))
            .unwrap();

        assert_eq!(inspection.staging_dir, temp.path().join(".lambdatest"));
        assert_eq!(inspection.decision, RefreshDecision::Missing);
        assert!(!inspection.staging_dir.exists());
    }

    #[test]
    fn unknown_platform_is_reported() {
        let temp = TempDir::new().unwrap();
        let result = acquirer(&temp, Arc::new(AtomicUsize::new(0)))
            .with_platform(PlatformKey::new(OperatingSystem::FreeBsd, WordSize::Bit32))
            .ensure(&manifest("abc123"));

        assert!(matches!(result, Err(TunnelError::UnsupportedPlatform(_))));
    }

    #[test]
    fn no_writable_directory_fails_fast() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));

        let err = acquirer(&temp, calls.clone())
            .with_candidates(vec![blocker.join(".lambdatest")])
            .ensure(&manifest("abc123"))
            .unwrap_err();

        assert!(matches!(err, TunnelError::NoWritableDirectory { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
