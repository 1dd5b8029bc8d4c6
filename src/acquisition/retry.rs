//! Bounded, immediate retry around fetch and extract.

use crate::acquisition::pipeline::AcquisitionPipeline;
use crate::acquisition::reporter::{FaultContext, FaultReporter};
use crate::acquisition::state::{AcquisitionState, StateTracker};
use crate::config::DEFAULT_MAX_ATTEMPTS;
use crate::error::{Result, TunnelError};
use crate::models::descriptor::BinaryDescriptor;
use log::{debug, info};
use retry::delay::NoDelay;
use retry::{OperationResult, retry_with_index};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome {
    pub final_path: PathBuf,
    /// Fetch cycles started, including the successful one.
    pub attempts: u32,
    /// Partial-artifact cleanups performed after failed cycles.
    pub cleanups: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryController {
    max_attempts: u32,
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryController {
    /// A bound of zero is treated as one attempt.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Prepare once, then fetch and extract until success or the bound is hit,
    /// then stage.
    ///
    /// Transport and extraction failures consume an attempt; anything else,
    /// including staging failures, ends the run at once.
    pub fn run(
        &self,
        pipeline: &mut AcquisitionPipeline,
        descriptor: &BinaryDescriptor,
        staging_dir: &Path,
        tracker: &mut StateTracker,
        reporter: &dyn FaultReporter,
        context: &FaultContext,
    ) -> Result<RetryOutcome> {
        if let Err(e) = pipeline.prepare(staging_dir) {
            return Err(fail(tracker, reporter, context, e));
        }

        let mut attempts = 0u32;
        let mut cleanups = 0u32;
        let retries = (self.max_attempts - 1) as usize;

        let result = retry_with_index(NoDelay.take(retries), |current_try| {
            attempts += 1;
            tracker.enter(AcquisitionState::Downloading);

            match fetch_and_extract(pipeline, descriptor, staging_dir, tracker) {
                Ok(extracted) => OperationResult::Ok(extracted),
                Err(e) if e.is_retryable() => {
                    debug!(
                        "Attempt {current_try}/{} failed: {e}",
                        self.max_attempts
                    );
                    reporter.report(context, &e);
                    tracker.enter(AcquisitionState::Cleanup);
                    pipeline.remove_artifacts(descriptor, staging_dir);
                    cleanups += 1;
                    OperationResult::Retry(e)
                }
                Err(e) => OperationResult::Err(e),
            }
        });

        if let Err(retry::Error { error, .. }) = result {
            let error = if error.is_retryable() {
                TunnelError::RetriesExhausted {
                    attempts,
                    last_error: Box::new(error),
                }
            } else {
                error
            };
            return Err(fail(tracker, reporter, context, error));
        }

        tracker.enter(AcquisitionState::Staging);
        let final_path = match pipeline.stage(descriptor, staging_dir) {
            Ok(path) => path,
            Err(e) => return Err(fail(tracker, reporter, context, e)),
        };
        pipeline.finish(descriptor, staging_dir);
        tracker.enter(AcquisitionState::Ready);

        info!("Tunnel binary ready after {attempts} attempt(s)");
        Ok(RetryOutcome {
            final_path,
            attempts,
            cleanups,
        })
    }
}

fn fetch_and_extract(
    pipeline: &mut AcquisitionPipeline,
    descriptor: &BinaryDescriptor,
    staging_dir: &Path,
    tracker: &mut StateTracker,
) -> Result<PathBuf> {
    let archive_path = pipeline.fetch(descriptor, staging_dir)?;
    pipeline.verify_presence(&archive_path)?;
    tracker.enter(AcquisitionState::Extracting);
    pipeline.extract(descriptor, staging_dir)
}

fn fail(
    tracker: &mut StateTracker,
    reporter: &dyn FaultReporter,
    context: &FaultContext,
    error: TunnelError,
) -> TunnelError {
    tracker.enter(AcquisitionState::Failed);
    reporter.report(context, &error);
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::pipeline::ArchiveExtractor;
    use crate::download::{DownloadOptions, HttpClient, HttpFileDownloader, HttpResponse};
    use crate::error::ErrorKind;
    use crate::models::platform::{OperatingSystem, PlatformKey, WordSize};
    use std::fs;
    use std::io::{Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Fails the first `failures` requests, then serves `body`.
    struct FlakyClient {
        failures: usize,
        calls: Arc<AtomicUsize>,
        body: Vec<u8>,
    }

    struct Body(Cursor<Vec<u8>>);

    impl Read for Body {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl HttpResponse for Body {
        fn status(&self) -> u16 {
            200
        }

        fn header(&self, _name: &str) -> Option<&str> {
            None
        }

        fn final_url(&self) -> Option<&str> {
            None
        }
    }

    impl HttpClient for FlakyClient {
        fn get(&self, _url: &str) -> Result<Box<dyn HttpResponse>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(TunnelError::Transport(format!("connection reset #{call}")));
            }
            Ok(Box::new(Body(Cursor::new(self.body.clone()))))
        }

        fn set_timeout(&mut self, _timeout: Duration) {}
    }

    /// Writes the executable without reading the archive.
    struct FakeExtractor {
        produce: Option<&'static str>,
    }

    impl ArchiveExtractor for FakeExtractor {
        fn extract(&self, _archive: &Path, destination: &Path) -> Result<()> {
            fs::create_dir_all(destination)?;
            match self.produce {
                Some(name) => {
                    fs::write(destination.join(name), b"binary")?;
                    Ok(())
                }
                None => Err(TunnelError::Extract("bad archive".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct CountingReporter {
        kinds: Mutex<Vec<ErrorKind>>,
    }

    impl FaultReporter for CountingReporter {
        fn report(&self, _context: &FaultContext, error: &TunnelError) {
            self.kinds.lock().unwrap().push(error.kind());
        }
    }

    fn descriptor() -> BinaryDescriptor {
        BinaryDescriptor {
            platform: PlatformKey::new(OperatingSystem::Linux, WordSize::Bit64),
            fetch_url: "http://downloads.example.com/LT_Linux.zip".to_string(),
            archive_file_name: "LT_Linux.zip".to_string(),
            executable_base_name: "LT_Linux".to_string(),
            remote_hash: "v2".to_string(),
            local_hash: Some("v1".to_string()),
            is_windows: false,
        }
    }

    fn pipeline(
        failures: usize,
        produce: Option<&'static str>,
    ) -> (AcquisitionPipeline, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = FlakyClient {
            failures,
            calls: calls.clone(),
            body: b"archive".to_vec(),
        };
        let pipeline = AcquisitionPipeline::new(
            HttpFileDownloader::with_client(Box::new(client)),
            DownloadOptions::default(),
        )
        .with_extractor(Box::new(FakeExtractor { produce }));
        (pipeline, calls)
    }

    #[test]
    fn succeeds_after_two_failures() {
        let temp = TempDir::new().unwrap();
        let (mut pipeline, calls) = pipeline(2, Some("LT_Linux"));
        let reporter = CountingReporter::default();
        let mut tracker = StateTracker::new();

        let outcome = RetryController::new(5)
            .run(
                &mut pipeline,
                &descriptor(),
                temp.path(),
                &mut tracker,
                &reporter,
                &FaultContext::default(),
            )
            .unwrap();

        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.cleanups, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.final_path, temp.path().join("LT_Linux"));
        assert_eq!(tracker.count(AcquisitionState::Cleanup), 2);
        assert_eq!(tracker.current(), AcquisitionState::Ready);
        assert_eq!(reporter.kinds.lock().unwrap().len(), 2);
    }

    #[test]
    fn always_failing_fetch_uses_exactly_max_attempts() {
        let temp = TempDir::new().unwrap();
        let (mut pipeline, calls) = pipeline(usize::MAX, Some("LT_Linux"));
        let reporter = CountingReporter::default();
        let mut tracker = StateTracker::new();

        let err = RetryController::new(5)
            .run(
                &mut pipeline,
                &descriptor(),
                temp.path(),
                &mut tracker,
                &reporter,
                &FaultContext::default(),
            )
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(err.attempts(), Some(5));
        assert_eq!(err.kind(), ErrorKind::RetriesExhausted);
        assert_eq!(tracker.count(AcquisitionState::Downloading), 5);
        assert_eq!(tracker.current(), AcquisitionState::Failed);

        let kinds = reporter.kinds.lock().unwrap();
        assert_eq!(kinds.len(), 6);
        assert_eq!(kinds.last(), Some(&ErrorKind::RetriesExhausted));
    }

    #[test]
    fn extraction_failures_are_retried() {
        let temp = TempDir::new().unwrap();
        let (mut pipeline, calls) = pipeline(0, None);
        let mut tracker = StateTracker::new();

        let err = RetryController::new(3)
            .run(
                &mut pipeline,
                &descriptor(),
                temp.path(),
                &mut tracker,
                &CountingReporter::default(),
                &FaultContext::default(),
            )
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            err,
            TunnelError::RetriesExhausted { attempts: 3, ref last_error }
                if matches!(**last_error, TunnelError::Extract(_))
        ));
        assert!(!temp.path().join("LT_Linux.zip").exists());
    }

    /// Extracts normally but leaves a non-empty directory at the final path,
    /// so the rename in the staging step fails.
    struct BlockingExtractor;

    impl ArchiveExtractor for BlockingExtractor {
        fn extract(&self, _archive: &Path, destination: &Path) -> Result<()> {
            fs::create_dir_all(destination)?;
            fs::write(destination.join("LT_Linux"), b"binary")?;
            if let Some(staging_dir) = destination.parent() {
                fs::create_dir_all(staging_dir.join("LT_Linux").join("occupied"))?;
            }
            Ok(())
        }
    }

    #[test]
    fn staging_failure_is_not_retried() {
        let temp = TempDir::new().unwrap();
        let (pipeline, calls) = pipeline(0, None);
        let mut pipeline = pipeline.with_extractor(Box::new(BlockingExtractor));
        let reporter = CountingReporter::default();
        let mut tracker = StateTracker::new();

        let err = RetryController::new(5)
            .run(
                &mut pipeline,
                &descriptor(),
                temp.path(),
                &mut tracker,
                &reporter,
                &FaultContext::default(),
            )
            .unwrap_err();

        assert!(matches!(err, TunnelError::Staging(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.current(), AcquisitionState::Failed);
        assert_eq!(*reporter.kinds.lock().unwrap(), vec![ErrorKind::Staging]);
    }

    #[test]
    fn single_attempt_bound() {
        let temp = TempDir::new().unwrap();
        let (mut pipeline, calls) = pipeline(usize::MAX, Some("LT_Linux"));

        let err = RetryController::new(0)
            .run(
                &mut pipeline,
                &descriptor(),
                temp.path(),
                &mut StateTracker::new(),
                &CountingReporter::default(),
                &FaultContext::default(),
            )
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.attempts(), Some(1));
    }
}
