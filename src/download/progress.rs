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

use super::ProgressReporter;
use crate::indicator::{ProgressConfig, ProgressFactory, ProgressIndicator, ProgressStyle};

/// Bridges download callbacks onto a [`ProgressIndicator`].
pub struct DownloadProgressAdapter {
    indicator: Box<dyn ProgressIndicator>,
    context: String,
}

impl DownloadProgressAdapter {
    pub fn new(no_progress: bool, context: impl Into<String>) -> Self {
        Self::with_indicator(ProgressFactory::create(no_progress), context)
    }

    pub fn with_indicator(
        indicator: Box<dyn ProgressIndicator>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            indicator,
            context: context.into(),
        }
    }
}

impl ProgressReporter for DownloadProgressAdapter {
    fn on_start(&mut self, total_bytes: u64) {
        let config = ProgressConfig::new("Downloading", &self.context, ProgressStyle::Bytes);
        let config = if total_bytes > 0 {
            config.with_total(total_bytes)
        } else {
            config
        };
        self.indicator.start(config);
    }

    fn on_progress(&mut self, bytes_downloaded: u64) {
        self.indicator.update(bytes_downloaded, None);
    }

    fn on_complete(&mut self) {
        self.indicator
            .complete(Some("Download complete".to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<(u64, Option<u64>)>>>);

    impl ProgressIndicator for Recorder {
        fn start(&mut self, config: ProgressConfig) {
            self.0.lock().unwrap().push((0, config.total));
        }

        fn update(&mut self, current: u64, total: Option<u64>) {
            self.0.lock().unwrap().push((current, total));
        }

        fn set_message(&mut self, _message: String) {}

        fn complete(&mut self, _message: Option<String>) {}

        fn error(&mut self, _message: String) {}
    }

    #[test]
    fn test_unknown_total_starts_spinner() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut adapter =
            DownloadProgressAdapter::with_indicator(Box::new(Recorder(seen.clone())), "LT_Mac.zip");

        adapter.on_start(0);
        adapter.on_progress(256);
        adapter.on_complete();

        assert_eq!(*seen.lock().unwrap(), vec![(0, None), (256, None)]);
    }

    #[test]
    fn test_known_total_is_forwarded() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut adapter =
            DownloadProgressAdapter::with_indicator(Box::new(Recorder(seen.clone())), "LT_Mac.zip");

        adapter.on_start(1024);
        assert_eq!(seen.lock().unwrap()[0], (0, Some(1024)));
    }

    #[test]
    fn test_no_progress_mode() {
        let mut adapter = DownloadProgressAdapter::new(true, "LT_Windows.zip");
        adapter.on_start(2048);
        adapter.on_progress(1024);
        adapter.on_complete();
    }
}
