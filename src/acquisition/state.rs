//! Acquisition state machine.
//!
//! ```text
//! Checking -> Downloading -> Extracting -> Staging -> Ready
//!                  |             |
//!                  +--> Cleanup <+--> Downloading (next attempt)
//!                          |
//!                          +--> Failed
//! ```

use log::debug;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionState {
    Checking,
    Downloading,
    Extracting,
    Cleanup,
    Staging,
    Ready,
    Failed,
}

impl AcquisitionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AcquisitionState::Ready | AcquisitionState::Failed)
    }

    pub fn can_transition_to(self, next: AcquisitionState) -> bool {
        use AcquisitionState::*;

        matches!(
            (self, next),
            (Checking, Downloading | Ready | Failed)
                | (Downloading, Extracting | Cleanup | Failed)
                | (Extracting, Staging | Cleanup | Failed)
                | (Cleanup, Downloading | Failed)
                | (Staging, Ready | Failed)
        )
    }
}

impl fmt::Display for AcquisitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AcquisitionState::Checking => "checking",
            AcquisitionState::Downloading => "downloading",
            AcquisitionState::Extracting => "extracting",
            AcquisitionState::Cleanup => "cleanup",
            AcquisitionState::Staging => "staging",
            AcquisitionState::Ready => "ready",
            AcquisitionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Current state plus every state visited, in order.
#[derive(Debug, Clone)]
pub struct StateTracker {
    history: Vec<AcquisitionState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            history: vec![AcquisitionState::Checking],
        }
    }

    pub fn current(&self) -> AcquisitionState {
        *self
            .history
            .last()
            .unwrap_or(&AcquisitionState::Checking)
    }

    pub fn enter(&mut self, next: AcquisitionState) {
        let current = self.current();
        debug_assert!(
            current.can_transition_to(next),
            "illegal transition {current} -> {next}"
        );
        debug!("Acquisition state {current} -> {next}");
        self.history.push(next);
    }

    pub fn history(&self) -> &[AcquisitionState] {
        &self.history
    }

    pub fn into_history(self) -> Vec<AcquisitionState> {
        self.history
    }

    /// Number of times the given state was entered.
    pub fn count(&self, state: AcquisitionState) -> usize {
        self.history.iter().filter(|s| **s == state).count()
    }
}
