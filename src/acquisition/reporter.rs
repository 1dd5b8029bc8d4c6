//! Fault reporting.
//!
//! The acquisition decides what to report and when; where reports end up is
//! the reporter's business.

use crate::config::TunnelConfig;
use crate::error::TunnelError;
use log::{error, warn};

pub const FAULT_TARGET: &str = "tunnel_binary::fault";

/// Who was running, which file was involved and how the run was configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultContext {
    pub user: Option<String>,
    /// Already masked; the raw key never leaves [`FaultContext::from_config`].
    pub key: Option<String>,
    pub filename: String,
    pub configuration: String,
}

impl FaultContext {
    pub fn from_config(config: &TunnelConfig, filename: impl Into<String>) -> Self {
        Self {
            user: config.identity.user.clone(),
            key: config.identity.key.as_deref().map(mask_key),
            filename: filename.into(),
            configuration: config.snapshot(),
        }
    }
}

/// Keep the last four characters of a secret.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

pub trait FaultReporter: Send + Sync {
    fn report(&self, context: &FaultContext, error: &TunnelError);
}

/// Routes faults to the `log` facade: retryable ones as warnings, the rest
/// as errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFaultReporter;

impl FaultReporter for LogFaultReporter {
    fn report(&self, context: &FaultContext, err: &TunnelError) {
        let user = context.user.as_deref().unwrap_or("-");
        let key = context.key.as_deref().unwrap_or("-");

        if err.is_retryable() {
            warn!(
                target: FAULT_TARGET,
                "user={user} key={key} file={} config=[{}]: {err}",
                context.filename,
                context.configuration
            );
        } else {
            error!(
                target: FAULT_TARGET,
                "user={user} key={key} file={} config=[{}]: {err}",
                context.filename,
                context.configuration
            );
        }
    }
}
