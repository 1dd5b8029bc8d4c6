//! Progress feedback for long-running steps.
//!
//! Downloads render an animated bar on a terminal and stay silent when
//! progress is disabled or stderr is redirected.

mod factory;
mod indicatif;
mod silent;
pub mod types;

pub use factory::ProgressFactory;
pub use self::indicatif::IndicatifProgress;
pub use silent::SilentProgress;
pub use types::{ProgressConfig, ProgressStyle};

/// Core trait for progress indicator implementations
pub trait ProgressIndicator: Send + Sync {
    /// Start a new progress operation.
    ///
    /// A bar is shown when the configuration carries a total, a spinner otherwise.
    fn start(&mut self, config: ProgressConfig);

    /// Update progress. `total` may override the initial total.
    fn update(&mut self, current: u64, total: Option<u64>);

    fn set_message(&mut self, message: String);

    /// Complete the operation, defaulting the message to "Complete".
    fn complete(&mut self, message: Option<String>);

    fn error(&mut self, message: String);
}
