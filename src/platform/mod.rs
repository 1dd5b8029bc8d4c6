//! Platform detection utilities for the entire application.
//!
//! This module resolves the host's platform key and provides the
//! filesystem primitives the acquisition pipeline relies on.

pub mod file_ops;

mod detection;

pub use detection::{current_platform, host_arch_identifier, host_os_identifier, resolve_platform};
