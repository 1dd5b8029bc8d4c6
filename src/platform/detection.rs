//! Host platform resolution.
//!
//! Maps host operating-system and architecture identifiers onto the
//! [`PlatformKey`] that selects a manifest entry. Resolution never fails:
//! anything unrecognised falls back to `linux` / `32bit`.

use crate::models::platform::{OperatingSystem, PlatformKey, WordSize};
use std::sync::OnceLock;

const MAC_MARKERS: &[&str] = &["darwin", "mac os"];
const WINDOWS_MARKERS: &[&str] = &[
    "mswin", "msys", "mingw", "cygwin", "bccwin", "wince", "emc", "win32",
];
const FREEBSD_MARKERS: &[&str] = &["freebsd"];

/// Cached platform of the running process.
static CACHED_PLATFORM: OnceLock<PlatformKey> = OnceLock::new();

/// Resolve a platform key from raw host identifiers.
///
/// Operating system rules are applied in priority order and matched
/// case-insensitively anywhere in the identifier:
/// 1. `darwin` or `mac os` → `mac`
/// 2. `mswin`, `msys`, `mingw`, `cygwin`, `bccwin`, `wince`, `emc`, `win32` → `win`
/// 3. `freebsd` → `freebsd`
/// 4. anything else → `linux`
///
/// Only the architecture `x64` maps to `64bit`; every other value is `32bit`.
///
/// # Example
///
/// ```
/// use tunnel_binary::models::platform::{OperatingSystem, WordSize};
/// use tunnel_binary::platform::resolve_platform;
///
/// let key = resolve_platform("darwin", "x64");
/// assert_eq!(key.os, OperatingSystem::Mac);
/// assert_eq!(key.word_size, WordSize::Bit64);
/// ```
pub fn resolve_platform(os_identifier: &str, arch_identifier: &str) -> PlatformKey {
    let os_identifier = os_identifier.to_lowercase();
    let matches_any = |markers: &[&str]| markers.iter().any(|m| os_identifier.contains(m));

    let os = if matches_any(MAC_MARKERS) {
        OperatingSystem::Mac
    } else if matches_any(WINDOWS_MARKERS) {
        OperatingSystem::Win
    } else if matches_any(FREEBSD_MARKERS) {
        OperatingSystem::FreeBsd
    } else {
        OperatingSystem::Linux
    };

    let word_size = if arch_identifier == "x64" {
        WordSize::Bit64
    } else {
        WordSize::Bit32
    };

    PlatformKey::new(os, word_size)
}

/// Get the platform key of the running process, detected once.
pub fn current_platform() -> PlatformKey {
    *CACHED_PLATFORM
        .get_or_init(|| resolve_platform(host_os_identifier(), host_arch_identifier()))
}

/// Host operating system identifier in the conventional runtime naming
/// (`darwin`, `win32`, `freebsd`, `linux`, ...).
pub fn host_os_identifier() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

/// Host architecture identifier.
///
/// Maps Rust's target architecture onto the conventional naming:
/// - `x86_64` → `"x64"`
/// - `x86` → `"ia32"`
/// - `aarch64` → `"arm64"`
/// - `arm` → `"arm"`
/// - Others → the Rust name unchanged
pub fn host_arch_identifier() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "x86" => "ia32",
        "aarch64" => "arm64",
        other => other,
    }
}
