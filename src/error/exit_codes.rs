use crate::error::TunnelError;

pub fn get_exit_code(error: &TunnelError) -> i32 {
    match error {
        TunnelError::InvalidConfig(_) | TunnelError::ConfigError(_) | TunnelError::Config(_) => 2,

        TunnelError::InvalidManifest(_)
        | TunnelError::UnsupportedPlatform(_)
        | TunnelError::Json(_) => 3,

        TunnelError::NoWritableDirectory { .. } => 13,

        TunnelError::Transport(_) | TunnelError::Http(_) | TunnelError::ManifestFetch(_) => 20,

        TunnelError::RetriesExhausted { .. } => 21,

        TunnelError::Extract(_) | TunnelError::Zip(_) | TunnelError::SecurityError(_) => 22,

        TunnelError::Staging(_) => 23,

        _ => 1,
    }
}
