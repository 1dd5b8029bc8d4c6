/// Default filter for a verbosity level (0=warn, 1=info, 2=debug, 3+=trace).
pub fn filter_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "tunnel_binary=warn",
        1 => "tunnel_binary=info",
        2 => "tunnel_binary=debug",
        _ => "tunnel_binary=trace",
    }
}

/// Initialize the logger with the specified verbosity level.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn setup_logger(verbose: u8) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter_for(verbose)))
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}
