use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset, by `-v` count.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. `RUST_LOG` takes precedence over `verbosity`.
pub fn init_tracing(verbosity: u8, ansi: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_level(true)
        .with_target(true);

    if subscriber.try_init().is_ok() {
        tracing::debug!("tracing initialized");
    }
}
