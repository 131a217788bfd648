use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` picks the crate level
/// (0 = info, 1 = debug, 2+ = trace). Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn init_tracing(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "transit_booking=info",
        1 => "transit_booking=debug",
        _ => "transit_booking=trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
