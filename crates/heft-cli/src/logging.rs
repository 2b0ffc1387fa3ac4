//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter (`HEFT_LOG=heft_engine=debug`).
pub const LOG_ENV: &str = "HEFT_LOG";

/// Default filter for a `-v` count.
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Logs to stderr; stdout belongs to command output and the LSP protocol.
///
/// Calling this more than once keeps the first subscriber.
pub fn init_logging(verbose: u8, ansi: bool) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .try_init();
}
