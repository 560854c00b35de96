use tracing_subscriber::EnvFilter;

/// Environment variable holding `tracing` filter directives.
pub const LOG_ENV: &str = "TESSEL_LOG";

/// Filter directives for a verbosity count, used when [`LOG_ENV`] is unset.
#[must_use]
pub fn default_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the stderr `fmt` subscriber. A second call is a no-op.
pub fn init_logging(verbose: u8) {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .filter(|directives| !directives.trim().is_empty())
        .map_or_else(
            || EnvFilter::new(default_directives(verbose)),
            |directives| EnvFilter::builder().parse_lossy(directives),
        );
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
