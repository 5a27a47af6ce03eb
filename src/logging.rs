use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the tracing filter, e.g. `downtidy=debug`.
pub const LOG_ENV: &str = "DOWNTIDY_LOG";

/// Installs the stderr subscriber. Defaults to `warn` so item failures show
/// up without drowning the report; set `DOWNTIDY_LOG=info` to see every move.
pub fn init_logger() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .try_init();

    if let Err(e) = result {
        eprintln!("Warning: logging not initialised: {}", e);
    }
}
