use tracing_subscriber::EnvFilter;

use crate::Error;

const DEFAULT_DIRECTIVE: &str = "info,workbot_core=debug";

/// Install the stderr subscriber. `RUST_LOG` wins, then `LOG_LEVEL`.
pub fn init() -> Result<(), Error> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => fallback_filter(std::env::var("LOG_LEVEL").ok().as_deref())?,
    };

    // Logs go to stderr so stdout stays free for piping.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| Error::Custom(format!("failed to install logger: {e}")))
}

fn fallback_filter(log_level: Option<&str>) -> Result<EnvFilter, Error> {
    let directive = log_level
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVE);
    EnvFilter::try_new(directive)
        .map_err(|e| Error::Custom(format!("invalid LOG_LEVEL '{directive}': {e}")))
}
