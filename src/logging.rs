//! Log subscriber setup for the binary.
//!
//! Library crates log through the `log` facade; the `tracing-log` bridge
//! forwards those records into the `tracing` subscriber installed here.
//! Build with `--features logs-json` for JSON lines.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "PAGEKEEP_LOG";

/// Level used when `PAGEKEEP_LOG` is unset.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

pub fn env_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

pub fn init(verbose: u8) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr);

    #[cfg(feature = "logs-json")]
    let installed = builder.json().try_init();
    #[cfg(not(feature = "logs-json"))]
    let installed = builder.try_init();

    installed.map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}
