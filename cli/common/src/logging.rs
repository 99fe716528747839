//! Logging initialization.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::LogLevel;

/// Install the global subscriber for a scan run.
///
/// Output goes to stderr; stdout is reserved for the rendered report.
pub fn init_logging(level: LogLevel) -> Result<()> {
    fmt()
        .with_max_level(Level::from(level))
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
