use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Result, TelemetryError};
use crate::writer::RedactingMakeWriter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub verbose: bool,
    pub quiet: bool,
}

impl LogSettings {
    pub fn default_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// Install the process-wide subscriber. `RUST_LOG` takes precedence over
/// the verbosity flags; quiet mode installs nothing.
pub fn init_logging(settings: LogSettings) -> Result<()> {
    if settings.quiet {
        return Ok(());
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(settings.default_level())
            .map_err(|e| TelemetryError::FilterError(e.to_string()))?,
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(RedactingMakeWriter::new(std::io::stderr))
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}
