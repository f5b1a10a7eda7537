//! Logging for tomodo
//!
//! Every record passes through [`RedactingMakeWriter`], which masks the
//! password of database connection strings before the record reaches its
//! sink. The binary installs the subscriber once at start-up through
//! [`init_logging`]; library crates only use the `tracing` macros.

pub mod capture;
pub mod error;
pub mod logging;
pub mod redact;
pub mod writer;

pub use capture::LogCapture;
pub use error::{Result, TelemetryError};
pub use logging::{init_logging, LogSettings};
pub use redact::{redact_connection_string, REDACTED_PASSWORD};
pub use writer::{RedactingMakeWriter, RedactingWriter};
