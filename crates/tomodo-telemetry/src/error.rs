use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    InitError(String),

    #[error("Invalid log filter: {0}")]
    FilterError(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
