use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Deployment '{0}' not found")]
    DeploymentNotFound(String),

    #[error("The container engine is not running. Start it and try again.")]
    EngineNotRunning,

    #[error("{0} teardown step(s) failed")]
    TeardownIncomplete(usize),

    #[error("Command exited with code {0}")]
    CommandFailed(i64),

    #[error("Some of the requested ports are unavailable")]
    PortsUnavailable,

    #[error("Docker error: {0}")]
    DockerError(#[from] tomodo_docker::DockerError),

    #[error(transparent)]
    CleanerError(#[from] tomodo_cleaner::CleanerError),

    #[error("Invalid value: {0}")]
    ModelError(#[from] tomodo_types::ModelError),

    #[error("Logging error: {0}")]
    TelemetryError(#[from] tomodo_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
