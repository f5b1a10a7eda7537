use thiserror::Error;

use crate::retry::RetryExhausted;

#[derive(Error, Debug)]
pub enum DockerError {
    #[error("Container engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("The '{shell}' shell could not be found in container {container}")]
    ShellNotFound { shell: String, container: String },

    #[error(transparent)]
    RetryExhausted(#[from] RetryExhausted),

    #[error("Docker API error: {0}")]
    ApiError(#[source] bollard::errors::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DockerError {
    /// Classify an engine client error. `container` names the container the
    /// call targeted, if any, so a 404 can be reported as that container.
    pub fn from_engine(err: bollard::errors::Error, container: Option<&str>) -> Self {
        use bollard::errors::Error;

        match (err, container) {
            (Error::DockerResponseServerError { status_code: 404, .. }, Some(id)) => {
                DockerError::ContainerNotFound(id.to_owned())
            }
            (
                err @ (Error::IOError { .. }
                | Error::HyperResponseError { .. }
                | Error::RequestTimeoutError),
                _,
            ) => DockerError::EngineUnavailable(err.to_string()),
            (other, _) => DockerError::ApiError(other),
        }
    }

    /// Errors worth another attempt when a call site opts into retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, DockerError::EngineUnavailable(_) | DockerError::ApiError(_))
    }
}

pub type Result<T> = std::result::Result<T, DockerError>;
