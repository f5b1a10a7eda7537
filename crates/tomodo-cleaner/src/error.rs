use std::path::PathBuf;
use thiserror::Error;
use tomodo_docker::DockerError;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error(transparent)]
    Docker(#[from] DockerError),

    #[error("Refusing to clean up data of deployment '{0}': not a plain directory name")]
    InvalidDeploymentName(String),

    #[error("An error occurred while trying to remove '{}': {source}", path.display())]
    DataDirCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, CleanerError>;
