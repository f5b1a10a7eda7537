use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Could not resolve host '{0}'")]
    UnresolvedHost(String),

    #[error("Connecting to {host}:{port} timed out")]
    Timeout { host: String, port: u16 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
