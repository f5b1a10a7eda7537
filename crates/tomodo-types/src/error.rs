//! Error types for the deployment model

use thiserror::Error;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Version string is neither `X.Y.Z` nor `X.Y`
    #[error("Invalid version string: '{0}'")]
    InvalidVersion(String),

    /// A key/value segment did not split into exactly one key and one value
    #[error("Invalid key/value pair: '{0}'")]
    InvalidKeyValue(String),

    /// A container label carries a value the model cannot interpret
    #[error("Invalid value '{value}' for label '{key}'")]
    InvalidLabel { key: String, value: String },
}
