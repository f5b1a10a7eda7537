//! Deployment teardown
//!
//! Resolves a deployment name to its containers through the engine's labels
//! and stops or removes them one by one. A failure on one container is
//! recorded in the [`TeardownReport`] and never prevents the remaining
//! containers from being processed.

pub mod cleaner;
pub mod error;
pub mod fs;
pub mod topology;

pub use cleaner::{Cleaner, ContainerAction, ContainerOutcome, DataDirOutcome, TeardownReport};
pub use error::{CleanerError, Result};
pub use fs::{Filesystem, StdFilesystem};
pub use topology::{resolve, ResolvedDeployment};

/// Where deployments keep their on-disk data unless configured otherwise
pub const DEFAULT_DATA_ROOT: &str = "/var/tmp/tomodo/data";
