//! Common types shared across tomodo crates
//!
//! This crate holds the deployment model (standalone instances, replica sets
//! and sharded clusters), the container references resolved from the engine,
//! and the small parsing helpers used by the other crates.

pub mod container;
pub mod error;
pub mod model;
pub mod parse;
pub mod version;

pub use container::*;
pub use error::*;
pub use model::*;
pub use parse::*;
pub use version::*;
