pub mod error;
pub mod port;

pub use error::{NetworkError, Result};
pub use port::{PortChecker, PortStatus};
