pub mod docker;
pub mod engine;
pub mod error;
pub mod retry;
pub mod shell;

pub use docker::{DockerEngine, EngineSettings};
pub use engine::{is_engine_running, ContainerEngine, ExecOutput};
#[cfg(any(test, feature = "mock"))]
pub use engine::MockContainerEngine;
pub use error::{DockerError, Result};
pub use retry::{RetryExhausted, RetryPolicy};
pub use shell::{cleanup_output, AuthConfig, Shell, ShellBridge, ShellOutput};
