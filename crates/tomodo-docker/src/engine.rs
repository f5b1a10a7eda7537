use async_trait::async_trait;
use tomodo_types::{ContainerRef, LabelSelector};
use tracing::debug;

use crate::error::Result;

/// Output of a command executed inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub output: String,
}

/// The container engine operations tomodo relies on.
///
/// Every call goes to the engine: implementations must not cache container
/// state between calls.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn ping(&self) -> Result<()>;

    /// List containers (running or not) matching every label in `selector`
    async fn list_containers(&self, selector: &LabelSelector) -> Result<Vec<ContainerRef>>;

    /// Fetch the current state of a single container
    async fn get_container(&self, id: &str) -> Result<ContainerRef>;

    async fn stop_container(&self, id: &str) -> Result<()>;

    async fn remove_container(&self, id: &str, force: bool) -> Result<()>;

    async fn exec(&self, id: &str, cmd: &[String]) -> Result<ExecOutput>;
}

pub async fn is_engine_running<E: ContainerEngine + ?Sized>(engine: &E) -> bool {
    match engine.ping().await {
        Ok(()) => true,
        Err(e) => {
            debug!("Container engine ping failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DockerError;

    #[test]
    fn test_engine_running_reflects_ping() {
        let mut engine = MockContainerEngine::new();
        engine.expect_ping().times(1).returning(|| Ok(()));
        assert!(tokio_test::block_on(is_engine_running(&engine)));

        let mut engine = MockContainerEngine::new();
        engine
            .expect_ping()
            .returning(|| Err(DockerError::EngineUnavailable("socket missing".to_string())));
        assert!(!tokio_test::block_on(is_engine_running(&engine)));
    }
}
