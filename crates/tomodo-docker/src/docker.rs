use async_trait::async_trait;
use bollard::container::{
    InspectContainerOptions, ListContainersOptions, RemoveContainerOptions, StopContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::models::{ContainerInspectResponse, ContainerSummary};
use bollard::Docker;
use futures_util::stream::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tomodo_types::{ContainerRef, ContainerState, LabelSelector};
use tracing::debug;

use crate::engine::{ContainerEngine, ExecOutput};
use crate::error::{DockerError, Result};

/// Connection settings for the local Docker engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Socket or named pipe; the platform default when unset
    pub socket_path: Option<String>,
    pub timeout_seconds: u64,
    /// Grace period given to a container before it is killed on stop
    pub stop_timeout_seconds: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            socket_path: None,
            timeout_seconds: 120,
            stop_timeout_seconds: 10,
        }
    }
}

/// [`ContainerEngine`] backed by the Docker API
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
    stop_timeout: i64,
}

impl DockerEngine {
    pub fn connect(settings: &EngineSettings) -> Result<Self> {
        let docker = match &settings.socket_path {
            Some(path) => Docker::connect_with_local(
                path,
                settings.timeout_seconds,
                bollard::API_DEFAULT_VERSION,
            ),
            None => Docker::connect_with_local_defaults()
                .map(|docker| docker.with_timeout(std::time::Duration::from_secs(settings.timeout_seconds))),
        }
        .map_err(|e| DockerError::EngineUnavailable(e.to_string()))?;

        Ok(Self {
            docker,
            stop_timeout: settings.stop_timeout_seconds,
        })
    }

    fn from_summary(summary: ContainerSummary) -> ContainerRef {
        let name = summary
            .names
            .and_then(|names| names.into_iter().next())
            .map(|name| name.trim_start_matches('/').to_owned())
            .unwrap_or_default();
        let state = summary
            .state
            .as_deref()
            .map(ContainerState::from)
            .unwrap_or(ContainerState::Unknown);

        ContainerRef::new(
            summary.id.unwrap_or_default(),
            name,
            summary.labels.unwrap_or_default(),
            state,
        )
    }

    fn from_inspect(id: &str, info: ContainerInspectResponse) -> ContainerRef {
        let state = match info.state.and_then(|state| state.running) {
            Some(true) => ContainerState::Running,
            Some(false) => ContainerState::Stopped,
            None => ContainerState::Unknown,
        };
        let labels = info
            .config
            .and_then(|config| config.labels)
            .unwrap_or_default();
        let name = info
            .name
            .map(|name| name.trim_start_matches('/').to_owned())
            .unwrap_or_default();

        ContainerRef::new(info.id.unwrap_or_else(|| id.to_owned()), name, labels, state)
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| DockerError::EngineUnavailable(e.to_string()))
    }

    async fn list_containers(&self, selector: &LabelSelector) -> Result<Vec<ContainerRef>> {
        let mut filters = HashMap::new();
        if !selector.is_empty() {
            filters.insert("label".to_owned(), selector.to_filters());
        }

        let options = ListContainersOptions::<String> {
            all: true,
            filters,
            ..Default::default()
        };

        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| DockerError::from_engine(e, None))?;
        debug!("Engine returned {} containers for {:?}", summaries.len(), selector.to_filters());

        Ok(summaries.into_iter().map(Self::from_summary).collect())
    }

    async fn get_container(&self, id: &str) -> Result<ContainerRef> {
        let info = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| DockerError::from_engine(e, Some(id)))?;
        Ok(Self::from_inspect(id, info))
    }

    async fn stop_container(&self, id: &str) -> Result<()> {
        let options = StopContainerOptions {
            t: self.stop_timeout,
        };
        self.docker
            .stop_container(id, Some(options))
            .await
            .map_err(|e| DockerError::from_engine(e, Some(id)))
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        let options = RemoveContainerOptions {
            force,
            v: true,
            ..Default::default()
        };
        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| DockerError::from_engine(e, Some(id)))
    }

    async fn exec(&self, id: &str, cmd: &[String]) -> Result<ExecOutput> {
        let exec_options = CreateExecOptions {
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            cmd: Some(cmd.to_vec()),
            ..Default::default()
        };

        let exec = self
            .docker
            .create_exec(id, exec_options)
            .await
            .map_err(|e| DockerError::from_engine(e, Some(id)))?;

        let mut output = String::new();
        match self
            .docker
            .start_exec(&exec.id, None)
            .await
            .map_err(|e| DockerError::from_engine(e, Some(id)))?
        {
            StartExecResults::Attached { output: mut stream, .. } => {
                while let Some(msg) = stream.next().await {
                    let msg = msg.map_err(|e| DockerError::from_engine(e, Some(id)))?;
                    output.push_str(&msg.to_string());
                }
            }
            StartExecResults::Detached => {
                return Err(DockerError::EngineUnavailable(format!(
                    "Failed to attach to exec in container {}",
                    id
                )));
            }
        }

        let inspect = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(|e| DockerError::from_engine(e, Some(id)))?;

        Ok(ExecOutput {
            exit_code: inspect.exit_code.unwrap_or(-1),
            output,
        })
    }
}
