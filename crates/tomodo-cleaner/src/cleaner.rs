use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use tomodo_docker::{ContainerEngine, DockerError, RetryExhausted, RetryPolicy};
use tomodo_types::{ContainerRef, Deployment, LabelSelector, LABEL_DEPLOYMENT_NAME};
use tracing::{debug, error, info, warn};

use crate::error::{CleanerError, Result};
use crate::fs::{Filesystem, StdFilesystem};
use crate::topology::{self, ResolvedDeployment};
use crate::DEFAULT_DATA_ROOT;

/// What happened to a single container during teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Stopped,
    /// The container was not running; nothing was done
    AlreadyStopped,
    Removed,
    /// The container disappeared between listing and acting on it
    Vanished,
}

#[derive(Debug)]
pub struct ContainerOutcome {
    pub container_id: String,
    pub result: std::result::Result<ContainerAction, CleanerError>,
}

#[derive(Debug)]
pub enum DataDirOutcome {
    Absent(PathBuf),
    Removed(PathBuf),
    Failed(CleanerError),
}

/// Per-container results of one teardown, in processing order
#[derive(Debug, Default)]
pub struct TeardownReport {
    pub deployment: String,
    pub containers: Vec<ContainerOutcome>,
    /// Only set by deletions
    pub data_dir: Option<DataDirOutcome>,
}

impl TeardownReport {
    fn new(deployment: &str) -> Self {
        Self {
            deployment: deployment.to_owned(),
            ..Default::default()
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &CleanerError)> {
        let containers = self
            .containers
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Ok(_) => None,
                Err(e) => Some((outcome.container_id.as_str(), e)),
            });
        let data_dir = match &self.data_dir {
            Some(DataDirOutcome::Failed(e)) => Some(("data directory", e)),
            _ => None,
        };
        containers.chain(data_dir)
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn count(&self, action: ContainerAction) -> usize {
        self.containers
            .iter()
            .filter(|outcome| matches!(outcome.result, Ok(a) if a == action))
            .count()
    }
}

/// Stops and removes deployments.
///
/// Containers are processed sequentially in topology order. Failures on one
/// container are logged and recorded; the rest of the deployment is still
/// processed.
pub struct Cleaner<E, F = StdFilesystem> {
    engine: E,
    fs: F,
    data_root: PathBuf,
    retry: Option<RetryPolicy>,
}

impl<E: ContainerEngine> Cleaner<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            fs: StdFilesystem,
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            retry: None,
        }
    }
}

impl<E: ContainerEngine, F: Filesystem> Cleaner<E, F> {
    pub fn with_filesystem<G: Filesystem>(self, fs: G) -> Cleaner<E, G> {
        Cleaner {
            engine: self.engine,
            fs,
            data_root: self.data_root,
            retry: self.retry,
        }
    }

    pub fn with_data_root(mut self, data_root: impl Into<PathBuf>) -> Self {
        self.data_root = data_root.into();
        self
    }

    /// Retry failed stop and remove calls on engine API errors. An
    /// unreachable engine is never retried here.
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// On-disk data directory of a deployment, always directly under the
    /// data root. Names that are not a single plain path segment are rejected.
    pub fn data_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = format!("{}-db", name);
        let mut components = Path::new(&dir).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.data_root.join(dir)),
            _ => Err(CleanerError::InvalidDeploymentName(name.to_owned())),
        }
    }

    pub async fn describe_deployment(&self, name: &str) -> Result<Option<Deployment>> {
        Ok(topology::resolve(&self.engine, name).await?.deployment)
    }

    /// Distinct names of all deployments known to the engine, sorted
    pub async fn list_deployments(&self, filter: &LabelSelector) -> Result<Vec<String>> {
        let selector = LabelSelector::managed()
            .with_key(LABEL_DEPLOYMENT_NAME)
            .and(filter);
        let containers = self.engine.list_containers(&selector).await?;

        let names: BTreeSet<String> = containers
            .iter()
            .filter_map(|container| container.deployment_name())
            .map(str::to_owned)
            .collect();
        Ok(names.into_iter().collect())
    }

    pub async fn stop_deployment(&self, name: &str) -> Result<TeardownReport> {
        let resolved = self.resolve(name).await?;
        let mut report = TeardownReport::new(name);

        for container in &resolved.containers {
            let result = self.stop_container(container).await;
            report.containers.push(ContainerOutcome {
                container_id: container.short_id.clone(),
                result,
            });
        }
        Ok(report)
    }

    /// Remove every container of the deployment, then its data directory.
    ///
    /// Removal is forced, so running containers are stopped by the engine.
    /// A failure to remove the data directory is logged and recorded in the
    /// report, never returned.
    pub async fn delete_deployment(&self, name: &str) -> Result<TeardownReport> {
        let resolved = self.resolve(name).await?;
        let mut report = TeardownReport::new(name);

        for container in &resolved.containers {
            let result = self.remove_container(container).await;
            report.containers.push(ContainerOutcome {
                container_id: container.short_id.clone(),
                result,
            });
        }

        report.data_dir = Some(match self.data_dir(name) {
            Ok(path) => self.remove_data_dir(&path),
            Err(err) => {
                error!("{}", err);
                DataDirOutcome::Failed(err)
            }
        });
        Ok(report)
    }

    pub async fn stop_all_deployments(&self) -> Result<Vec<TeardownReport>> {
        let mut reports = Vec::new();
        for name in self.list_deployments(&LabelSelector::new()).await? {
            reports.push(self.stop_deployment(&name).await?);
        }
        Ok(reports)
    }

    pub async fn delete_all_deployments(&self) -> Result<Vec<TeardownReport>> {
        let mut reports = Vec::new();
        for name in self.list_deployments(&LabelSelector::new()).await? {
            reports.push(self.delete_deployment(&name).await?);
        }
        Ok(reports)
    }

    async fn resolve(&self, name: &str) -> Result<ResolvedDeployment> {
        let resolved = topology::resolve(&self.engine, name).await?;
        if resolved.is_empty() {
            info!("No containers found for deployment '{}'", name);
        }
        Ok(resolved)
    }

    async fn stop_container(&self, container: &ContainerRef) -> std::result::Result<ContainerAction, CleanerError> {
        let short_id = &container.short_id;
        let live = match self.engine.get_container(&container.id).await {
            Ok(live) => live,
            Err(DockerError::ContainerNotFound(_)) => {
                warn!("Container {} no longer exists", short_id);
                return Ok(ContainerAction::Vanished);
            }
            Err(e) => {
                error!("Failed to inspect container {}: {}", short_id, e);
                return Err(e.into());
            }
        };

        if !live.state.is_running() {
            info!("Container {} isn't running", short_id);
            return Ok(ContainerAction::AlreadyStopped);
        }

        match self
            .call("stop_container", || self.engine.stop_container(&container.id))
            .await
        {
            Ok(()) => {
                info!("Container {} stopped", short_id);
                Ok(ContainerAction::Stopped)
            }
            Err(DockerError::ContainerNotFound(_)) => {
                warn!("Container {} no longer exists", short_id);
                Ok(ContainerAction::Vanished)
            }
            Err(e) => {
                error!("Failed to stop container {}: {}", short_id, e);
                Err(e.into())
            }
        }
    }

    async fn remove_container(&self, container: &ContainerRef) -> std::result::Result<ContainerAction, CleanerError> {
        let short_id = &container.short_id;
        match self
            .call("remove_container", || self.engine.remove_container(&container.id, true))
            .await
        {
            Ok(()) => {
                info!("Container {} removed", short_id);
                Ok(ContainerAction::Removed)
            }
            Err(DockerError::ContainerNotFound(_)) => {
                warn!("Container {} no longer exists", short_id);
                Ok(ContainerAction::Vanished)
            }
            Err(e) => {
                error!("Failed to remove container {}: {}", short_id, e);
                Err(e.into())
            }
        }
    }

    fn remove_data_dir(&self, path: &Path) -> DataDirOutcome {
        if !self.fs.exists(path) {
            debug!("Data directory '{}' does not exist", path.display());
            return DataDirOutcome::Absent(path.to_path_buf());
        }

        match self.fs.remove_dir_all(path) {
            Ok(()) => {
                info!("Removed data directory '{}'", path.display());
                DataDirOutcome::Removed(path.to_path_buf())
            }
            Err(source) => {
                let err = CleanerError::DataDirCleanup {
                    path: path.to_path_buf(),
                    source,
                };
                error!("{}", err);
                DataDirOutcome::Failed(err)
            }
        }
    }

    /// Run one engine call, retrying API errors when configured
    async fn call<T, Op, Fut>(&self, operation: &str, mut op: Op) -> std::result::Result<T, DockerError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, DockerError>>,
    {
        let policy = match &self.retry {
            Some(policy) => policy,
            None => return op().await,
        };

        policy
            .run(operation, is_retryable, op)
            .await?
            .ok_or_else(|| {
                RetryExhausted {
                    operation: operation.to_owned(),
                    attempts: policy.max_attempts,
                }
                .into()
            })
    }
}

fn is_retryable(err: &DockerError) -> bool {
    matches!(err, DockerError::ApiError(_))
}
