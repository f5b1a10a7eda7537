use tomodo_cleaner::{Cleaner, TeardownReport};
use tomodo_docker::{ContainerEngine, DockerError, RetryExhausted, Shell, ShellBridge, ShellOutput};
use tomodo_network::PortChecker;
use tomodo_types::{parse_key_value_pairs, Deployment, LabelSelector, Mongod, Version, LABEL_VERSION};
use tracing::{debug, warn};

use crate::cli::{Commands, OutputFormat};
use crate::config::TomodoConfig;
use crate::display;
use crate::error::{CliError, Result};

/// Check that every port is free on `host`; needs no engine
pub async fn check_ports(ports: &[u16], host: &str) -> Result<()> {
    if PortChecker::is_port_range_available(ports, host).await {
        display::success(&format!("All {} port(s) are available on {}", ports.len(), host));
        Ok(())
    } else {
        Err(CliError::PortsUnavailable)
    }
}

pub struct CommandHandler<E: ContainerEngine> {
    cleaner: Cleaner<E>,
    config: TomodoConfig,
    output_format: OutputFormat,
}

impl<E: ContainerEngine> CommandHandler<E> {
    pub fn new(engine: E, config: TomodoConfig) -> Self {
        let cleaner = Cleaner::new(engine)
            .with_data_root(config.data_root.clone())
            .with_retry(config.retry.policy());
        Self {
            cleaner,
            config,
            output_format: OutputFormat::Table,
        }
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub async fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Stop { name, all } => self.stop(name, all).await,
            Commands::Remove { name, all } => self.remove(name, all).await,
            Commands::List { filter } => {
                let names = self.list(filter.as_deref()).await?;
                println!("{}", display::render_names(&names, self.output_format)?);
                Ok(())
            }
            Commands::Describe { name } => self.describe(&name).await,
            Commands::CheckPorts { ports, host } => check_ports(&ports, &host).await,
            Commands::Eval {
                name,
                command,
                shell,
                json,
            } => {
                let result = self.eval(&name, &command, shell.map(Shell::from), json).await?;
                println!("{}", result.output);
                if result.exit_code != 0 {
                    return Err(CliError::CommandFailed(result.exit_code));
                }
                Ok(())
            }
        }
    }

    pub async fn stop(&self, name: Option<String>, all: bool) -> Result<()> {
        let reports = match (name, all) {
            (_, true) => self.cleaner.stop_all_deployments().await?,
            (Some(name), false) => vec![self.cleaner.stop_deployment(&name).await?],
            (None, false) => return Err(missing_name()),
        };
        report_teardown(&reports)
    }

    pub async fn remove(&self, name: Option<String>, all: bool) -> Result<()> {
        let reports = match (name, all) {
            (_, true) => self.cleaner.delete_all_deployments().await?,
            (Some(name), false) => vec![self.cleaner.delete_deployment(&name).await?],
            (None, false) => return Err(missing_name()),
        };
        report_teardown(&reports)
    }

    /// Names of the deployments matching a `key=value,...` label filter
    pub async fn list(&self, filter: Option<&str>) -> Result<Vec<String>> {
        let mut selector = LabelSelector::new();
        if let Some(labels) = parse_key_value_pairs(filter, ",", "=")? {
            selector.extend(labels);
        }
        Ok(self.cleaner.list_deployments(&selector).await?)
    }

    pub async fn describe(&self, name: &str) -> Result<()> {
        let deployment = self.find(name).await?;
        match self.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deployment)?),
            format => {
                if format == OutputFormat::Table {
                    println!("{}", deployment);
                }
                println!("{}", display::render_members(&deployment.describe(), format)?);
            }
        }
        Ok(())
    }

    /// Evaluate `command` with the database shell on the deployment's entry
    /// point: the first router of a sharded cluster, the first member
    /// otherwise.
    pub async fn eval(
        &self,
        name: &str,
        command: &str,
        shell: Option<Shell>,
        serialize_json: bool,
    ) -> Result<ShellOutput> {
        let resolved = tomodo_cleaner::resolve(self.cleaner.engine(), name).await?;
        let deployment = resolved
            .deployment
            .ok_or_else(|| CliError::DeploymentNotFound(name.to_owned()))?;
        let target = entry_point(&deployment)
            .ok_or_else(|| CliError::DeploymentNotFound(name.to_owned()))?;

        let shell = match shell {
            Some(shell) => shell,
            None => {
                let version = resolved
                    .containers
                    .iter()
                    .find(|container| Some(container.id.as_str()) == target.container_id.as_deref())
                    .and_then(|container| container.label(LABEL_VERSION));
                shell_for_version(version)
            }
        };
        debug!("Evaluating on {} with {}", target.name, shell);

        let bridge = ShellBridge::new(self.cleaner.engine()).with_auth(self.config.auth.clone());
        let policy = self.config.retry.policy();
        let output = policy
            .run("eval", DockerError::is_transient, || {
                bridge.run(command, target, shell, serialize_json)
            })
            .await?;
        output.ok_or_else(|| {
            DockerError::from(RetryExhausted {
                operation: "eval".to_string(),
                attempts: policy.max_attempts,
            })
            .into()
        })
    }

    async fn find(&self, name: &str) -> Result<Deployment> {
        self.cleaner
            .describe_deployment(name)
            .await?
            .ok_or_else(|| CliError::DeploymentNotFound(name.to_owned()))
    }
}

fn missing_name() -> CliError {
    CliError::InvalidInput("a deployment name or --all is required".to_string())
}

fn entry_point(deployment: &Deployment) -> Option<&Mongod> {
    match deployment {
        Deployment::ShardedCluster(cluster) => cluster.routers.first(),
        other => other.members().into_iter().next(),
    }
}

/// Shell to request for a server version label; unknown or unparsable
/// versions get the default shell.
pub fn shell_for_version(version: Option<&str>) -> Shell {
    match version.map(str::parse::<Version>) {
        Some(Ok(version)) => Shell::for_server_version(&version),
        Some(Err(e)) => {
            warn!("Ignoring server version label: {}", e);
            Shell::default()
        }
        None => Shell::default(),
    }
}

fn report_teardown(reports: &[TeardownReport]) -> Result<()> {
    if reports.is_empty() {
        display::warning("No deployments found");
        return Ok(());
    }

    let mut failures = 0;
    for report in reports {
        if report.is_clean() {
            display::success(&display::summarize(report));
        } else {
            display::failure(&display::summarize(report));
            for (container, error) in report.failures() {
                display::failure(&format!("  {}: {}", container, error));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        Err(CliError::TeardownIncomplete(failures))
    } else {
        Ok(())
    }
}
