//! Bridge to the administrative database shell running inside a container

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tomodo_types::{Mongod, Version};
use tracing::{debug, error};

use crate::engine::ContainerEngine;
use crate::error::{DockerError, Result};

/// Server log lines the legacy shell interleaves with command output,
/// e.g. `2024-01-01T00:00:00.000+0000 I NETWORK ...`
static SERVER_LOG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3}[+-][0-9]{4}\s+[A-Z]\s+.*$")
        .expect("server log line pattern is valid")
});

/// Drop server log lines from shell output, keeping the remaining lines in order
pub fn cleanup_output(output: &str) -> String {
    output
        .split('\n')
        .filter(|line| !SERVER_LOG_LINE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    /// `mongosh`
    #[default]
    Mongosh,
    /// The legacy `mongo` shell
    Mongo,
}

impl Shell {
    pub fn binary(&self) -> &'static str {
        match self {
            Shell::Mongosh => "mongosh",
            Shell::Mongo => "mongo",
        }
    }

    /// Shell to ask for first given the server version of the image.
    /// Images before 5.0 only ship the legacy shell.
    pub fn for_server_version(version: &Version) -> Self {
        if version.major >= 5 {
            Shell::Mongosh
        } else {
            Shell::Mongo
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"************")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub exit_code: i64,
    pub output: String,
    pub container_id: String,
}

/// Runs shell commands against the database process of a target container
pub struct ShellBridge<'a, E: ?Sized> {
    engine: &'a E,
    auth: Option<AuthConfig>,
}

impl<'a, E: ContainerEngine + ?Sized> ShellBridge<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Self { engine, auth: None }
    }

    pub fn with_auth(mut self, auth: Option<AuthConfig>) -> Self {
        self.auth = auth;
        self
    }

    /// Run `command` with the requested shell inside the target's container.
    ///
    /// The output is stripped of server log lines before it is returned.
    pub async fn run(
        &self,
        command: &str,
        target: &Mongod,
        shell: Shell,
        serialize_json: bool,
    ) -> Result<ShellOutput> {
        let container_id = target
            .container_id
            .as_deref()
            .ok_or_else(|| DockerError::ContainerNotFound(target.name.clone()))?;
        let container = self.engine.get_container(container_id).await?;

        let shell = self.resolve_shell(&container.id, shell).await?;
        let cmd = build_command(shell, &target.hostname, command, serialize_json, self.auth.as_ref());

        let result = self.engine.exec(&container.id, &cmd).await?;
        let raw = result.output.trim();
        debug!("Docker-exec [{}]: command output: {}", target.name, raw);
        debug!("Docker-exec [{}]: command exit code: {}", target.name, result.exit_code);

        Ok(ShellOutput {
            exit_code: result.exit_code,
            output: cleanup_output(raw),
            container_id: container.id,
        })
    }

    /// Find a usable shell binary, falling back from `mongosh` to the legacy
    /// `mongo` shell when the former is missing.
    pub async fn resolve_shell(&self, container_id: &str, requested: Shell) -> Result<Shell> {
        if self.has_binary(container_id, requested).await? {
            return Ok(requested);
        }

        let mut missing = requested;
        if requested == Shell::Mongosh {
            debug!(
                "The '{}' shell could not be found in the container. Checking for the legacy '{}' shell",
                requested,
                Shell::Mongo
            );
            if self.has_binary(container_id, Shell::Mongo).await? {
                return Ok(Shell::Mongo);
            }
            missing = Shell::Mongo;
        }

        error!("The '{}' shell could not be found in the container.", missing);
        Err(DockerError::ShellNotFound {
            shell: missing.to_string(),
            container: container_id.to_owned(),
        })
    }

    async fn has_binary(&self, container_id: &str, shell: Shell) -> Result<bool> {
        let probe = vec!["which".to_owned(), shell.binary().to_owned()];
        let result = self.engine.exec(container_id, &probe).await?;
        Ok(result.exit_code == 0)
    }
}

/// Argument vector for a non-interactive shell invocation
pub fn build_command(
    shell: Shell,
    hostname: &str,
    command: &str,
    serialize_json: bool,
    auth: Option<&AuthConfig>,
) -> Vec<String> {
    let command = if shell == Shell::Mongosh && serialize_json {
        format!("JSON.stringify({})", command)
    } else {
        command.to_owned()
    };

    let mut cmd = vec![
        shell.binary().to_owned(),
        hostname.to_owned(),
        "--quiet".to_owned(),
        "--norc".to_owned(),
        "--eval".to_owned(),
        command,
    ];
    if let Some(auth) = auth {
        cmd.extend([
            "--username".to_owned(),
            auth.username.clone(),
            "--password".to_owned(),
            auth.password.clone(),
        ]);
    }
    cmd
}
