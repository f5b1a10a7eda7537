use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tomodo_cleaner::DEFAULT_DATA_ROOT;
use tomodo_docker::{AuthConfig, EngineSettings, RetryPolicy};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomodoConfig {
    /// Parent directory of every deployment's data directory
    pub data_root: PathBuf,
    pub docker: EngineSettings,
    pub retry: RetrySettings,
    /// Credentials passed to the database shell
    pub auth: Option<AuthConfig>,
}

impl Default for TomodoConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            docker: EngineSettings::default(),
            retry: RetrySettings::default(),
            auth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_seconds: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_seconds: 1,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.delay_seconds))
    }
}

pub struct ConfigManager {
    config: TomodoConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Load the configuration file, falling back to defaults when it does
    /// not exist. A file that exists but does not parse is an error.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(Self::default_config_path);

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            TomodoConfig::default()
        };

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tomodo")
            .join("config.toml")
    }

    pub fn load_config(path: &Path) -> Result<TomodoConfig> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn get_config(&self) -> &TomodoConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn set_data_root(&mut self, data_root: PathBuf) {
        self.config.data_root = data_root;
    }

    pub fn into_config(self) -> TomodoConfig {
        self.config
    }

    /// Problems worth warning about; none of them prevent running
    pub fn validate_config(&self) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        if self.config.retry.max_attempts == 0 {
            warnings.push("retry.max_attempts is 0: retried calls will never be attempted".to_string());
        }
        if self.config.docker.timeout_seconds == 0 {
            warnings.push("docker.timeout_seconds is 0: every engine call will time out".to_string());
        }
        if self.config.data_root.is_relative() {
            warnings.push(format!(
                "data_root '{}' is relative to the working directory",
                self.config.data_root.display()
            ));
        }
        if let Some(auth) = &self.config.auth {
            if auth.username.is_empty() {
                return Err(CliError::ConfigError(
                    "auth.username must not be empty".to_string(),
                ));
            }
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let manager = ConfigManager::new(Some(config_path.clone())).unwrap();

        assert_eq!(manager.get_config(), &TomodoConfig::default());
        assert_eq!(manager.config_path(), config_path);
        assert!(!config_path.exists());
        assert!(manager.validate_config().unwrap().is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
data_root = "/srv/tomodo"

[retry]
max_attempts = 3

[auth]
username = "admin"
password = "s3cret"
"#,
        )
        .unwrap();

        let config = ConfigManager::new(Some(config_path)).unwrap().into_config();

        assert_eq!(config.data_root, PathBuf::from("/srv/tomodo"));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay_seconds, 1);
        assert_eq!(config.docker.timeout_seconds, 120);
        assert_eq!(config.auth.unwrap().username, "admin");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "data_root = [").unwrap();

        assert!(matches!(
            ConfigManager::new(Some(config_path)),
            Err(CliError::TomlError(_))
        ));
    }

    #[test]
    fn test_validation_warnings() {
        let mut manager = ConfigManager::new(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        manager.config.retry.max_attempts = 0;
        manager.set_data_root(PathBuf::from("data"));

        let warnings = manager.validate_config().unwrap();
        assert_eq!(warnings.len(), 2);

        manager.config.auth = Some(AuthConfig {
            username: String::new(),
            password: "x".to_string(),
        });
        assert!(manager.validate_config().is_err());
    }

    #[test]
    fn test_retry_policy_from_settings() {
        let policy = RetrySettings {
            max_attempts: 2,
            delay_seconds: 3,
        }
        .policy();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.delay, Duration::from_secs(3));
        assert!(!policy.ignore_on_exhaustion);
    }
}
