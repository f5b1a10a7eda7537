//! Container references and the label vocabulary used to group containers
//! into deployments

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label present on every container created by tomodo
pub const LABEL_SOURCE: &str = "source";
pub const SOURCE_TOMODO: &str = "tomodo";

/// Label binding a container to its deployment name
pub const LABEL_DEPLOYMENT_NAME: &str = "tomodo-name";
/// Deployment kind: `standalone`, `replica-set` or `sharded`
pub const LABEL_DEPLOYMENT_TYPE: &str = "tomodo-type";
/// Member role, see [`crate::MongodRole`]
pub const LABEL_ROLE: &str = "tomodo-role";
/// Replica set name the member belongs to
pub const LABEL_GROUP: &str = "tomodo-group";
pub const LABEL_PORT: &str = "tomodo-port";
pub const LABEL_SHARD_ID: &str = "tomodo-shard-id";
/// Server version of the image, e.g. `7.0` or `6.0.14`
pub const LABEL_VERSION: &str = "tomodo-version";

/// Length of the abbreviated container id shown in logs
pub const SHORT_ID_LEN: usize = 12;

/// Container state as far as teardown is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Stopped,
    Unknown,
}

impl ContainerState {
    pub fn is_running(&self) -> bool {
        matches!(self, ContainerState::Running)
    }
}

impl From<&str> for ContainerState {
    fn from(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "running" => ContainerState::Running,
            "stopped" | "exited" | "created" | "dead" | "paused" => ContainerState::Stopped,
            _ => ContainerState::Unknown,
        }
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerState::Running => write!(f, "running"),
            ContainerState::Stopped => write!(f, "stopped"),
            ContainerState::Unknown => write!(f, "unknown"),
        }
    }
}

/// A container as reported by the engine at one point in time.
///
/// Never cache these across operations: the state may change between
/// listing a container and acting on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRef {
    pub id: String,
    pub short_id: String,
    pub name: String,
    pub labels: HashMap<String, String>,
    pub state: ContainerState,
}

impl ContainerRef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        labels: HashMap<String, String>,
        state: ContainerState,
    ) -> Self {
        let id = id.into();
        let short_id = id.get(..SHORT_ID_LEN).unwrap_or(&id).to_owned();
        Self {
            id,
            short_id,
            name: name.into(),
            labels,
            state,
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn deployment_name(&self) -> Option<&str> {
        self.label(LABEL_DEPLOYMENT_NAME)
    }
}

/// Label filter passed to the engine when listing containers.
///
/// Each entry is either a bare key (`key`) or a key/value pair (`key=value`),
/// matching the engine's `label` filter syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    labels: Vec<(String, Option<String>)>,
}

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector matching every container managed by tomodo
    pub fn managed() -> Self {
        Self::new().with_label(LABEL_SOURCE, SOURCE_TOMODO)
    }

    /// Selector matching the containers of a single deployment
    pub fn deployment(name: &str) -> Self {
        Self::managed().with_label(LABEL_DEPLOYMENT_NAME, name)
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.push((key.to_owned(), Some(value.to_owned())));
        self
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.labels.push((key.to_owned(), None));
        self
    }

    /// Combine with another selector; a container must match both
    pub fn and(mut self, other: &LabelSelector) -> Self {
        self.labels.extend(other.labels.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Render the selector in the engine's filter syntax
    pub fn to_filters(&self) -> Vec<String> {
        self.labels
            .iter()
            .map(|(key, value)| match value {
                Some(value) => format!("{}={}", key, value),
                None => key.clone(),
            })
            .collect()
    }

    pub fn matches(&self, container: &ContainerRef) -> bool {
        self.labels.iter().all(|(key, value)| match value {
            Some(value) => container.label(key) == Some(value.as_str()),
            None => container.labels.contains_key(key),
        })
    }
}

impl Extend<(String, String)> for LabelSelector {
    fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
        self.labels
            .extend(iter.into_iter().map(|(key, value)| (key, Some(value))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_short_id_is_truncated() {
        let container = ContainerRef::new(
            "4f2a9c1b7d3e8f60a1b2c3d4e5f6",
            "unit-test-sa",
            HashMap::new(),
            ContainerState::Running,
        );
        assert_eq!(container.short_id, "4f2a9c1b7d3e");

        let short = ContainerRef::new("abc", "x", HashMap::new(), ContainerState::Running);
        assert_eq!(short.short_id, "abc");
    }

    #[test]
    fn test_container_state_conversion() {
        assert_eq!(ContainerState::from("running"), ContainerState::Running);
        assert_eq!(ContainerState::from("exited"), ContainerState::Stopped);
        assert_eq!(ContainerState::from("Stopped"), ContainerState::Stopped);
        assert_eq!(ContainerState::from("restarting"), ContainerState::Unknown);
        assert!(!ContainerState::Unknown.is_running());
    }

    #[test]
    fn test_label_selector_filters_and_matching() {
        let selector = LabelSelector::deployment("unit-test-rs").with_key(LABEL_ROLE);
        assert_eq!(
            selector.to_filters(),
            vec!["source=tomodo", "tomodo-name=unit-test-rs", "tomodo-role"]
        );

        let member = ContainerRef::new(
            "id1",
            "unit-test-rs-1",
            labels(&[
                (LABEL_SOURCE, SOURCE_TOMODO),
                (LABEL_DEPLOYMENT_NAME, "unit-test-rs"),
                (LABEL_ROLE, "rs-member"),
            ]),
            ContainerState::Running,
        );
        assert!(selector.matches(&member));
        assert_eq!(member.deployment_name(), Some("unit-test-rs"));

        let other = ContainerRef::new(
            "id2",
            "other-1",
            labels(&[(LABEL_SOURCE, SOURCE_TOMODO), (LABEL_DEPLOYMENT_NAME, "other")]),
            ContainerState::Running,
        );
        assert!(!selector.matches(&other));
        assert!(LabelSelector::new().matches(&other));
    }
}
