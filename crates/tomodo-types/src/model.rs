//! Deployment topologies and their member instances

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::container::{ContainerRef, LABEL_DEPLOYMENT_TYPE, LABEL_PORT, LABEL_ROLE};
use crate::error::{ModelError, Result};

/// Port used when a container carries no port label
pub const DEFAULT_PORT: u16 = 27017;

/// Role of a single database process within its deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MongodRole {
    Standalone,
    ReplicaMember,
    ConfigServer,
    Router,
}

impl MongodRole {
    pub fn as_label(&self) -> &'static str {
        match self {
            MongodRole::Standalone => "standalone",
            MongodRole::ReplicaMember => "rs-member",
            MongodRole::ConfigServer => "config-svr",
            MongodRole::Router => "mongos",
        }
    }

    /// Process kind shown in deployment summaries
    pub fn kind(&self) -> &'static str {
        match self {
            MongodRole::Standalone | MongodRole::ReplicaMember => "mongod",
            MongodRole::ConfigServer => "mongod (config)",
            MongodRole::Router => "mongos",
        }
    }
}

impl std::str::FromStr for MongodRole {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standalone" => Ok(MongodRole::Standalone),
            "rs-member" => Ok(MongodRole::ReplicaMember),
            "config-svr" => Ok(MongodRole::ConfigServer),
            "mongos" => Ok(MongodRole::Router),
            other => Err(ModelError::InvalidLabel {
                key: LABEL_ROLE.to_owned(),
                value: other.to_owned(),
            }),
        }
    }
}

/// A single database process running in its own container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mongod {
    pub name: String,
    pub port: u16,
    pub hostname: String,
    pub container_id: Option<String>,
    pub role: MongodRole,
}

impl Mongod {
    /// Build a member from a container's labels.
    ///
    /// A missing role falls back to the deployment type label: members of
    /// replica sets and sharded clusters default to `rs-member`, anything
    /// else to `standalone`.
    pub fn from_container(container: &ContainerRef) -> Result<Self> {
        let role = match container.label(LABEL_ROLE) {
            Some(role) => role.parse()?,
            None => match container.label(LABEL_DEPLOYMENT_TYPE) {
                Some("replica-set") | Some("sharded") => MongodRole::ReplicaMember,
                _ => MongodRole::Standalone,
            },
        };
        let port = match container.label(LABEL_PORT) {
            Some(port) => port.parse().map_err(|_| ModelError::InvalidLabel {
                key: LABEL_PORT.to_owned(),
                value: port.to_owned(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            name: container.name.clone(),
            port,
            hostname: container.name.clone(),
            container_id: Some(container.id.clone()),
            role,
        })
    }

    pub fn summary(&self) -> MemberSummary {
        MemberSummary {
            name: self.name.clone(),
            port: self.port,
            kind: self.role.kind().to_owned(),
            hostname: format!("{}:{}", self.name, self.port),
            container_id: self
                .container_id
                .clone()
                .unwrap_or_else(|| "N/A".to_owned()),
        }
    }
}

/// A named group of members, ordered as provisioned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSet {
    pub name: String,
    pub members: Vec<Mongod>,
}

/// A config server replica set, shard replica sets and routers.
/// None of these are shared with another deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardedCluster {
    pub name: String,
    pub config_server_replica_set: ReplicaSet,
    pub shards: Vec<ReplicaSet>,
    pub routers: Vec<Mongod>,
}

/// The logical unit a user refers to by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Deployment {
    Standalone(Mongod),
    ReplicaSet(ReplicaSet),
    ShardedCluster(ShardedCluster),
}

/// One row of a deployment summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub name: String,
    pub port: u16,
    pub kind: String,
    pub hostname: String,
    pub container_id: String,
}

impl Deployment {
    pub fn kind(&self) -> &'static str {
        match self {
            Deployment::Standalone(_) => "standalone",
            Deployment::ReplicaSet(_) => "replica set",
            Deployment::ShardedCluster(_) => "sharded cluster",
        }
    }

    /// All members in teardown order: config servers, shards in shard order,
    /// then routers for sharded clusters; member order for replica sets.
    pub fn members(&self) -> Vec<&Mongod> {
        match self {
            Deployment::Standalone(mongod) => vec![mongod],
            Deployment::ReplicaSet(rs) => rs.members.iter().collect(),
            Deployment::ShardedCluster(cluster) => cluster
                .config_server_replica_set
                .members
                .iter()
                .chain(cluster.shards.iter().flat_map(|shard| shard.members.iter()))
                .chain(cluster.routers.iter())
                .collect(),
        }
    }

    pub fn container_ids(&self) -> Vec<&str> {
        self.members()
            .into_iter()
            .filter_map(|member| member.container_id.as_deref())
            .collect()
    }

    /// Summary rows: config servers, routers, then shard members for
    /// sharded clusters.
    pub fn describe(&self) -> Vec<MemberSummary> {
        match self {
            Deployment::Standalone(mongod) => vec![mongod.summary()],
            Deployment::ReplicaSet(rs) => rs.members.iter().map(Mongod::summary).collect(),
            Deployment::ShardedCluster(cluster) => cluster
                .config_server_replica_set
                .members
                .iter()
                .chain(cluster.routers.iter())
                .chain(cluster.shards.iter().flat_map(|shard| shard.members.iter()))
                .map(Mongod::summary)
                .collect(),
        }
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Deployment::Standalone(mongod) => &mongod.name,
            Deployment::ReplicaSet(rs) => &rs.name,
            Deployment::ShardedCluster(cluster) => &cluster.name,
        };
        write!(f, "{} ({})", name, self.kind())
    }
}
