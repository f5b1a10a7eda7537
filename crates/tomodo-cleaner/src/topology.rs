//! Resolution of a deployment name to its containers and topology

use std::collections::{BTreeMap, HashMap};
use tomodo_docker::{ContainerEngine, Result};
use tomodo_types::{
    ContainerRef, Deployment, LabelSelector, Mongod, MongodRole, ReplicaSet, ShardedCluster,
    LABEL_DEPLOYMENT_TYPE, LABEL_GROUP, LABEL_SHARD_ID,
};
use tracing::{debug, warn};

/// A deployment as found on the engine during one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDeployment {
    /// `None` when no container could be modelled, including when the
    /// deployment has no containers at all
    pub deployment: Option<Deployment>,
    /// Every container carrying the deployment label, in teardown order
    pub containers: Vec<ContainerRef>,
}

impl ResolvedDeployment {
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

/// Query the engine once for the containers labelled with `name`.
///
/// No matching containers is not an error: the result is simply empty.
pub async fn resolve<E: ContainerEngine + ?Sized>(engine: &E, name: &str) -> Result<ResolvedDeployment> {
    let containers = engine
        .list_containers(&LabelSelector::deployment(name))
        .await?;
    debug!("Found {} containers for deployment '{}'", containers.len(), name);
    Ok(assemble(name, containers))
}

struct Member {
    mongod: Mongod,
    group: Option<String>,
    shard_id: u32,
    sharded: bool,
    container: ContainerRef,
}

/// Build the topology from labelled containers.
///
/// Containers whose labels cannot be modelled are kept and placed after the
/// modelled ones; the deployment label alone decides membership.
pub fn assemble(name: &str, containers: Vec<ContainerRef>) -> ResolvedDeployment {
    let mut members = Vec::new();
    let mut unmodelled = Vec::new();

    for container in containers {
        match Mongod::from_container(&container) {
            Ok(mongod) => {
                let shard_id = match container.label(LABEL_SHARD_ID).map(str::parse::<u32>) {
                    Some(Ok(id)) => id,
                    Some(Err(_)) => {
                        warn!(
                            "Container {} has an invalid shard id, assuming shard 0",
                            container.short_id
                        );
                        0
                    }
                    None => 0,
                };
                members.push(Member {
                    group: container.label(LABEL_GROUP).map(str::to_owned),
                    sharded: container.label(LABEL_DEPLOYMENT_TYPE) == Some("sharded"),
                    shard_id,
                    mongod,
                    container,
                });
            }
            Err(e) => {
                warn!(
                    "Container {} of deployment '{}' cannot be modelled: {}",
                    container.short_id, name, e
                );
                unmodelled.push(container);
            }
        }
    }

    if members.is_empty() {
        return ResolvedDeployment {
            deployment: None,
            containers: unmodelled,
        };
    }

    // Provisioning hands out ports in order, so port order is member order.
    // The sort is stable: equal ports keep the engine's listing order.
    members.sort_by_key(|member| member.mongod.port);

    let mut by_id: HashMap<String, ContainerRef> = members
        .iter()
        .map(|member| (member.container.id.clone(), member.container.clone()))
        .collect();

    let deployment = build_deployment(name, members);
    let mut ordered: Vec<ContainerRef> = deployment
        .container_ids()
        .into_iter()
        .filter_map(|id| by_id.remove(id))
        .collect();
    ordered.extend(unmodelled);

    ResolvedDeployment {
        deployment: Some(deployment),
        containers: ordered,
    }
}

fn build_deployment(name: &str, members: Vec<Member>) -> Deployment {
    let sharded = members.iter().any(|member| {
        member.sharded
            || matches!(member.mongod.role, MongodRole::ConfigServer | MongodRole::Router)
    });

    if sharded {
        return Deployment::ShardedCluster(build_cluster(name, members));
    }

    if let [only] = members.as_slice() {
        if only.mongod.role == MongodRole::Standalone {
            return Deployment::Standalone(only.mongod.clone());
        }
    }

    let group = members
        .iter()
        .find_map(|member| member.group.clone())
        .unwrap_or_else(|| name.to_owned());
    Deployment::ReplicaSet(ReplicaSet {
        name: group,
        members: members.into_iter().map(|member| member.mongod).collect(),
    })
}

fn build_cluster(name: &str, members: Vec<Member>) -> ShardedCluster {
    let mut config_servers = Vec::new();
    let mut config_group = None;
    let mut routers = Vec::new();
    let mut shards: BTreeMap<u32, (Option<String>, Vec<Mongod>)> = BTreeMap::new();

    for member in members {
        match member.mongod.role {
            MongodRole::ConfigServer => {
                config_group = config_group.or(member.group);
                config_servers.push(member.mongod);
            }
            MongodRole::Router => routers.push(member.mongod),
            MongodRole::Standalone | MongodRole::ReplicaMember => {
                let shard = shards.entry(member.shard_id).or_default();
                if shard.0.is_none() {
                    shard.0 = member.group;
                }
                shard.1.push(member.mongod);
            }
        }
    }

    ShardedCluster {
        name: name.to_owned(),
        config_server_replica_set: ReplicaSet {
            name: config_group.unwrap_or_else(|| format!("{}-cfg", name)),
            members: config_servers,
        },
        shards: shards
            .into_iter()
            .map(|(shard_id, (group, members))| ReplicaSet {
                name: group.unwrap_or_else(|| format!("{}-sh-{}", name, shard_id)),
                members,
            })
            .collect(),
        routers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tomodo_types::{ContainerState, LABEL_DEPLOYMENT_NAME, LABEL_PORT, LABEL_ROLE};

    fn container(id: &str, labels: &[(&str, &str)]) -> ContainerRef {
        let mut all: HashMap<String, String> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        all.insert(LABEL_DEPLOYMENT_NAME.to_string(), "unit-test".to_string());
        ContainerRef::new(id, format!("unit-test-{id}"), all, ContainerState::Running)
    }

    fn ids(resolved: &ResolvedDeployment) -> Vec<&str> {
        resolved.containers.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_empty_deployment() {
        let resolved = assemble("unit-test", Vec::new());
        assert!(resolved.is_empty());
        assert_eq!(resolved.deployment, None);
    }

    #[test]
    fn test_standalone() {
        let resolved = assemble(
            "unit-test",
            vec![container("sa", &[(LABEL_DEPLOYMENT_TYPE, "standalone")])],
        );
        assert!(matches!(resolved.deployment, Some(Deployment::Standalone(_))));
        assert_eq!(ids(&resolved), vec!["sa"]);
    }

    #[test]
    fn test_replica_set_orders_members_by_port() {
        let resolved = assemble(
            "unit-test",
            vec![
                container("m3", &[(LABEL_DEPLOYMENT_TYPE, "replica-set"), (LABEL_PORT, "27019"), (LABEL_GROUP, "rs0")]),
                container("m1", &[(LABEL_DEPLOYMENT_TYPE, "replica-set"), (LABEL_PORT, "27017"), (LABEL_GROUP, "rs0")]),
                container("m2", &[(LABEL_DEPLOYMENT_TYPE, "replica-set"), (LABEL_PORT, "27018"), (LABEL_GROUP, "rs0")]),
            ],
        );

        assert_eq!(ids(&resolved), vec!["m1", "m2", "m3"]);
        match resolved.deployment {
            Some(Deployment::ReplicaSet(rs)) => {
                assert_eq!(rs.name, "rs0");
                assert_eq!(rs.members.len(), 3);
            }
            other => panic!("expected a replica set, got {other:?}"),
        }
    }

    #[test]
    fn test_sharded_cluster_order() {
        let sharded = (LABEL_DEPLOYMENT_TYPE, "sharded");
        let resolved = assemble(
            "unit-test",
            vec![
                container("router", &[sharded, (LABEL_ROLE, "mongos"), (LABEL_PORT, "27017")]),
                container("sh1-a", &[sharded, (LABEL_ROLE, "rs-member"), (LABEL_SHARD_ID, "1"), (LABEL_PORT, "27030")]),
                container("sh0-b", &[sharded, (LABEL_ROLE, "rs-member"), (LABEL_SHARD_ID, "0"), (LABEL_PORT, "27022")]),
                container("cfg", &[sharded, (LABEL_ROLE, "config-svr"), (LABEL_PORT, "27018")]),
                container("sh0-a", &[sharded, (LABEL_ROLE, "rs-member"), (LABEL_SHARD_ID, "0"), (LABEL_PORT, "27021")]),
            ],
        );

        assert_eq!(ids(&resolved), vec!["cfg", "sh0-a", "sh0-b", "sh1-a", "router"]);
        match resolved.deployment {
            Some(Deployment::ShardedCluster(cluster)) => {
                assert_eq!(cluster.config_server_replica_set.name, "unit-test-cfg");
                assert_eq!(cluster.shards.len(), 2);
                assert_eq!(cluster.shards[1].name, "unit-test-sh-1");
                assert_eq!(cluster.routers.len(), 1);
            }
            other => panic!("expected a sharded cluster, got {other:?}"),
        }
    }

    #[test]
    fn test_unmodelled_containers_are_kept_last() {
        let resolved = assemble(
            "unit-test",
            vec![
                container("broken", &[(LABEL_ROLE, "arbiter")]),
                container("sa", &[]),
            ],
        );
        assert_eq!(ids(&resolved), vec!["sa", "broken"]);
        assert!(matches!(resolved.deployment, Some(Deployment::Standalone(_))));
    }

    #[test]
    fn test_only_unmodelled_containers() {
        let resolved = assemble("unit-test", vec![container("broken", &[(LABEL_PORT, "x")])]);
        assert_eq!(resolved.deployment, None);
        assert_eq!(ids(&resolved), vec!["broken"]);
    }
}
