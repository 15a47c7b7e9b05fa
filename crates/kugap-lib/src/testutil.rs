//! In-memory cluster fixtures shared by the fetch and workload tests.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::{Container, Node, NodeStatus, Pod, PodSpec, PodStatus, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

use crate::api::{ClusterApi, ContainerUsage, NodeUsage, PodUsage};

/// A canned cluster. `node_usage`/`pod_usage` of `None` simulate an
/// unreachable metrics API; the `fail_*` switches simulate fatal listing
/// failures.
#[derive(Default)]
pub(crate) struct MockApi {
    pub nodes: Vec<Node>,
    pub pods: Vec<Pod>,
    pub replica_sets: Vec<ReplicaSet>,
    pub node_usage: Option<Vec<NodeUsage>>,
    pub pod_usage: Option<Vec<PodUsage>>,
    pub fail_nodes: bool,
    pub fail_pods: bool,
    pub fail_replica_sets: bool,
}

#[async_trait]
impl ClusterApi for MockApi {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        if self.fail_nodes {
            bail!("connection refused");
        }
        Ok(self.nodes.clone())
    }

    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>> {
        if self.fail_pods {
            bail!("connection refused");
        }
        Ok(self
            .pods
            .iter()
            .filter(|p| namespace.is_none() || p.metadata.namespace.as_deref() == namespace)
            .cloned()
            .collect())
    }

    async fn list_replica_sets(&self) -> Result<Vec<ReplicaSet>> {
        if self.fail_replica_sets {
            bail!("connection refused");
        }
        Ok(self.replica_sets.clone())
    }

    async fn list_node_metrics(&self) -> Result<Vec<NodeUsage>> {
        self.node_usage
            .clone()
            .ok_or_else(|| anyhow!("metrics API unreachable"))
    }

    async fn list_pod_metrics(&self, namespace: Option<&str>) -> Result<Vec<PodUsage>> {
        let items = self
            .pod_usage
            .clone()
            .ok_or_else(|| anyhow!("metrics API unreachable"))?;
        Ok(items
            .into_iter()
            .filter(|u| namespace.is_none() || u.metadata.namespace.as_deref() == namespace)
            .collect())
    }
}

fn quantities(cpu: &str, memory: &str) -> BTreeMap<String, Quantity> {
    [
        ("cpu".to_string(), Quantity(cpu.to_string())),
        ("memory".to_string(), Quantity(memory.to_string())),
    ]
    .into()
}

pub(crate) fn node(name: &str, allocatable_cpu: &str, allocatable_mem: &str) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        status: Some(NodeStatus {
            allocatable: Some(quantities(allocatable_cpu, allocatable_mem)),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn pod(namespace: &str, name: &str, node_name: &str, cpu_request: &str, mem_request: &str) -> Pod {
    pod_with_phase(namespace, name, node_name, cpu_request, mem_request, "Running")
}

pub(crate) fn pod_with_phase(
    namespace: &str,
    name: &str,
    node_name: &str,
    cpu_request: &str,
    mem_request: &str,
    phase: &str,
) -> Pod {
    Pod {
        metadata: ObjectMeta {
            namespace: Some(namespace.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            node_name: Some(node_name.to_string()),
            containers: vec![Container {
                name: "main".to_string(),
                resources: Some(ResourceRequirements {
                    requests: Some(quantities(cpu_request, mem_request)),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }),
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(crate) fn owned_by(mut pod: Pod, kind: &str, name: &str) -> Pod {
    let refs = pod.metadata.owner_references.get_or_insert_with(Vec::new);
    refs.push(OwnerReference {
        kind: kind.to_string(),
        name: name.to_string(),
        ..Default::default()
    });
    pod
}

pub(crate) fn replica_set(namespace: &str, name: &str, deployment: Option<&str>) -> ReplicaSet {
    ReplicaSet {
        metadata: ObjectMeta {
            namespace: Some(namespace.to_string()),
            name: Some(name.to_string()),
            owner_references: deployment.map(|d| {
                vec![OwnerReference {
                    kind: "Deployment".to_string(),
                    name: d.to_string(),
                    ..Default::default()
                }]
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub(crate) fn node_usage(name: &str, cpu: &str, memory: &str) -> NodeUsage {
    NodeUsage {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        usage: quantities(cpu, memory),
    }
}

pub(crate) fn pod_usage(namespace: &str, name: &str, cpu: &str, memory: &str) -> PodUsage {
    PodUsage {
        metadata: ObjectMeta {
            namespace: Some(namespace.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        },
        containers: vec![ContainerUsage {
            name: "main".to_string(),
            usage: quantities(cpu, memory),
        }],
    }
}
