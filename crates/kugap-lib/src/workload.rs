//! Ownership resolution and workload aggregation
//!
//! Groups running pods by their top-level owning controller. Resolution
//! walks exactly two hops: Pod -> ReplicaSet -> Deployment, using a
//! lookup table pre-built from the replica-set listing so each pod
//! resolves in O(1).

use std::collections::HashMap;

use anyhow::{Context, Result};
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::Pod;
use tracing::warn;

use crate::api::ClusterApi;
use crate::config::ReportConfig;
use crate::fetch::{apply_pod_usage, is_running, pod_summary, pod_usage_index};
use crate::model::{WorkloadKey, WorkloadKind, WorkloadReport, WorkloadSummary};

/// Builds the "namespace/replicaset-name" -> Deployment key table used
/// for the second resolution hop.
pub(crate) fn replica_set_owner_index(replica_sets: &[ReplicaSet]) -> HashMap<String, WorkloadKey> {
    let mut index = HashMap::new();
    for rs in replica_sets {
        let (Some(namespace), Some(name)) = (&rs.metadata.namespace, &rs.metadata.name) else {
            continue;
        };
        for owner in rs.metadata.owner_references.iter().flatten() {
            if owner.kind == "Deployment" {
                index.insert(
                    format!("{}/{}", namespace, name),
                    WorkloadKey {
                        kind: WorkloadKind::Deployment,
                        namespace: namespace.clone(),
                        name: owner.name.clone(),
                    },
                );
                break;
            }
        }
    }
    index
}

/// Resolves a pod to its effective workload identity.
///
/// Owner references come in arbitrary order; the first recognized kind
/// wins and the rest are ignored. A pod without a recognized owner is
/// its own workload under kind `Pod`.
pub(crate) fn resolve_owner(pod: &Pod, rs_owners: &HashMap<String, WorkloadKey>) -> WorkloadKey {
    let namespace = pod.metadata.namespace.clone().unwrap_or_default();

    for owner in pod.metadata.owner_references.iter().flatten() {
        let kind = match owner.kind.as_str() {
            "ReplicaSet" => {
                let rs_key = format!("{}/{}", namespace, owner.name);
                if let Some(deployment) = rs_owners.get(&rs_key) {
                    return deployment.clone();
                }
                WorkloadKind::ReplicaSet
            }
            "StatefulSet" => WorkloadKind::StatefulSet,
            "DaemonSet" => WorkloadKind::DaemonSet,
            "Job" => WorkloadKind::Job,
            _ => continue,
        };
        return WorkloadKey {
            kind,
            namespace,
            name: owner.name.clone(),
        };
    }

    WorkloadKey {
        kind: WorkloadKind::Pod,
        namespace,
        name: pod.metadata.name.clone().unwrap_or_default(),
    }
}

/// Fetches pods, pod metrics, and replica sets concurrently, then
/// aggregates running pods grouped by their owning controller. The
/// replica-set listing is fatal-class (ownership resolution needs it);
/// pod metrics degrade to an availability flag.
pub async fn fetch_workloads(api: &dyn ClusterApi, config: &ReportConfig) -> Result<WorkloadReport> {
    let namespace = config.namespace.as_deref();
    let (pods, replica_sets, pod_usage) = tokio::try_join!(
        async { api.list_pods(namespace).await.context("failed to list pods") },
        async {
            api.list_replica_sets()
                .await
                .context("failed to list replicasets")
        },
        async {
            Ok::<_, anyhow::Error>(match api.list_pod_metrics(namespace).await {
                Ok(items) => Some(items),
                Err(err) => {
                    warn!(error = %err, "failed to get pod metrics (metrics-server may not be installed)");
                    None
                }
            })
        },
    )?;

    let metrics_available = pod_usage.is_some();
    let rs_owners = replica_set_owner_index(&replica_sets);
    let pod_usage_by_key = pod_usage_index(pod_usage.unwrap_or_default());

    let mut groups: HashMap<WorkloadKey, WorkloadSummary> = HashMap::new();

    for pod in pods.iter().filter(|p| is_running(p)) {
        let mut summary = pod_summary(pod);
        if config.hides_namespace(&summary.namespace) {
            continue;
        }

        if metrics_available {
            let key = format!("{}/{}", summary.namespace, summary.name);
            if let Some(usage) = pod_usage_by_key.get(&key) {
                apply_pod_usage(&mut summary, usage);
            }
        }

        let owner = resolve_owner(pod, &rs_owners);
        let group = groups.entry(owner.clone()).or_insert_with(|| WorkloadSummary {
            kind: owner.kind,
            namespace: owner.namespace,
            name: owner.name,
            pod_count: 0,
            cpu_request: 0,
            cpu_actual: 0,
            mem_request: 0.0,
            mem_actual: 0.0,
            metrics_available,
        });

        group.pod_count += 1;
        group.cpu_request += summary.cpu_request;
        group.mem_request += summary.mem_request;
        group.cpu_actual += summary.cpu_actual;
        group.mem_actual += summary.mem_actual;
    }

    Ok(WorkloadReport {
        workloads: groups.into_values().collect(),
        metrics_available,
    })
}
