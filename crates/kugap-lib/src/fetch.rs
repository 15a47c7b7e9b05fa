//! Concurrent snapshot acquisition and node/pod aggregation
//!
//! Each report issues its required listings as independent concurrent
//! units joined with `tokio::try_join!`. Core listings (nodes, pods) are
//! fatal on failure and the first error cancels the siblings. Metrics
//! listings are non-fatal: a failure is logged and recorded as an
//! availability flag, and the report degrades to requests-only for that
//! axis. Aggregation only starts once every unit has completed.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use tracing::warn;

use crate::api::{ClusterApi, NodeUsage, PodUsage};
use crate::model::{NodeReport, NodeSummary, PodReport, PodSummary};
use crate::quantity;

pub(crate) fn is_running(pod: &Pod) -> bool {
    pod.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Running")
}

/// Malformed quantities from the API server degrade to zero with a
/// warning instead of aborting the report.
pub(crate) fn cpu_or_zero(q: &Quantity) -> i64 {
    quantity::cpu_millicores(q).unwrap_or_else(|err| {
        warn!(error = %err, "treating unparseable CPU quantity as zero");
        0
    })
}

pub(crate) fn mem_or_zero(q: &Quantity) -> f64 {
    quantity::mem_mib(q).unwrap_or_else(|err| {
        warn!(error = %err, "treating unparseable memory quantity as zero");
        0.0
    })
}

pub(crate) fn usage_cpu(usage: &BTreeMap<String, Quantity>) -> i64 {
    usage.get("cpu").map(cpu_or_zero).unwrap_or(0)
}

pub(crate) fn usage_mem(usage: &BTreeMap<String, Quantity>) -> f64 {
    usage.get("memory").map(mem_or_zero).unwrap_or(0.0)
}

/// Builds a pod summary from the pod spec: requests and limits summed
/// over all containers, actual usage left for the metrics join.
pub(crate) fn pod_summary(pod: &Pod) -> PodSummary {
    let mut summary = PodSummary {
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        name: pod.metadata.name.clone().unwrap_or_default(),
        node_name: pod
            .spec
            .as_ref()
            .and_then(|s| s.node_name.clone())
            .unwrap_or_default(),
        cpu_request: 0,
        cpu_limit: 0,
        mem_request: 0.0,
        mem_limit: 0.0,
        cpu_actual: 0,
        mem_actual: 0.0,
        metrics_available: false,
    };

    if let Some(spec) = &pod.spec {
        for container in &spec.containers {
            let Some(resources) = &container.resources else {
                continue;
            };
            if let Some(requests) = &resources.requests {
                if let Some(q) = requests.get("cpu") {
                    summary.cpu_request += cpu_or_zero(q);
                }
                if let Some(q) = requests.get("memory") {
                    summary.mem_request += mem_or_zero(q);
                }
            }
            if let Some(limits) = &resources.limits {
                if let Some(q) = limits.get("cpu") {
                    summary.cpu_limit += cpu_or_zero(q);
                }
                if let Some(q) = limits.get("memory") {
                    summary.mem_limit += mem_or_zero(q);
                }
            }
        }
    }

    summary
}

pub(crate) fn pod_usage_index(items: Vec<PodUsage>) -> HashMap<String, PodUsage> {
    items
        .into_iter()
        .map(|u| {
            let key = format!(
                "{}/{}",
                u.metadata.namespace.as_deref().unwrap_or_default(),
                u.metadata.name.as_deref().unwrap_or_default()
            );
            (key, u)
        })
        .collect()
}

pub(crate) fn apply_pod_usage(summary: &mut PodSummary, usage: &PodUsage) {
    summary.metrics_available = true;
    for container in &usage.containers {
        summary.cpu_actual += usage_cpu(&container.usage);
        summary.mem_actual += usage_mem(&container.usage);
    }
}

/// Fetches nodes, pods, node metrics, and (when a pod breakdown was
/// requested) pod metrics concurrently, then folds running pods into
/// per-node totals. Node totals always include every running pod,
/// system namespaces too.
pub async fn fetch_nodes(api: &dyn ClusterApi, with_pod_metrics: bool) -> Result<NodeReport> {
    let (nodes, pods, node_usage, pod_usage) = tokio::try_join!(
        async { api.list_nodes().await.context("failed to list nodes") },
        async { api.list_pods(None).await.context("failed to list pods") },
        async {
            Ok::<_, anyhow::Error>(match api.list_node_metrics().await {
                Ok(items) => Some(items),
                Err(err) => {
                    warn!(error = %err, "failed to get node metrics (metrics-server may not be installed)");
                    None
                }
            })
        },
        async {
            if !with_pod_metrics {
                return Ok::<_, anyhow::Error>(None);
            }
            Ok(match api.list_pod_metrics(None).await {
                Ok(items) => Some(items),
                Err(err) => {
                    warn!(error = %err, "failed to get pod metrics");
                    None
                }
            })
        },
    )?;

    let node_metrics_available = node_usage.is_some();
    let pod_metrics_available = pod_usage.is_some();

    let node_usage_by_name: HashMap<String, NodeUsage> = node_usage
        .unwrap_or_default()
        .into_iter()
        .filter_map(|u| u.metadata.name.clone().map(|n| (n, u)))
        .collect();
    let pod_usage_by_key = pod_usage_index(pod_usage.unwrap_or_default());

    let mut pods_by_node: HashMap<&str, Vec<&Pod>> = HashMap::new();
    for pod in pods.iter().filter(|p| is_running(p)) {
        if let Some(node_name) = pod.spec.as_ref().and_then(|s| s.node_name.as_deref()) {
            if !node_name.is_empty() {
                pods_by_node.entry(node_name).or_default().push(pod);
            }
        }
    }

    let mut summaries = Vec::with_capacity(nodes.len());
    for node in &nodes {
        let name = node.metadata.name.clone().unwrap_or_default();
        let allocatable = node.status.as_ref().and_then(|s| s.allocatable.as_ref());
        let mut summary = NodeSummary {
            name: name.clone(),
            allocatable_cpu: allocatable.and_then(|a| a.get("cpu")).map(cpu_or_zero).unwrap_or(0),
            allocatable_mem: allocatable
                .and_then(|a| a.get("memory"))
                .map(mem_or_zero)
                .unwrap_or(0.0),
            actual_cpu: 0,
            actual_mem: 0.0,
            metrics_available: false,
            requested_cpu: 0,
            requested_mem: 0.0,
            pods: Vec::new(),
        };

        if let Some(usage) = node_usage_by_name.get(name.as_str()) {
            summary.actual_cpu = usage_cpu(&usage.usage);
            summary.actual_mem = usage_mem(&usage.usage);
            summary.metrics_available = true;
        }

        for pod in pods_by_node.get(name.as_str()).into_iter().flatten() {
            let mut pod_summary = pod_summary(pod);
            if with_pod_metrics {
                let key = format!("{}/{}", pod_summary.namespace, pod_summary.name);
                if let Some(usage) = pod_usage_by_key.get(&key) {
                    apply_pod_usage(&mut pod_summary, usage);
                }
            }
            summary.requested_cpu += pod_summary.cpu_request;
            summary.requested_mem += pod_summary.mem_request;
            summary.pods.push(pod_summary);
        }

        summaries.push(summary);
    }

    Ok(NodeReport {
        nodes: summaries,
        node_metrics_available,
        pod_metrics_available: with_pod_metrics && pod_metrics_available,
    })
}

/// Fetches running pods and their metrics concurrently. `namespace`
/// scopes both listings; `None` queries cluster-wide.
pub async fn fetch_pods(api: &dyn ClusterApi, namespace: Option<&str>) -> Result<PodReport> {
    let (pods, pod_usage) = tokio::try_join!(
        async { api.list_pods(namespace).await.context("failed to list pods") },
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
    let pod_usage_by_key = pod_usage_index(pod_usage.unwrap_or_default());

    let mut summaries = Vec::new();
    for pod in pods.iter().filter(|p| is_running(p)) {
        let mut summary = pod_summary(pod);
        let key = format!("{}/{}", summary.namespace, summary.name);
        if let Some(usage) = pod_usage_by_key.get(&key) {
            apply_pod_usage(&mut summary, usage);
        }
        summaries.push(summary);
    }

    Ok(PodReport {
        pods: summaries,
        metrics_available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{factor_severity, pct, Severity, Verdict};
    use crate::testutil::*;

    fn two_pod_cluster() -> MockApi {
        MockApi {
            nodes: vec![node("node-a", "4", "8Gi")],
            pods: vec![
                pod("default", "web", "node-a", "1", "1Gi"),
                pod("default", "worker", "node-a", "2", "2Gi"),
            ],
            node_usage: Some(vec![node_usage("node-a", "300m", "1Gi")]),
            pod_usage: Some(vec![
                pod_usage("default", "web", "150m", "256Mi"),
                pod_usage("default", "worker", "150m", "256Mi"),
            ]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn node_report_aggregates_requests_and_usage() {
        let api = two_pod_cluster();
        let report = fetch_nodes(&api, true).await.unwrap();

        assert!(report.node_metrics_available);
        assert!(report.pod_metrics_available);
        assert_eq!(report.nodes.len(), 1);

        let node = &report.nodes[0];
        assert_eq!(node.allocatable_cpu, 4000);
        assert_eq!(node.requested_cpu, 3000);
        assert_eq!(node.actual_cpu, 300);
        assert!(node.metrics_available);
        assert_eq!(node.pods.len(), 2);

        // Requested 75% vs actual 7.5% of allocatable: diff 67.5 > 50.
        let verdict = Verdict::classify(
            pct(node.requested_cpu, node.allocatable_cpu),
            pct(node.actual_cpu, node.allocatable_cpu),
        );
        assert_eq!(verdict, Verdict::MassivelyOverRequested);

        // Per-pod factor comes from per-pod metrics, not node totals.
        let web = node.pods.iter().find(|p| p.name == "web").unwrap();
        assert_eq!(web.cpu_actual, 150);
        assert_eq!(factor_severity(web.cpu_request, web.cpu_actual), Some(Severity::Medium));
    }

    #[tokio::test]
    async fn node_totals_include_system_pods() {
        let mut api = two_pod_cluster();
        api.pods.push(pod("kube-system", "coredns", "node-a", "500m", "128Mi"));

        let report = fetch_nodes(&api, false).await.unwrap();
        assert_eq!(report.nodes[0].requested_cpu, 3500);
    }

    #[tokio::test]
    async fn non_running_pods_are_excluded() {
        let mut api = two_pod_cluster();
        api.pods
            .push(pod_with_phase("default", "done", "node-a", "4", "4Gi", "Succeeded"));
        api.pods
            .push(pod_with_phase("default", "stuck", "node-a", "4", "4Gi", "Pending"));

        let report = fetch_nodes(&api, false).await.unwrap();
        assert_eq!(report.nodes[0].requested_cpu, 3000);
        assert_eq!(report.nodes[0].pods.len(), 2);

        let pods = fetch_pods(&api, None).await.unwrap();
        assert_eq!(pods.pods.len(), 2);
    }

    #[tokio::test]
    async fn missing_metrics_degrade_to_requests_only() {
        let mut api = two_pod_cluster();
        api.node_usage = None;
        api.pod_usage = None;

        let report = fetch_nodes(&api, true).await.unwrap();
        assert!(!report.node_metrics_available);
        assert!(!report.pod_metrics_available);

        let node = &report.nodes[0];
        assert!(!node.metrics_available);
        assert_eq!(node.actual_cpu, 0);
        assert_eq!(node.requested_cpu, 3000);
        assert!(node.pods.iter().all(|p| !p.metrics_available));
    }

    #[tokio::test]
    async fn fatal_listing_failure_aborts_the_fetch() {
        let mut api = two_pod_cluster();
        api.fail_nodes = true;

        let err = fetch_nodes(&api, false).await.unwrap_err();
        assert!(err.to_string().contains("failed to list nodes"));
    }

    #[tokio::test]
    async fn pod_report_joins_metrics_by_namespace_and_name() {
        let api = two_pod_cluster();
        let report = fetch_pods(&api, None).await.unwrap();

        assert!(report.metrics_available);
        let worker = report.pods.iter().find(|p| p.name == "worker").unwrap();
        assert_eq!(worker.cpu_request, 2000);
        assert_eq!(worker.cpu_actual, 150);
        assert!(worker.metrics_available);
    }

    #[tokio::test]
    async fn pod_report_honors_namespace_scope() {
        let mut api = two_pod_cluster();
        api.pods.push(pod("other", "sidecar", "node-a", "250m", "64Mi"));

        let report = fetch_pods(&api, Some("other")).await.unwrap();
        assert_eq!(report.pods.len(), 1);
        assert_eq!(report.pods[0].name, "sidecar");
    }

    #[tokio::test]
    async fn fetch_is_idempotent_over_a_snapshot() {
        let api = two_pod_cluster();
        let first = fetch_nodes(&api, true).await.unwrap();
        let second = fetch_nodes(&api, true).await.unwrap();
        assert_eq!(first, second);
    }
}
