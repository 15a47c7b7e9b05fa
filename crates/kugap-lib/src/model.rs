//! Report data model
//!
//! All types here are derived, read-only snapshots built fresh from a
//! single point-in-time fetch. Actual-usage fields are only meaningful
//! when the accompanying availability flag is set; a false flag means
//! "unknown", never "zero".

use std::fmt;

use serde::Serialize;

/// Per-node resource summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub name: String,
    /// Allocatable capacity in millicores.
    pub allocatable_cpu: i64,
    /// Allocatable capacity in MiB.
    pub allocatable_mem: f64,
    /// Live usage from the metrics API, valid only when `metrics_available`.
    pub actual_cpu: i64,
    pub actual_mem: f64,
    pub metrics_available: bool,
    /// Summed requests of every running pod scheduled here, regardless of
    /// any namespace filtering applied at presentation time.
    pub requested_cpu: i64,
    pub requested_mem: f64,
    /// Per-pod breakdown, populated when the report asked for one.
    pub pods: Vec<PodSummary>,
}

/// Per-pod resource summary, requests and limits summed over containers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PodSummary {
    pub namespace: String,
    pub name: String,
    pub node_name: String,
    pub cpu_request: i64,
    /// 0 = no limit set (indistinguishable from an explicit zero limit).
    pub cpu_limit: i64,
    pub mem_request: f64,
    pub mem_limit: f64,
    pub cpu_actual: i64,
    pub mem_actual: f64,
    pub metrics_available: bool,
}

/// Workload controller kinds a pod can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    Job,
    ReplicaSet,
    Pod,
}

impl WorkloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::StatefulSet => "StatefulSet",
            WorkloadKind::DaemonSet => "DaemonSet",
            WorkloadKind::Job => "Job",
            WorkloadKind::ReplicaSet => "ReplicaSet",
            WorkloadKind::Pod => "Pod",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a workload grouping: the resolved top-level controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorkloadKey {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
}

/// Aggregated resource data for a single workload controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadSummary {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
    pub pod_count: usize,
    pub cpu_request: i64,
    pub cpu_actual: i64,
    pub mem_request: f64,
    pub mem_actual: f64,
    pub metrics_available: bool,
}

/// Result of a node report fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    pub nodes: Vec<NodeSummary>,
    pub node_metrics_available: bool,
    pub pod_metrics_available: bool,
}

/// Result of a pod report fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PodReport {
    pub pods: Vec<PodSummary>,
    pub metrics_available: bool,
}

/// Result of a workload report fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadReport {
    pub workloads: Vec<WorkloadSummary>,
    pub metrics_available: bool,
}
