//! Core library for the kugap usage gap analyzer
//!
//! This crate provides the logic behind the `kugap` CLI:
//! - Quantity normalization (millicores / mebibytes) and display formatting
//! - Concurrent cluster snapshot acquisition with partial-failure tolerance
//! - Pod-to-workload ownership resolution
//! - Node / pod / workload aggregation
//! - Verdict and severity classification
//! - Filter and sort policies for presentation

pub mod analysis;
pub mod api;
pub mod config;
pub mod fetch;
pub mod model;
pub mod policy;
pub mod quantity;
pub mod workload;

#[cfg(test)]
pub(crate) mod testutil;

pub use api::{ClusterApi, KubeApi, NodeUsage, PodUsage};
pub use config::ReportConfig;
pub use model::{
    NodeReport, NodeSummary, PodReport, PodSummary, WorkloadKey, WorkloadKind, WorkloadReport,
    WorkloadSummary,
};
