//! Cluster API boundary
//!
//! The fetchers consume the [`ClusterApi`] trait, so the reconciliation
//! logic can be tested against an in-memory cluster. [`KubeApi`] is the
//! production implementation over a `kube::Client`.
//!
//! Metrics-server types (`metrics.k8s.io/v1beta1`) are not modeled by
//! `k8s-openapi`, so node and pod usage are fetched as raw GETs and
//! deserialized into the wire structs below.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, ListParams};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Point-in-time usage of a single node, from the metrics API.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeUsage {
    pub metadata: ObjectMeta,
    pub usage: BTreeMap<String, Quantity>,
}

/// Point-in-time usage of a single pod, per container.
#[derive(Debug, Clone, Deserialize)]
pub struct PodUsage {
    pub metadata: ObjectMeta,
    pub containers: Vec<ContainerUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerUsage {
    pub name: String,
    pub usage: BTreeMap<String, Quantity>,
}

#[derive(Debug, Deserialize)]
struct UsageList<T> {
    items: Vec<T>,
}

/// The listings a report fetch is built from.
///
/// Node, pod, and replica-set listings are fatal-class: a failure aborts
/// the fetch. Metrics listings are non-fatal: callers catch the error and
/// degrade to a requests-only report.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<Node>>;
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>>;
    async fn list_replica_sets(&self) -> Result<Vec<ReplicaSet>>;
    async fn list_node_metrics(&self) -> Result<Vec<NodeUsage>>;
    async fn list_pod_metrics(&self, namespace: Option<&str>) -> Result<Vec<PodUsage>>;
}

/// Production [`ClusterApi`] backed by a Kubernetes client.
#[derive(Clone)]
pub struct KubeApi {
    client: kube::Client,
}

impl KubeApi {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    async fn get_raw<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = http::Request::builder()
            .method(http::Method::GET)
            .uri(path)
            .body(Vec::new())?;
        Ok(self.client.request(request).await?)
    }
}

#[async_trait]
impl ClusterApi for KubeApi {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<Pod>> {
        let api: Api<Pod> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn list_replica_sets(&self) -> Result<Vec<ReplicaSet>> {
        let api: Api<ReplicaSet> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn list_node_metrics(&self) -> Result<Vec<NodeUsage>> {
        let list: UsageList<NodeUsage> = self
            .get_raw("/apis/metrics.k8s.io/v1beta1/nodes")
            .await?;
        Ok(list.items)
    }

    async fn list_pod_metrics(&self, namespace: Option<&str>) -> Result<Vec<PodUsage>> {
        let path = match namespace {
            Some(ns) => format!("/apis/metrics.k8s.io/v1beta1/namespaces/{}/pods", ns),
            None => "/apis/metrics.k8s.io/v1beta1/pods".to_string(),
        };
        let list: UsageList<PodUsage> = self.get_raw(&path).await?;
        Ok(list.items)
    }
}
