//! Cluster connection setup from kubeconfig

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};

/// A connected cluster client plus the resolved context name used in
/// report titles and markdown file paths.
pub struct ClusterContext {
    pub client: kube::Client,
    pub context_name: String,
}

/// Builds a Kubernetes client from the given kubeconfig path and optional
/// context override. Without a path, the default kubeconfig chain
/// (KUBECONFIG env var, then ~/.kube/config) applies.
pub async fn connect(kubeconfig: Option<&str>, context: Option<&str>) -> Result<ClusterContext> {
    let config = match kubeconfig {
        Some(path) => Kubeconfig::read_from(path)
            .with_context(|| format!("failed to read kubeconfig from {}", path))?,
        None => Kubeconfig::read().context("failed to read kubeconfig")?,
    };

    let context_name = context
        .map(str::to_string)
        .or_else(|| config.current_context.clone())
        .unwrap_or_else(|| "default".to_string());

    let options = KubeConfigOptions {
        context: context.map(str::to_string),
        ..Default::default()
    };
    let client_config = kube::Config::from_custom_kubeconfig(config, &options)
        .await
        .context("failed to build client config")?;
    let client = kube::Client::try_from(client_config).context("failed to create Kubernetes client")?;

    Ok(ClusterContext {
        client,
        context_name,
    })
}
