//! kugap — Kubernetes usage gap analyzer
//!
//! Surfaces the gap between actual resource usage and requested/allocated
//! resources in a cluster. This gap is the root cause of "no resources
//! available" errors on under-utilized clusters: pods reserve far more
//! than they need, blocking scheduling for others.

mod client;
mod commands;
mod markdown;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kugap_lib::{KubeApi, ReportConfig};
use tracing_subscriber::EnvFilter;

/// Kubernetes usage gap analyzer
#[derive(Parser)]
#[command(name = "kugap")]
#[command(author, version, about = "Compare requested vs actual resource usage in a Kubernetes cluster", long_about = None)]
struct Cli {
    /// Path to kubeconfig file (default: ~/.kube/config)
    #[arg(long, env = "KUBECONFIG", global = true)]
    kubeconfig: Option<String>,

    /// Kubernetes context to use (default: current context)
    #[arg(long, global = true)]
    context: Option<String>,

    /// Disable ANSI colors in console output
    #[arg(long, global = true)]
    no_color: bool,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    format: output::OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare actual vs requested resources per node
    Nodes {
        /// Also output a per-node pod breakdown
        #[arg(long)]
        pod_overview: bool,

        /// Include system namespaces (kube-system etc.) in the pod overview
        #[arg(long)]
        include_system: bool,
    },

    /// List top pods by CPU request with actual usage
    Pods {
        /// Number of top pods to show (0 = all)
        #[arg(long, short = 'n', default_value_t = 25)]
        limit: usize,

        /// Include system namespaces (kube-system etc.)
        #[arg(long)]
        include_system: bool,

        /// Filter by namespace (default: all namespaces)
        #[arg(long)]
        namespace: Option<String>,

        /// Only show pods where CPU req/actual >= N; negative N shows
        /// bursting pods (actual > req); 0 disables the filter
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        min_factor: i32,
    },

    /// List workloads ranked by CPU over-request factor
    Workloads {
        /// Number of top workloads to show (0 = all)
        #[arg(long, short = 'n', default_value_t = 25)]
        limit: usize,

        /// Include system namespaces (kube-system etc.)
        #[arg(long)]
        include_system: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "kugap=debug,kugap_lib=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let cluster = client::connect(cli.kubeconfig.as_deref(), cli.context.as_deref())
        .await
        .context("failed to connect to cluster")?;
    let api = KubeApi::new(cluster.client);

    match cli.command {
        Commands::Nodes {
            pod_overview,
            include_system,
        } => {
            let config = ReportConfig {
                include_system,
                ..Default::default()
            };
            commands::nodes::run(&api, &cluster.context_name, &config, pod_overview, cli.format).await?;
        }
        Commands::Pods {
            limit,
            include_system,
            namespace,
            min_factor,
        } => {
            // A namespace scope means the caller asked for those pods
            // explicitly, system namespace or not.
            let config = ReportConfig {
                include_system: include_system || namespace.is_some(),
                namespace,
                limit,
                min_factor,
                ..Default::default()
            };
            commands::pods::run(&api, &cluster.context_name, &config, cli.format).await?;
        }
        Commands::Workloads {
            limit,
            include_system,
        } => {
            let config = ReportConfig {
                include_system,
                limit,
                ..Default::default()
            };
            commands::workloads::run(&api, &cluster.context_name, &config, cli.format).await?;
        }
    }

    Ok(())
}
