//! Top pods by CPU request, cross-referenced with actual usage

use anyhow::Result;
use kugap_lib::{fetch, policy, quantity, ClusterApi, PodSummary, ReportConfig};
use tabled::Tabled;

use crate::markdown;
use crate::output::{self, OutputFormat};

#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "CPU Req")]
    cpu_request: String,
    #[tabled(rename = "CPU Actual")]
    cpu_actual: String,
    #[tabled(rename = "Over-req")]
    over_request: String,
    #[tabled(rename = "Mem Req")]
    mem_request: String,
    #[tabled(rename = "Mem Actual")]
    mem_actual: String,
}

pub async fn run(
    api: &dyn ClusterApi,
    context_name: &str,
    config: &ReportConfig,
    format: OutputFormat,
) -> Result<()> {
    let report = fetch::fetch_pods(api, config.namespace.as_deref()).await?;
    let metrics_available = report.metrics_available;
    let pods = policy::top_pods(report.pods, metrics_available, config);

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&pods)?);
        return Ok(());
    }

    if pods.is_empty() {
        output::print_warning("No pods matched the filters");
        return Ok(());
    }

    let ts = chrono::Local::now();

    println!();
    output::render_table(
        &format!("Top Pods — {}", context_name),
        &pod_rows(&pods, metrics_available, true),
    );
    println!("\nTotal: {} pods", pods.len());
    markdown::save(
        "pods",
        context_name,
        ts,
        &output::markdown_table(&pod_rows(&pods, metrics_available, false)),
    );

    Ok(())
}

fn pod_rows(pods: &[PodSummary], metrics_available: bool, styled: bool) -> Vec<PodRow> {
    pods.iter()
        .enumerate()
        .map(|(i, pod)| {
            let (cpu_actual, mem_actual) = if metrics_available && pod.metrics_available {
                (
                    quantity::format_cpu(pod.cpu_actual),
                    quantity::format_mem(pod.mem_actual),
                )
            } else {
                (output::na_cell(styled), output::na_cell(styled))
            };

            PodRow {
                rank: (i + 1).to_string(),
                namespace: pod.namespace.clone(),
                pod: pod.name.clone(),
                node: pod.node_name.clone(),
                cpu_request: quantity::format_cpu(pod.cpu_request),
                cpu_actual,
                over_request: if styled {
                    output::factor_cell(pod.cpu_request, pod.cpu_actual)
                } else {
                    quantity::format_factor(pod.cpu_request, pod.cpu_actual)
                },
                mem_request: quantity::format_mem(pod.mem_request),
                mem_actual,
            }
        })
        .collect()
}
