//! Per-node comparison of actual vs requested resources

use anyhow::Result;
use kugap_lib::analysis::{pct, pct_f, Verdict};
use kugap_lib::{fetch, quantity, ClusterApi, NodeReport, NodeSummary, PodSummary, ReportConfig};
use tabled::Tabled;

use crate::markdown;
use crate::output::{self, OutputFormat};

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "CPU Actual")]
    cpu_actual: String,
    #[tabled(rename = "CPU Requested")]
    cpu_requested: String,
    #[tabled(rename = "CPU Verdict")]
    cpu_verdict: String,
    #[tabled(rename = "Mem Actual")]
    mem_actual: String,
    #[tabled(rename = "Mem Requested")]
    mem_requested: String,
    #[tabled(rename = "Mem Verdict")]
    mem_verdict: String,
}

#[derive(Tabled)]
struct PodOverviewRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "CPU Req")]
    cpu_request: String,
    #[tabled(rename = "CPU Limit")]
    cpu_limit: String,
    #[tabled(rename = "CPU Actual")]
    cpu_actual: String,
    #[tabled(rename = "Over-req")]
    over_request: String,
    #[tabled(rename = "Mem Req")]
    mem_request: String,
    #[tabled(rename = "Mem Limit")]
    mem_limit: String,
    #[tabled(rename = "Mem Actual")]
    mem_actual: String,
}

pub async fn run(
    api: &dyn ClusterApi,
    context_name: &str,
    config: &ReportConfig,
    pod_overview: bool,
    format: OutputFormat,
) -> Result<()> {
    let report = fetch::fetch_nodes(api, pod_overview).await?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let ts = chrono::Local::now();

    println!();
    output::render_table(&format!("Nodes — {}", context_name), &node_rows(&report, true));
    markdown::save("nodes", context_name, ts, &output::markdown_table(&node_rows(&report, false)));

    if pod_overview {
        let mut all_markdown = String::new();
        for node in &report.nodes {
            let pods = overview_pods(node, config);
            if pods.is_empty() {
                continue;
            }

            println!();
            output::render_table(
                &format!("Pod Overview: {} — {}", node.name, context_name),
                &pod_rows(&pods, report.pod_metrics_available, true),
            );
            let table = output::markdown_table(&pod_rows(&pods, report.pod_metrics_available, false));
            all_markdown.push_str(&format!("## {}\n\n{}\n\n", node.name, table));
        }
        // Nothing visible on any node means nothing to persist.
        if !all_markdown.is_empty() {
            markdown::save("nodes_pod_overview", context_name, ts, &all_markdown);
        }
    }

    Ok(())
}

/// Pods shown in a node's overview: deny-listed namespaces dropped, the
/// rest ordered by CPU request descending.
fn overview_pods<'a>(node: &'a NodeSummary, config: &ReportConfig) -> Vec<&'a PodSummary> {
    let mut pods: Vec<&PodSummary> = node
        .pods
        .iter()
        .filter(|p| !config.hides_namespace(&p.namespace))
        .collect();
    pods.sort_by(|a, b| b.cpu_request.cmp(&a.cpu_request));
    pods
}

fn node_rows(report: &NodeReport, styled: bool) -> Vec<NodeRow> {
    report
        .nodes
        .iter()
        .map(|node| {
            let cpu_req_pct = pct(node.requested_cpu, node.allocatable_cpu);
            let mem_req_pct = pct_f(node.requested_mem, node.allocatable_mem);
            let cpu_requested =
                format!("{:.0}% ({})", cpu_req_pct, quantity::format_cpu(node.requested_cpu));
            let mem_requested =
                format!("{:.0}% ({})", mem_req_pct, quantity::format_mem(node.requested_mem));

            if report.node_metrics_available && node.metrics_available {
                let cpu_actual_pct = pct(node.actual_cpu, node.allocatable_cpu);
                let mem_actual_pct = pct_f(node.actual_mem, node.allocatable_mem);
                let cpu_verdict = Verdict::classify(cpu_req_pct, cpu_actual_pct);
                let mem_verdict = Verdict::classify(mem_req_pct, mem_actual_pct);
                NodeRow {
                    node: node.name.clone(),
                    cpu_actual: format!(
                        "{:.0}% ({})",
                        cpu_actual_pct,
                        quantity::format_cpu(node.actual_cpu)
                    ),
                    cpu_requested,
                    cpu_verdict: verdict_text(cpu_verdict, styled),
                    mem_actual: format!(
                        "{:.0}% ({})",
                        mem_actual_pct,
                        quantity::format_mem(node.actual_mem)
                    ),
                    mem_requested,
                    mem_verdict: verdict_text(mem_verdict, styled),
                }
            } else {
                NodeRow {
                    node: node.name.clone(),
                    cpu_actual: output::na_cell(styled),
                    cpu_requested,
                    cpu_verdict: output::na_cell(styled),
                    mem_actual: output::na_cell(styled),
                    mem_requested,
                    mem_verdict: output::na_cell(styled),
                }
            }
        })
        .collect()
}

fn verdict_text(verdict: Verdict, styled: bool) -> String {
    if styled {
        output::verdict_cell(verdict)
    } else {
        verdict.label().to_string()
    }
}

fn pod_rows(pods: &[&PodSummary], metrics_available: bool, styled: bool) -> Vec<PodOverviewRow> {
    pods.iter()
        .map(|pod| {
            let (cpu_actual, mem_actual) = if metrics_available && pod.metrics_available {
                (
                    quantity::format_cpu(pod.cpu_actual),
                    quantity::format_mem(pod.mem_actual),
                )
            } else {
                (output::na_cell(styled), output::na_cell(styled))
            };

            PodOverviewRow {
                namespace: pod.namespace.clone(),
                pod: pod.name.clone(),
                cpu_request: quantity::format_cpu(pod.cpu_request),
                cpu_limit: limit_text(pod.cpu_limit == 0, quantity::format_cpu(pod.cpu_limit)),
                cpu_actual,
                over_request: if styled {
                    output::factor_cell(pod.cpu_request, pod.cpu_actual)
                } else {
                    quantity::format_factor(pod.cpu_request, pod.cpu_actual)
                },
                mem_request: quantity::format_mem(pod.mem_request),
                mem_limit: limit_text(pod.mem_limit == 0.0, quantity::format_mem(pod.mem_limit)),
                mem_actual,
            }
        })
        .collect()
}

fn limit_text(unset: bool, formatted: String) -> String {
    if unset {
        "unset".to_string()
    } else {
        formatted
    }
}
