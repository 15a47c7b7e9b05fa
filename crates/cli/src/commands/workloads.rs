//! Workloads ranked by CPU over-request factor
//!
//! Groups running pods by their owning controller and aggregates
//! request vs actual usage per workload, worst offenders first.

use anyhow::Result;
use kugap_lib::{policy, quantity, workload, ClusterApi, ReportConfig, WorkloadSummary};
use tabled::Tabled;

use crate::markdown;
use crate::output::{self, OutputFormat};

#[derive(Tabled)]
struct WorkloadRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Pods")]
    pods: String,
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
    let report = workload::fetch_workloads(api, config).await?;
    let metrics_available = report.metrics_available;
    let workloads = policy::rank_workloads(report.workloads, config.limit);

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&workloads)?);
        return Ok(());
    }

    if workloads.is_empty() {
        output::print_warning("No workloads found");
        return Ok(());
    }

    let ts = chrono::Local::now();

    println!();
    output::render_table(
        &format!("Workloads — {}", context_name),
        &workload_rows(&workloads, metrics_available, true),
    );
    println!("\nTotal: {} workloads", workloads.len());
    markdown::save(
        "workloads",
        context_name,
        ts,
        &output::markdown_table(&workload_rows(&workloads, metrics_available, false)),
    );

    Ok(())
}

fn workload_rows(
    workloads: &[WorkloadSummary],
    metrics_available: bool,
    styled: bool,
) -> Vec<WorkloadRow> {
    workloads
        .iter()
        .map(|w| {
            let (cpu_actual, mem_actual) = if metrics_available && w.metrics_available {
                (
                    quantity::format_cpu(w.cpu_actual),
                    quantity::format_mem(w.mem_actual),
                )
            } else {
                (output::na_cell(styled), output::na_cell(styled))
            };

            WorkloadRow {
                kind: w.kind.to_string(),
                namespace: w.namespace.clone(),
                name: w.name.clone(),
                pods: w.pod_count.to_string(),
                cpu_request: quantity::format_cpu(w.cpu_request),
                cpu_actual,
                over_request: if styled {
                    output::factor_cell(w.cpu_request, w.cpu_actual)
                } else {
                    quantity::format_factor(w.cpu_request, w.cpu_actual)
                },
                mem_request: quantity::format_mem(w.mem_request),
                mem_actual,
            }
        })
        .collect()
}
