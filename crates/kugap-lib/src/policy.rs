//! Filter and sort policies for presentation
//!
//! Threshold-based inclusion filtering and the total orderings applied
//! before a report is handed to the rendering layer.

use crate::config::ReportConfig;
use crate::model::{PodSummary, WorkloadSummary};

/// Threshold filter over the CPU over-request factor.
///
/// `threshold == 0` disables the filter. With an active filter, entities
/// with no request or without metrics never pass. A positive threshold
/// passes entities whose factor (integer division) reaches it, and always
/// passes `actual == 0` — requesting while consuming nothing is the worst
/// case. A negative threshold selects bursting entities (actual > req)
/// regardless of its magnitude.
pub fn meets_factor_filter(req: i64, actual: i64, metrics_available: bool, threshold: i32) -> bool {
    if threshold == 0 {
        return true;
    }
    if req == 0 || !metrics_available {
        return false;
    }
    if threshold > 0 {
        actual == 0 || req / actual >= threshold as i64
    } else {
        actual > req
    }
}

/// Sort key ranking entities worst-first by over-request severity.
///
/// No request sorts lowest, unavailable metrics just above that, a
/// request with zero actual usage at the absolute top (unbounded
/// severity), everything else by factor. Sentinel values conflate three
/// incomparable states into one scale; kept as observed behavior.
pub fn severity_rank(req: i64, actual: i64, metrics_available: bool) -> i64 {
    if req == 0 {
        return i64::MIN;
    }
    if !metrics_available {
        return i64::MIN + 1;
    }
    if actual == 0 {
        return i64::MAX;
    }
    req / actual
}

/// Orders workloads worst-first by CPU severity rank and truncates to
/// `limit` (0 = unlimited). Ties break on namespace/name so output is
/// stable across invocations.
pub fn rank_workloads(mut workloads: Vec<WorkloadSummary>, limit: usize) -> Vec<WorkloadSummary> {
    workloads.sort_by(|a, b| {
        let ra = severity_rank(a.cpu_request, a.cpu_actual, a.metrics_available);
        let rb = severity_rank(b.cpu_request, b.cpu_actual, b.metrics_available);
        rb.cmp(&ra)
            .then_with(|| a.namespace.cmp(&b.namespace))
            .then_with(|| a.name.cmp(&b.name))
    });
    if limit > 0 && workloads.len() > limit {
        workloads.truncate(limit);
    }
    workloads
}

/// Applies the namespace deny-list and factor filter, then returns the
/// top pods by raw CPU request descending, truncated to the configured
/// limit.
pub fn top_pods(
    mut pods: Vec<PodSummary>,
    metrics_available: bool,
    config: &ReportConfig,
) -> Vec<PodSummary> {
    pods.retain(|p| !config.hides_namespace(&p.namespace));
    pods.retain(|p| {
        meets_factor_filter(
            p.cpu_request,
            p.cpu_actual,
            metrics_available && p.metrics_available,
            config.min_factor,
        )
    });
    pods.sort_by(|a, b| {
        b.cpu_request
            .cmp(&a.cpu_request)
            .then_with(|| a.namespace.cmp(&b.namespace))
            .then_with(|| a.name.cmp(&b.name))
    });
    if config.limit > 0 && pods.len() > config.limit {
        pods.truncate(config.limit);
    }
    pods
}
