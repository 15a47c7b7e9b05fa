//! Per-invocation report configuration
//!
//! Every knob is an explicit value threaded through the fetch and policy
//! calls, so an invocation is reproducible from its inputs alone.

use std::collections::BTreeSet;

/// Configuration for a single report invocation.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Namespace scope for pod listings; `None` = all namespaces.
    pub namespace: Option<String>,
    /// When false, pods in `system_namespaces` are excluded from the
    /// pod-overview and workload views. Node totals are never filtered.
    pub include_system: bool,
    /// Namespaces conventionally hidden from user-facing reports.
    pub system_namespaces: BTreeSet<String>,
    /// Result-count limit for ranked listings; 0 = unlimited.
    pub limit: usize,
    /// Over-request factor threshold per the filter policy; 0 = disabled,
    /// negative = bursting entities only.
    pub min_factor: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            include_system: false,
            system_namespaces: ["kube-system", "kube-public", "kube-node-lease"]
                .into_iter()
                .map(String::from)
                .collect(),
            limit: 0,
            min_factor: 0,
        }
    }
}

impl ReportConfig {
    /// Whether a pod in `namespace` should be hidden from filterable views.
    pub fn hides_namespace(&self, namespace: &str) -> bool {
        !self.include_system && self.system_namespaces.contains(namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deny_list_covers_system_namespaces() {
        let config = ReportConfig::default();
        assert!(config.hides_namespace("kube-system"));
        assert!(config.hides_namespace("kube-node-lease"));
        assert!(!config.hides_namespace("default"));
    }

    #[test]
    fn include_system_disables_hiding() {
        let config = ReportConfig {
            include_system: true,
            ..Default::default()
        };
        assert!(!config.hides_namespace("kube-system"));
    }
}
