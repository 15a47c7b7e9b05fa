//! Verdict and severity classification
//!
//! Two pure, stateless classifiers over requested-vs-actual gaps. Neither
//! depends on absolute values, only on the percentages (verdict) or the
//! integer factor (severity) it is given.

use serde::Serialize;

/// Qualitative verdict for a resource dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    MassivelyOverRequested,
    OverRequested,
    Bursting,
    Ok,
}

impl Verdict {
    /// Classifies the gap between requested% and actual% of some capacity
    /// baseline. Boundaries are inclusive of the lower branch: a diff of
    /// exactly 50 is Over-requested, a diff of exactly 20 is OK.
    pub fn classify(requested_pct: f64, actual_pct: f64) -> Self {
        let diff = requested_pct - actual_pct;
        if diff > 50.0 {
            Verdict::MassivelyOverRequested
        } else if diff > 20.0 {
            Verdict::OverRequested
        } else if actual_pct > requested_pct {
            Verdict::Bursting
        } else {
            Verdict::Ok
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::MassivelyOverRequested => "Massively over-requested",
            Verdict::OverRequested => "Over-requested",
            Verdict::Bursting => "Bursting",
            Verdict::Ok => "OK",
        }
    }
}

/// Display severity tier for an over-request factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Severity tier for requested vs actual millicores, `None` when either
/// value is zero (no factor can be computed).
pub fn factor_severity(req: i64, actual: i64) -> Option<Severity> {
    if req == 0 || actual == 0 {
        return None;
    }
    let factor = req / actual;
    Some(if factor >= 50 {
        Severity::Critical
    } else if factor >= 10 {
        Severity::High
    } else if factor >= 3 {
        Severity::Medium
    } else {
        Severity::Low
    })
}

/// Percentage of `value` against `total`, 0 when `total` is 0.
pub fn pct(value: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    value as f64 * 100.0 / total as f64
}

/// Percentage for floating-point totals (memory MiB), 0 when `total` is 0.
pub fn pct_f(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    value * 100.0 / total
}
