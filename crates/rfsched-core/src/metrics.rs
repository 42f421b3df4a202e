//! Binding outcome counters
//!
//! Counters live for the lifetime of the process and are never reset. The
//! registry is an explicit value shared through an `Arc`; whoever commits
//! bindings owns a handle and records into it.

use crate::types::{BindingLabels, BindingResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Attempted binding requests
pub const ATTEMPTED_METRIC: &str = "schedule_request_total";
/// Binding requests accepted by the API server
pub const SUCCEEDED_METRIC: &str = "schedule_request_success";
/// Binding requests that failed
pub const FAILED_METRIC: &str = "schedule_request_failure";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct FailureLabels {
    binding: BindingLabels,
    http_status: u16,
    reason: String,
}

#[derive(Debug, Default)]
struct Counters {
    attempted: BTreeMap<BindingLabels, u64>,
    succeeded: BTreeMap<BindingLabels, u64>,
    failed: BTreeMap<FailureLabels, u64>,
}

/// Process-wide registry of binding counters
#[derive(Debug, Default)]
pub struct BindingMetrics {
    counters: Mutex<Counters>,
}

impl BindingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a binding request at the moment it is issued
    pub fn record_attempt(&self, labels: &BindingLabels) {
        let mut counters = self.counters.lock();
        *counters.attempted.entry(labels.clone()).or_insert(0) += 1;
    }

    /// Count the resolution of a binding request
    pub fn record_outcome(&self, labels: &BindingLabels, result: &BindingResult) {
        let mut counters = self.counters.lock();
        if result.success {
            *counters.succeeded.entry(labels.clone()).or_insert(0) += 1;
        } else {
            let key = FailureLabels {
                binding: labels.clone(),
                http_status: result.http_status,
                reason: result.reason.clone(),
            };
            *counters.failed.entry(key).or_insert(0) += 1;
        }
    }

    pub fn attempted(&self, labels: &BindingLabels) -> u64 {
        self.counters
            .lock()
            .attempted
            .get(labels)
            .copied()
            .unwrap_or(0)
    }

    pub fn succeeded(&self, labels: &BindingLabels) -> u64 {
        self.counters
            .lock()
            .succeeded
            .get(labels)
            .copied()
            .unwrap_or(0)
    }

    /// Failures for the given labels, summed over every status and reason
    pub fn failed(&self, labels: &BindingLabels) -> u64 {
        self.counters
            .lock()
            .failed
            .iter()
            .filter(|(k, _)| &k.binding == labels)
            .map(|(_, v)| *v)
            .sum()
    }

    /// Failures for the given labels with a specific status and reason
    pub fn failed_with(&self, labels: &BindingLabels, http_status: u16, reason: &str) -> u64 {
        let key = FailureLabels {
            binding: labels.clone(),
            http_status,
            reason: reason.to_string(),
        };
        self.counters.lock().failed.get(&key).copied().unwrap_or(0)
    }

    /// Sum of every counter family, mostly useful to assert nothing moved
    pub fn total_recorded(&self) -> u64 {
        let counters = self.counters.lock();
        counters.attempted.values().sum::<u64>()
            + counters.succeeded.values().sum::<u64>()
            + counters.failed.values().sum::<u64>()
    }

    /// Render all counters in the Prometheus text exposition format
    pub fn render_prometheus(&self) -> String {
        let counters = self.counters.lock();
        let mut out = String::new();

        out.push_str(&format!("# HELP {} Total binding requests\n", ATTEMPTED_METRIC));
        out.push_str(&format!("# TYPE {} counter\n", ATTEMPTED_METRIC));
        for (labels, value) in &counters.attempted {
            let _ = writeln!(
                out,
                "{}{{{}}} {}",
                ATTEMPTED_METRIC,
                binding_label_pairs(labels),
                value
            );
        }

        out.push_str(&format!(
            "# HELP {} Binding successful requests\n",
            SUCCEEDED_METRIC
        ));
        out.push_str(&format!("# TYPE {} counter\n", SUCCEEDED_METRIC));
        for (labels, value) in &counters.succeeded {
            let _ = writeln!(
                out,
                "{}{{{}}} {}",
                SUCCEEDED_METRIC,
                binding_label_pairs(labels),
                value
            );
        }

        out.push_str(&format!("# HELP {} Binding failed requests\n", FAILED_METRIC));
        out.push_str(&format!("# TYPE {} counter\n", FAILED_METRIC));
        for (labels, value) in &counters.failed {
            let _ = writeln!(
                out,
                "{}{{{},http_status=\"{}\",reason=\"{}\"}} {}",
                FAILED_METRIC,
                binding_label_pairs(&labels.binding),
                labels.http_status,
                escape_label_value(&labels.reason),
                value
            );
        }

        out
    }
}

fn binding_label_pairs(labels: &BindingLabels) -> String {
    format!(
        "pod=\"{}\",node=\"{}\",scheduler=\"{}\",namespace=\"{}\"",
        escape_label_value(&labels.pod),
        escape_label_value(&labels.node),
        escape_label_value(&labels.scheduler),
        escape_label_value(&labels.namespace)
    )
}

/// Escape a label value per the text exposition format
fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}
