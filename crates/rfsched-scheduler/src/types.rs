use crate::{Result, SchedulerError};
use rfsched_core::{LabelContract, LabelScheme};
use std::collections::BTreeSet;

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Label contract, carrying the scheduler name pods must request
    pub label_contract: LabelContract,
    /// Only pods in these namespaces are considered (None = all namespaces)
    pub namespaces: Option<BTreeSet<String>>,
    /// Number of pods placed concurrently within one pass
    pub concurrency: usize,
}

impl SchedulerConfig {
    /// Create a configuration that places pods one at a time in every namespace
    pub fn new(label_contract: LabelContract) -> Self {
        Self {
            label_contract,
            namespaces: None,
            concurrency: 1,
        }
    }

    /// Restrict placement to the given namespaces. An empty list means no restriction.
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = namespaces
            .into_iter()
            .map(Into::into)
            .filter(|ns| !ns.is_empty())
            .collect();
        self.namespaces = if set.is_empty() { None } else { Some(set) };
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn scheduler_name(&self) -> &str {
        self.label_contract.scheduler_name()
    }

    /// Whether pods in `namespace` may be placed by this instance
    pub fn namespace_allowed(&self, namespace: &str) -> bool {
        self.namespaces
            .as_ref()
            .is_none_or(|allowed| allowed.contains(namespace))
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(SchedulerError::invalid_config(
                "concurrency must be at least 1",
                "Use --concurrency 1 for sequential placement",
            ));
        }
        Ok(())
    }

    /// Pod-only label keys without a namespace allow-list match pods of the
    /// same name in every namespace
    pub fn has_ambiguous_labels(&self) -> bool {
        self.label_contract.scheme() == LabelScheme::PodOnly && self.namespaces.is_none()
    }
}

/// What happened to one eligible pod during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodOutcome {
    /// No node carries the pod's affinity label
    NoMatchingNode,
    /// Binding accepted
    Bound { node: String },
    /// Binding rejected or never delivered
    BindFailed {
        node: String,
        http_status: u16,
        reason: String,
    },
}

/// Summary of one placement pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Pods returned by the listing
    pub pods_seen: usize,
    /// Pods this instance is responsible for
    pub eligible: usize,
    /// Eligible pods without a labeled node
    pub no_match: usize,
    /// Successful bindings
    pub bound: usize,
    /// Failed bindings
    pub failed: usize,
}

impl PassReport {
    pub fn record(&mut self, outcome: &PodOutcome) {
        match outcome {
            PodOutcome::NoMatchingNode => self.no_match += 1,
            PodOutcome::Bound { .. } => self.bound += 1,
            PodOutcome::BindFailed { .. } => self.failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfsched_core::DEFAULT_LABEL_PREFIX;

    fn config(scheme: LabelScheme) -> SchedulerConfig {
        SchedulerConfig::new(LabelContract::new(DEFAULT_LABEL_PREFIX, "foo", scheme).unwrap())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(LabelScheme::Namespaced);
        assert_eq!(cfg.scheduler_name(), "foo");
        assert_eq!(cfg.concurrency, 1);
        assert!(cfg.namespaces.is_none());
        assert!(cfg.namespace_allowed("anything"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_namespace_allow_list() {
        let cfg = config(LabelScheme::Namespaced).with_namespaces(["default", "batch"]);
        assert!(cfg.namespace_allowed("default"));
        assert!(cfg.namespace_allowed("batch"));
        assert!(!cfg.namespace_allowed("kube-system"));

        let cfg = config(LabelScheme::Namespaced).with_namespaces(Vec::<String>::new());
        assert!(cfg.namespaces.is_none());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let cfg = config(LabelScheme::Namespaced).with_concurrency(0);
        assert!(matches!(
            cfg.validate(),
            Err(SchedulerError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_ambiguous_labels() {
        assert!(!config(LabelScheme::Namespaced).has_ambiguous_labels());
        assert!(config(LabelScheme::PodOnly).has_ambiguous_labels());
        assert!(!config(LabelScheme::PodOnly)
            .with_namespaces(["default"])
            .has_ambiguous_labels());
    }

    #[test]
    fn test_pass_report_record() {
        let mut report = PassReport::default();
        report.record(&PodOutcome::NoMatchingNode);
        report.record(&PodOutcome::Bound {
            node: "node1".to_string(),
        });
        report.record(&PodOutcome::BindFailed {
            node: "node1".to_string(),
            http_status: 409,
            reason: "Conflict".to_string(),
        });
        assert_eq!(report.no_match, 1);
        assert_eq!(report.bound, 1);
        assert_eq!(report.failed, 1);
    }
}
