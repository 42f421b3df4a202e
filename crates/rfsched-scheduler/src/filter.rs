//! Pod eligibility
//!
//! A pod is handled by this instance iff it requests this scheduler by name,
//! is not bound to a node yet, and (when an allow-list is configured) lives in
//! an allowed namespace. Pods with unreadable identity fields are never
//! eligible; they are reported as such instead of failing the pass.

use crate::types::SchedulerConfig;
use k8s_openapi::api::core::v1::Pod;
use rfsched_core::{LabelContract, PodIdentity};
use std::fmt;

/// Why a pod is not handled by this instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IneligibleReason {
    /// A required field is absent or empty
    MissingField(&'static str),
    /// The pod asks for a different scheduler
    OtherScheduler(String),
    /// The pod already has `spec.nodeName`
    AlreadyBound(String),
    /// The pod's namespace is outside the allow-list
    NamespaceNotAllowed(String),
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::MissingField(field) => write!(f, "missing {}", field),
            IneligibleReason::OtherScheduler(name) => write!(f, "requests scheduler '{}'", name),
            IneligibleReason::AlreadyBound(node) => write!(f, "already bound to '{}'", node),
            IneligibleReason::NamespaceNotAllowed(ns) => {
                write!(f, "namespace '{}' is not allowed", ns)
            }
        }
    }
}

/// Result of the eligibility check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible(PodIdentity),
    Ineligible(IneligibleReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible(_))
    }
}

/// Read a string field, treating an empty string like an absent one
fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Decide whether `pod` should be placed by this instance
pub fn check_eligibility(pod: &Pod, config: &SchedulerConfig) -> Eligibility {
    let Some(name) = non_empty(pod.metadata.name.as_ref()) else {
        return Eligibility::Ineligible(IneligibleReason::MissingField("metadata.name"));
    };
    let Some(namespace) = non_empty(pod.metadata.namespace.as_ref()) else {
        return Eligibility::Ineligible(IneligibleReason::MissingField("metadata.namespace"));
    };
    let Some(spec) = pod.spec.as_ref() else {
        return Eligibility::Ineligible(IneligibleReason::MissingField("spec"));
    };
    let Some(scheduler_name) = non_empty(spec.scheduler_name.as_ref()) else {
        return Eligibility::Ineligible(IneligibleReason::MissingField("spec.schedulerName"));
    };

    if scheduler_name != config.scheduler_name() {
        return Eligibility::Ineligible(IneligibleReason::OtherScheduler(
            scheduler_name.to_string(),
        ));
    }

    if let Some(node) = non_empty(spec.node_name.as_ref()) {
        return Eligibility::Ineligible(IneligibleReason::AlreadyBound(node.to_string()));
    }

    if !config.namespace_allowed(namespace) {
        return Eligibility::Ineligible(IneligibleReason::NamespaceNotAllowed(
            namespace.to_string(),
        ));
    }

    Eligibility::Eligible(PodIdentity::new(namespace, name))
}

/// Whether `pod` should be placed by this instance
pub fn is_schedulable(pod: &Pod, config: &SchedulerConfig) -> bool {
    check_eligibility(pod, config).is_eligible()
}

/// Affinity label key a node must carry to accept `pod`
pub fn label_key(pod: &PodIdentity, contract: &LabelContract) -> String {
    contract.key_for(&pod.namespace, &pod.name)
}
