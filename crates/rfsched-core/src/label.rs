//! Node label contract
//!
//! Operators mark a node as a target for a pod by putting a label on the node
//! whose key is derived from the scheduler name and the pod identity. Only the
//! presence of the key matters; the value is ignored.
//!
//! Two key layouts exist and they are not compatible with each other:
//!
//! - [`LabelScheme::Namespaced`]: `<prefix>.<scheduler>.<namespace>/<pod>`
//! - [`LabelScheme::PodOnly`]: `<prefix>.<scheduler>/<pod>`
//!
//! A deployment must pick exactly one. `PodOnly` keys do not carry the
//! namespace, so a label meant for `a/web` also matches `b/web`; pair it with
//! a namespace allow-list.

use crate::error::{CoreError, Result};
use crate::Node;
use std::fmt;
use std::str::FromStr;

/// Default label key prefix
pub const DEFAULT_LABEL_PREFIX: &str = "rf.scheduler";

/// Layout of the affinity label key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelScheme {
    /// `<prefix>.<scheduler>.<namespace>/<pod>`
    #[default]
    Namespaced,
    /// `<prefix>.<scheduler>/<pod>`
    PodOnly,
}

impl LabelScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelScheme::Namespaced => "namespaced",
            LabelScheme::PodOnly => "pod-only",
        }
    }
}

impl fmt::Display for LabelScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelScheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "namespaced" => Ok(LabelScheme::Namespaced),
            "pod-only" | "podonly" => Ok(LabelScheme::PodOnly),
            other => Err(CoreError::invalid_label_scheme(other)),
        }
    }
}

/// The label contract between this scheduler and whoever labels nodes.
///
/// A contract is bound to one scheduler name; keys can only be produced
/// through [`LabelContract::key_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelContract {
    prefix: String,
    scheduler_name: String,
    scheme: LabelScheme,
}

impl LabelContract {
    /// Create a contract, validating the parts that end up in every key
    pub fn new(
        prefix: impl Into<String>,
        scheduler_name: impl Into<String>,
        scheme: LabelScheme,
    ) -> Result<Self> {
        let prefix = prefix.into();
        let scheduler_name = scheduler_name.into();

        if !is_valid_prefix(&prefix) {
            return Err(CoreError::invalid_label_prefix(prefix));
        }
        if !is_valid_scheduler_name(&scheduler_name) {
            return Err(CoreError::invalid_scheduler_name(scheduler_name));
        }

        Ok(Self {
            prefix,
            scheduler_name,
            scheme,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn scheduler_name(&self) -> &str {
        &self.scheduler_name
    }

    pub fn scheme(&self) -> LabelScheme {
        self.scheme
    }

    /// Derive the affinity label key for a pod
    pub fn key_for(&self, namespace: &str, pod_name: &str) -> String {
        match self.scheme {
            LabelScheme::Namespaced => format!(
                "{}.{}.{}/{}",
                self.prefix, self.scheduler_name, namespace, pod_name
            ),
            LabelScheme::PodOnly => {
                format!("{}.{}/{}", self.prefix, self.scheduler_name, pod_name)
            }
        }
    }
}

/// Check whether a node carries the given label key (any value)
pub fn node_has_label(node: &Node, key: &str) -> bool {
    node.metadata
        .labels
        .as_ref()
        .is_some_and(|labels| labels.contains_key(key))
}

/// Validate a scheduler name (DNS-1123 label: no dots, max 63 characters)
pub fn is_valid_scheduler_name(name: &str) -> bool {
    is_dns_label(name)
}

/// Validate a label prefix (DNS-1123 subdomain made of DNS labels)
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.len() <= 253 && prefix.split('.').all(is_dns_label)
}

fn is_dns_label(s: &str) -> bool {
    if s.is_empty() || s.len() > 63 {
        return false;
    }

    let bytes = s.as_bytes();
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    alnum(&bytes[0])
        && alnum(&bytes[bytes.len() - 1])
        && bytes.iter().all(|b| alnum(b) || *b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn contract(name: &str, scheme: LabelScheme) -> LabelContract {
        LabelContract::new(DEFAULT_LABEL_PREFIX, name, scheme).unwrap()
    }

    #[test]
    fn test_namespaced_key() {
        let c = contract("myscheduler", LabelScheme::Namespaced);
        assert_eq!(
            c.key_for("default", "pod1"),
            "rf.scheduler.myscheduler.default/pod1"
        );
    }

    #[test]
    fn test_pod_only_key() {
        let c = contract("myscheduler", LabelScheme::PodOnly);
        assert_eq!(c.key_for("default", "pod1"), "rf.scheduler.myscheduler/pod1");
        // Namespace does not take part in the key
        assert_eq!(c.key_for("default", "pod1"), c.key_for("other", "pod1"));
    }

    #[test]
    fn test_key_is_deterministic() {
        let c = contract("foo", LabelScheme::Namespaced);
        assert_eq!(c.key_for("default", "pod1"), c.key_for("default", "pod1"));
    }

    #[test]
    fn test_custom_prefix() {
        let c = LabelContract::new("sched.example.com", "foo", LabelScheme::Namespaced).unwrap();
        assert_eq!(c.key_for("ns", "p"), "sched.example.com.foo.ns/p");
    }

    #[test]
    fn test_invalid_scheduler_names() {
        for name in ["", "Foo", "foo.bar", "-foo", "foo-", "foo_bar", "a".repeat(64).as_str()] {
            assert!(
                LabelContract::new(DEFAULT_LABEL_PREFIX, name, LabelScheme::Namespaced).is_err(),
                "expected '{}' to be rejected",
                name
            );
        }
        assert!(is_valid_scheduler_name("rfcustom"));
        assert!(is_valid_scheduler_name("rf-custom-2"));
    }

    #[test]
    fn test_invalid_prefix() {
        let err = LabelContract::new("rf..scheduler", "foo", LabelScheme::Namespaced).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLabelPrefix { .. }));
        assert!(!is_valid_prefix(""));
        assert!(is_valid_prefix("rf.scheduler"));
    }

    #[test]
    fn test_label_scheme_parse() {
        assert_eq!("namespaced".parse::<LabelScheme>().unwrap(), LabelScheme::Namespaced);
        assert_eq!("pod-only".parse::<LabelScheme>().unwrap(), LabelScheme::PodOnly);
        assert_eq!("PodOnly".parse::<LabelScheme>().unwrap(), LabelScheme::PodOnly);
        assert!("both".parse::<LabelScheme>().is_err());
        assert_eq!(LabelScheme::default(), LabelScheme::Namespaced);
        assert_eq!(LabelScheme::PodOnly.to_string(), "pod-only");
    }

    #[test]
    fn test_node_has_label_ignores_value() {
        let mut node = Node::default();
        assert!(!node_has_label(&node, "rf.scheduler.foo.default/pod1"));

        node.metadata.labels = Some(BTreeMap::from([(
            "rf.scheduler.foo.default/pod1".to_string(),
            String::new(),
        )]));
        assert!(node_has_label(&node, "rf.scheduler.foo.default/pod1"));
        assert!(!node_has_label(&node, "rf.scheduler.foo.default/pod"));

        node.metadata.labels = Some(BTreeMap::from([(
            "rf.scheduler.foo.default/pod1".to_string(),
            "false".to_string(),
        )]));
        assert!(node_has_label(&node, "rf.scheduler.foo.default/pod1"));
    }
}
