use std::fmt;

/// Namespace and name of a pod, read from a pod snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PodIdentity {
    pub namespace: String,
    pub name: String,
}

impl PodIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Reason reported when a binding request never reached the API server
pub const CONNECTION_ERROR_REASON: &str = "ConnectionError";

/// Whether an HTTP status counts as a committed binding (strictly 2xx)
pub fn is_success_status(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Outcome of a binding commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingResult {
    /// Whether the binding was accepted
    pub success: bool,
    /// HTTP status returned by the API server (0 if no response was received)
    pub http_status: u16,
    /// Human-readable reason phrase
    pub reason: String,
}

impl BindingResult {
    /// Build a result from an HTTP status and reason phrase
    pub fn from_status(http_status: u16, reason: impl Into<String>) -> Self {
        Self {
            success: is_success_status(http_status),
            http_status,
            reason: reason.into(),
        }
    }

    /// Build a failed result for a request that got no response
    pub fn connection_error() -> Self {
        Self {
            success: false,
            http_status: 0,
            reason: CONNECTION_ERROR_REASON.to_string(),
        }
    }
}

/// Labels shared by all binding counters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingLabels {
    pub pod: String,
    pub node: String,
    pub scheduler: String,
    pub namespace: String,
}

impl BindingLabels {
    pub fn new(pod: &PodIdentity, node: &str, scheduler: &str) -> Self {
        Self {
            pod: pod.name.clone(),
            node: node.to_string(),
            scheduler: scheduler.to_string(),
            namespace: pod.namespace.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_predicate_is_strict_2xx() {
        assert!(!is_success_status(199));
        assert!(is_success_status(200));
        assert!(is_success_status(201));
        assert!(is_success_status(299));
        assert!(!is_success_status(300));
        assert!(!is_success_status(409));
        assert!(!is_success_status(0));
    }

    #[test]
    fn test_binding_result_from_status() {
        let ok = BindingResult::from_status(201, "Created");
        assert!(ok.success);
        assert_eq!(ok.http_status, 201);

        let conflict = BindingResult::from_status(409, "Conflict");
        assert!(!conflict.success);
        assert_eq!(conflict.reason, "Conflict");

        let conn = BindingResult::connection_error();
        assert!(!conn.success);
        assert_eq!(conn.http_status, 0);
        assert_eq!(conn.reason, CONNECTION_ERROR_REASON);
    }

    #[test]
    fn test_binding_labels() {
        let pod = PodIdentity::new("default", "pod1");
        let labels = BindingLabels::new(&pod, "node1", "foo");
        assert_eq!(labels.pod, "pod1");
        assert_eq!(labels.node, "node1");
        assert_eq!(labels.scheduler, "foo");
        assert_eq!(labels.namespace, "default");
        assert_eq!(pod.to_string(), "default/pod1");
    }
}
