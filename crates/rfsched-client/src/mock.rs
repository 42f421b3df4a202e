use crate::error::{ClientError, Result};
use crate::traits::ClusterAccessor;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use rfsched_core::{BindingLabels, BindingMetrics, BindingResult, PodIdentity};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory cluster for testing the placement engine
///
/// Holds pod and node snapshots, counts every accessor call, and records
/// bindings. Binding responses default to `201 Created` and can be scripted
/// with [`MockCluster::push_binding_response`]. A successful binding sets the
/// pod's `spec.nodeName`, like the API server would.
pub struct MockCluster {
    pods: RwLock<Vec<Pod>>,
    nodes: RwLock<Vec<Node>>,
    responses: RwLock<VecDeque<BindingResult>>,
    bindings: RwLock<Vec<(PodIdentity, String)>>,
    list_pods_calls: AtomicUsize,
    list_nodes_calls: AtomicUsize,
    fail_pod_listing: AtomicBool,
    fail_node_listing: AtomicBool,
    scheduler_name: String,
    metrics: Arc<BindingMetrics>,
}

impl MockCluster {
    pub fn new(scheduler_name: impl Into<String>, metrics: Arc<BindingMetrics>) -> Self {
        Self {
            pods: RwLock::new(Vec::new()),
            nodes: RwLock::new(Vec::new()),
            responses: RwLock::new(VecDeque::new()),
            bindings: RwLock::new(Vec::new()),
            list_pods_calls: AtomicUsize::new(0),
            list_nodes_calls: AtomicUsize::new(0),
            fail_pod_listing: AtomicBool::new(false),
            fail_node_listing: AtomicBool::new(false),
            scheduler_name: scheduler_name.into(),
            metrics,
        }
    }

    pub async fn set_pods(&self, pods: Vec<Pod>) {
        *self.pods.write().await = pods;
    }

    pub async fn set_nodes(&self, nodes: Vec<Node>) {
        *self.nodes.write().await = nodes;
    }

    /// Queue the result of the next binding commit
    pub async fn push_binding_response(&self, http_status: u16, reason: &str) {
        self.responses
            .write()
            .await
            .push_back(BindingResult::from_status(http_status, reason));
    }

    /// Queue a binding commit that never reaches the API server
    pub async fn push_connection_error(&self) {
        self.responses
            .write()
            .await
            .push_back(BindingResult::connection_error());
    }

    /// Make `list_pods` and `list_nodes` fail with a transport error
    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_pod_listing.store(fail, Ordering::SeqCst);
        self.fail_node_listing.store(fail, Ordering::SeqCst);
    }

    /// Make only `list_nodes` fail with a transport error
    pub fn set_fail_node_listing(&self, fail: bool) {
        self.fail_node_listing.store(fail, Ordering::SeqCst);
    }

    pub fn list_pods_calls(&self) -> usize {
        self.list_pods_calls.load(Ordering::SeqCst)
    }

    pub fn list_nodes_calls(&self) -> usize {
        self.list_nodes_calls.load(Ordering::SeqCst)
    }

    /// Every binding commit issued so far, in call order
    pub async fn bindings(&self) -> Vec<(PodIdentity, String)> {
        self.bindings.read().await.clone()
    }

    pub async fn pods(&self) -> Vec<Pod> {
        self.pods.read().await.clone()
    }

    fn check_listing(&self, what: &str, flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(ClientError::transport(
                format!("mock://{}", what),
                "connection refused",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterAccessor for MockCluster {
    async fn list_pods(&self) -> Result<Vec<Pod>> {
        self.list_pods_calls.fetch_add(1, Ordering::SeqCst);
        self.check_listing("pods", &self.fail_pod_listing)?;
        Ok(self.pods.read().await.clone())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>> {
        self.list_nodes_calls.fetch_add(1, Ordering::SeqCst);
        self.check_listing("nodes", &self.fail_node_listing)?;
        Ok(self.nodes.read().await.clone())
    }

    async fn commit_binding(&self, pod: &PodIdentity, node_name: &str) -> BindingResult {
        let labels = BindingLabels::new(pod, node_name, &self.scheduler_name);
        self.metrics.record_attempt(&labels);

        self.bindings
            .write()
            .await
            .push((pod.clone(), node_name.to_string()));

        let result = self
            .responses
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| BindingResult::from_status(201, "Created"));

        if result.success {
            let mut pods = self.pods.write().await;
            for p in pods.iter_mut() {
                if p.metadata.namespace.as_deref() == Some(pod.namespace.as_str())
                    && p.metadata.name.as_deref() == Some(pod.name.as_str())
                {
                    if let Some(spec) = p.spec.as_mut() {
                        spec.node_name = Some(node_name.to_string());
                    }
                }
            }
        }
        debug!(
            "Mock: bind {} -> {}: {} {}",
            pod, node_name, result.http_status, result.reason
        );

        self.metrics.record_outcome(&labels, &result);
        result
    }
}
