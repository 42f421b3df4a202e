use crate::error::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};
use rfsched_core::{BindingResult, PodIdentity};

/// Access to the cluster state consumed by the placement engine
///
/// Implementations own the binding counters: every `commit_binding` call
/// records one attempt when issued and exactly one success or failure when
/// resolved. `MockCluster` implements it for tests.
#[async_trait]
pub trait ClusterAccessor: Send + Sync {
    /// Snapshot of every pod in every namespace
    async fn list_pods(&self) -> Result<Vec<Pod>>;

    /// Snapshot of every node
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Bind a pod to a node.
    ///
    /// Rejections by the API server and transport failures are reported in
    /// the returned `BindingResult`, never as an error.
    async fn commit_binding(&self, pod: &PodIdentity, node_name: &str) -> BindingResult;
}
