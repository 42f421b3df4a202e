//! rfsched Client - Cluster accessor for the label-affinity scheduler
//!
//! This crate provides:
//! - The `ClusterAccessor` trait consumed by the placement engine
//! - `ApiClient`, a reqwest based implementation against the Kubernetes API
//! - Connection resolution from kubeconfig or an in-cluster service account
//! - `MockCluster` for tests

// Allow unused assignments for diagnostic fields - they're used by the thiserror/miette macros
#![allow(unused_assignments)]

pub mod api_client;
pub mod config;
pub mod error;
pub mod mock;
pub mod traits;

// Re-export primary types
pub use api_client::ApiClient;
pub use config::{ClusterConnection, DEFAULT_TOKEN_DIR};
pub use error::{ClientError, Result};
pub use mock::MockCluster;
pub use traits::ClusterAccessor;
