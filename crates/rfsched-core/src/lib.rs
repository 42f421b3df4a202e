//! rfsched Core - Shared types for the label-affinity scheduler
//!
//! This crate provides:
//! - The node label contract and affinity key derivation
//! - Binding outcome types and the success predicate
//! - The binding counter registry and its Prometheus rendering
//! - Error types with miette diagnostics

pub mod error;
pub mod label;
pub mod metrics;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use label::{node_has_label, LabelContract, LabelScheme, DEFAULT_LABEL_PREFIX};
pub use metrics::BindingMetrics;
pub use types::{is_success_status, BindingLabels, BindingResult, PodIdentity};

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{Node, Pod};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
