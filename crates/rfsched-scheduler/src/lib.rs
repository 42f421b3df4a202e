//! rfsched scheduler - label-affinity pod placement
//!
//! This crate provides:
//! - Pod eligibility predicate (scheduler name, binding state, namespace allow-list)
//! - Affinity label derivation
//! - Uniform random selection among labeled nodes
//! - Placement passes, single-shot or periodic

pub mod error;
pub mod filter;
pub mod scheduler;
pub mod select;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SchedulerError};
pub use filter::{check_eligibility, is_schedulable, label_key, Eligibility, IneligibleReason};
pub use scheduler::Scheduler;
pub use select::{matching_nodes, select_node};
pub use types::{PassReport, PodOutcome, SchedulerConfig};
