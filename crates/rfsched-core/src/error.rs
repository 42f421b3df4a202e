// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for rfsched configuration and label handling
#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    /// Scheduler name cannot be embedded in a label key
    #[error("Invalid scheduler name: '{name}'")]
    #[diagnostic(
        code(rfsched::invalid_scheduler_name),
        help("Use lowercase alphanumerics and '-' only, starting and ending with an alphanumeric (max 63 characters). The name is part of every node label this scheduler matches")
    )]
    InvalidSchedulerName {
        #[allow(unused)]
        name: String,
    },

    /// Label prefix is not a valid DNS subdomain
    #[error("Invalid label prefix: '{prefix}'")]
    #[diagnostic(
        code(rfsched::invalid_label_prefix),
        help("The prefix must be a DNS subdomain such as 'rf.scheduler'")
    )]
    InvalidLabelPrefix {
        #[allow(unused)]
        prefix: String,
    },

    /// Unknown label scheme
    #[error("Unknown label scheme: '{scheme}'")]
    #[diagnostic(
        code(rfsched::invalid_label_scheme),
        help("Supported schemes: 'namespaced' (<prefix>.<scheduler>.<namespace>/<pod>) and 'pod-only' (<prefix>.<scheduler>/<pod>)")
    )]
    InvalidLabelScheme {
        #[allow(unused)]
        scheme: String,
    },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an InvalidSchedulerName error
    pub fn invalid_scheduler_name(name: impl Into<String>) -> Self {
        Self::InvalidSchedulerName { name: name.into() }
    }

    /// Create an InvalidLabelPrefix error
    pub fn invalid_label_prefix(prefix: impl Into<String>) -> Self {
        Self::InvalidLabelPrefix {
            prefix: prefix.into(),
        }
    }

    /// Create an InvalidLabelScheme error
    pub fn invalid_label_scheme(scheme: impl Into<String>) -> Self {
        Self::InvalidLabelScheme {
            scheme: scheme.into(),
        }
    }
}
