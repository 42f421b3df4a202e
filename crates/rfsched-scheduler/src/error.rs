// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Scheduler error type
#[derive(Error, Debug, Diagnostic)]
pub enum SchedulerError {
    /// Cluster access failed (connectivity, authentication, decoding)
    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] rfsched_client::ClientError),

    /// Label contract error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] rfsched_core::CoreError),

    /// Invalid scheduler configuration
    #[error("Invalid scheduler configuration: {message}")]
    #[diagnostic(
        code(scheduler::invalid_config),
        help("{suggestion}")
    )]
    InvalidConfig {
        message: String,
        suggestion: String,
    },
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    /// Create an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}
