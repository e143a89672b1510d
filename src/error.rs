//! Unified error handling for the sijang crate
//!
//! Module-specific error types stay close to their modules; this enum
//! wraps them for callers that cross module boundaries.

use thiserror::Error;

pub use crate::config::PolicyError;
pub use crate::scheduler::error::SchedulerError;
pub use crate::storage::StorageError;

/// Result type using the unified error
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the sijang crate
#[derive(Debug, Error)]
pub enum Error {
    /// Scheduler and planning-cycle errors
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Collaborator storage errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Policy validation errors
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if the error is recoverable on a later cycle
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Storage(e) => e.is_recoverable(),
            Self::Policy(_) => false,
            Self::Json(_) => false,
        }
    }
}
