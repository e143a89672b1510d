//! Error types for the scheduler module

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
///
/// Collaborator failures inside a planning cycle are logged and converted
/// to zero-scheduled outcomes rather than surfaced here; these variants
/// cover control-path operations (pause/resume, malformed inputs).
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Invalid hour value (must be 0-23)
    #[error("invalid hour '{hour}', must be 0-23")]
    InvalidHour { hour: u32 },

    /// No policy exists for the tenant
    #[error("no scheduling policy for tenant '{tenant}'")]
    PolicyNotFound { tenant: String },

    /// A collaborator operation failed outside the best-effort cycle path
    #[error("storage error during '{operation}': {source}")]
    Storage {
        operation: String,
        #[source]
        source: StorageError,
    },
}

impl SchedulerError {
    /// Create an invalid hour error
    pub fn invalid_hour(hour: u32) -> Self {
        Self::InvalidHour { hour }
    }

    /// Create a policy not found error
    pub fn policy_not_found(tenant: impl Into<String>) -> Self {
        Self::PolicyNotFound {
            tenant: tenant.into(),
        }
    }

    /// Wrap a storage error with the operation that raised it
    pub fn storage(operation: impl Into<String>, source: StorageError) -> Self {
        Self::Storage {
            operation: operation.into(),
            source,
        }
    }

    /// Check if the error is recoverable on the next cycle
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Storage { source, .. } => source.is_recoverable(),
            Self::PolicyNotFound { .. } => true,
            Self::InvalidHour { .. } => false,
        }
    }
}
