//! Collaborator boundaries for the scheduling core
//!
//! The core is a library; its only external contracts are the in-process
//! traits defined here. Real deployments back them with a database and a
//! configuration service; tests use the in-memory implementations.

pub mod repository;

pub use repository::{
    CandidateRepository, ConfigStore, InMemoryCandidateRepository, InMemoryConfigStore,
};

use thiserror::Error;

/// Result type for collaborator operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the external collaborators
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be reached
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// A single timestamp write failed
    #[error("write failed for offer '{offer_id}': {reason}")]
    WriteFailed { offer_id: String, reason: String },

    /// A policy document failed validation at the boundary
    #[error("invalid policy document: {0}")]
    InvalidPolicy(#[from] crate::config::PolicyError),

    /// Document (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Create an unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create a per-offer write failure
    pub fn write_failed(offer_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            offer_id: offer_id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the next cycle may succeed without intervention
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::WriteFailed { .. })
    }
}
