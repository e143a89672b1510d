//! sijang - Offer Prioritization & Hourly Scheduling Engine
//!
//! A multi-tenant engine that scores candidate marketplace deals with an
//! adaptive multi-factor model, diversifies a bounded working set across
//! marketplaces, and allocates each selected offer a unique, collision-free
//! publication minute within the current clock hour.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - per-tenant scheduling policy and validation
//! - [`cache`] - short-TTL, write-invalidated policy cache
//! - [`models`] - core data structures (offers, statistics, assignments)
//! - [`scheduler`] - scoring, seasonal matching, selection, and planning
//! - [`storage`] - collaborator traits and in-memory implementations
//! - [`error`] - unified error type
//!
//! Marketplace data collection, channel delivery, and the web API are
//! external collaborators reached only through the [`storage`] traits.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sijang::cache::{CachedConfigStore, PolicyCache};
//! use sijang::scheduler::HourlyPlanner;
//! use sijang::storage::{InMemoryCandidateRepository, InMemoryConfigStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(PolicyCache::new());
//!     let config = Arc::new(CachedConfigStore::new(InMemoryConfigStore::new(), cache.clone()));
//!     let repo = Arc::new(InMemoryCandidateRepository::new());
//!
//!     let planner = HourlyPlanner::new(config, repo).with_status_cache(cache);
//!     let outcome = planner.plan_hour("tenant-1", chrono::Utc::now()).await?;
//!     println!("scheduled {} offers", outcome.scheduled);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{CachedConfigStore, PolicyCache, TenantStatus};
    pub use crate::config::{CandidateFilters, HighTicketPolicy, PeakWindow, TenantPolicy};
    pub use crate::error::{Error, Result};
    pub use crate::models::{Marketplace, Offer, OfferStatistics, ScoredCandidate};
    pub use crate::scheduler::{
        HourlyPlanner, PlanOutcome, PriorityScorer, SeasonalCalendar, SkipReason,
    };
    pub use crate::storage::{CandidateRepository, ConfigStore};
}

// Direct re-exports for convenience
pub use error::{Error, Result};
pub use models::{Marketplace, Offer, OfferStatistics, ScheduleAssignment, ScoredCandidate};
