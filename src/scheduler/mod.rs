//! Offer prioritization and hourly publication scheduling
//!
//! The core planning pipeline, invoked once per tenant per hour by an
//! external time-based trigger:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ ConfigStore  │──▶│    policy    │──▶│  HourlyPlanner   │
//! │ (via cache)  │   │  gate checks │   │                  │
//! └──────────────┘   └──────────────┘   │ fetch ─▶ score   │
//! ┌──────────────┐                      │  ─▶ diversify    │
//! │  Candidate   │─────────────────────▶│  ─▶ allocate     │
//! │  Repository  │◀─────────────────────│  ─▶ persist      │
//! └──────────────┘  scheduled_at writes └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`scorer`] - multi-factor priority model (peak, sales, discount,
//!   price, seasonal, revenue components)
//! - [`seasonal`] - static calendar of promotional periods
//! - [`selection`] - ranked fetch and marketplace round-robin
//! - [`planner`] - hourly cycle with chunked-randomness minute allocation
//! - [`error`] - scheduler error types
//!
//! # Quick start
//!
//! ```ignore
//! use sijang::scheduler::HourlyPlanner;
//! use chrono::Utc;
//!
//! let planner = HourlyPlanner::new(config_store, candidate_repo);
//! let outcome = planner.plan_hour("tenant-1", Utc::now()).await?;
//! println!("scheduled {} offers", outcome.scheduled);
//! ```

pub mod error;
pub mod planner;
pub mod scorer;
pub mod seasonal;
pub mod selection;

// Re-export main types
pub use error::{SchedulerError, SchedulerResult};
pub use planner::{
    allocate_minutes, HourlyPlanner, MinuteSource, PlanOutcome, SeededMinutes, SkipReason,
    ThreadRngMinutes,
};
pub use scorer::PriorityScorer;
pub use seasonal::{SeasonalCalendar, SeasonalEvent};
pub use selection::{diversify_by_source, filter_unscheduled, ranked_candidates};
