//! Smart hourly planning
//!
//! One invocation per tenant per hour: read policy, pull a candidate
//! snapshot, rank and diversify it, then allocate each selected offer a
//! unique minute within the remaining clock hour using chunked randomness
//! and persist the timestamps best-effort.
//!
//! Chunked randomness divides the remaining minutes into equal contiguous
//! blocks and draws one random minute per block. Unlike independent
//! sampling this guarantees distinct offsets and a monotone spread across
//! the hour, so publications never cluster.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::error::{SchedulerError, SchedulerResult};
use super::scorer::PriorityScorer;
use super::selection;
use crate::cache::{PolicyCache, TenantStatus};
use crate::models::{ScheduleAssignment, ScoredCandidate};
use crate::storage::{CandidateRepository, ConfigStore};

// ============================================================================
// Minute source
// ============================================================================

/// Injected randomness for time-slot allocation
///
/// Tests supply a seeded implementation and assert exact offsets.
pub trait MinuteSource: Send {
    /// Draw one integer uniformly from the inclusive range [lo, hi]
    fn pick(&mut self, lo: u32, hi: u32) -> u32;
}

/// Process-wide random source backed by the thread RNG
#[derive(Debug, Default)]
pub struct ThreadRngMinutes;

impl MinuteSource for ThreadRngMinutes {
    fn pick(&mut self, lo: u32, hi: u32) -> u32 {
        rand::thread_rng().gen_range(lo..=hi)
    }
}

/// Deterministic, seeded source for reproducible allocations
#[derive(Debug)]
pub struct SeededMinutes(ChaCha8Rng);

impl SeededMinutes {
    pub fn new(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl MinuteSource for SeededMinutes {
    fn pick(&mut self, lo: u32, hi: u32) -> u32 {
        self.0.gen_range(lo..=hi)
    }
}

/// Chunked-randomness minute allocation
///
/// Divides `remaining` minutes into `count` equal-width contiguous blocks
/// and draws one minute from block i's bounds `[i*chunk+1, (i+1)*chunk]`.
/// Offsets are defensively clamped to `[1, remaining]` so clock skew can
/// never produce a past-dated or next-hour slot.
///
/// Requires `count <= remaining`; callers bound the selection first.
pub fn allocate_minutes(remaining: u32, count: u32, source: &mut dyn MinuteSource) -> Vec<u32> {
    if count == 0 || remaining == 0 {
        return Vec::new();
    }

    let chunk = remaining / count;
    (0..count)
        .map(|i| {
            let lo = i * chunk + 1;
            let hi = (i + 1) * chunk;
            source.pick(lo, hi).clamp(1, remaining)
        })
        .collect()
}

// ============================================================================
// Plan outcome
// ============================================================================

/// Why a cycle scheduled nothing
///
/// All of these are normal "nothing to do" outcomes, not errors; a missed
/// hour is recoverable on the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No policy document exists for the tenant
    NoPolicy,
    /// The policy is present but paused
    Inactive,
    /// posts_per_hour is 0 (legacy fixed-interval mode handles this tenant)
    HourlyDisabled,
    /// Current hour is outside the tenant's posting window
    OutsideWindow,
    /// Less than one usable minute remains in the clock hour
    HourExhausted,
    /// No unscheduled candidates were available
    NoCandidates,
    /// A collaborator was unreachable; retry next cycle
    CollaboratorUnavailable,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPolicy => "no_policy",
            Self::Inactive => "inactive",
            Self::HourlyDisabled => "hourly_disabled",
            Self::OutsideWindow => "outside_window",
            Self::HourExhausted => "hour_exhausted",
            Self::NoCandidates => "no_candidates",
            Self::CollaboratorUnavailable => "collaborator_unavailable",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one planning cycle
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Assignments actually persisted
    pub scheduled: usize,

    /// Present when the cycle scheduled nothing for a benign reason
    pub skip_reason: Option<SkipReason>,

    /// The persisted assignments (ephemeral; for logging and tests)
    pub assignments: Vec<ScheduleAssignment>,
}

impl PlanOutcome {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            scheduled: 0,
            skip_reason: Some(reason),
            assignments: Vec::new(),
        }
    }
}

// ============================================================================
// Hourly planner
// ============================================================================

/// Per-tenant hourly publication planner
///
/// Collaborators are constructor-injected; the planner holds no mutable
/// state beyond the random source, so cycles for different tenants are
/// fully independent.
pub struct HourlyPlanner {
    config: Arc<dyn ConfigStore>,
    repository: Arc<dyn CandidateRepository>,
    scorer: PriorityScorer,
    minutes: Mutex<Box<dyn MinuteSource>>,
    status_cache: Option<Arc<PolicyCache>>,
}

impl HourlyPlanner {
    /// Create a planner with the default scorer and thread RNG
    pub fn new(config: Arc<dyn ConfigStore>, repository: Arc<dyn CandidateRepository>) -> Self {
        Self {
            config,
            repository,
            scorer: PriorityScorer::new(),
            minutes: Mutex::new(Box::new(ThreadRngMinutes)),
            status_cache: None,
        }
    }

    /// Replace the prioritization scorer
    pub fn with_scorer(mut self, scorer: PriorityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replace the minute source (deterministic tests)
    pub fn with_minute_source(mut self, source: Box<dyn MinuteSource>) -> Self {
        self.minutes = Mutex::new(source);
        self
    }

    /// Attach a cache for tenant-facing status documents
    pub fn with_status_cache(mut self, cache: Arc<PolicyCache>) -> Self {
        self.status_cache = Some(cache);
        self
    }

    /// Run one planning cycle for a tenant at the given instant
    ///
    /// Configuration gaps and collaborator failures surface as
    /// zero-scheduled outcomes, never as hard errors; per-offer write
    /// failures are logged and skipped.
    pub async fn plan_hour(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> SchedulerResult<PlanOutcome> {
        let policy = match self.config.get_active_policy(tenant_id).await {
            Ok(Some(policy)) => policy,
            Ok(None) => {
                return self
                    .finish(tenant_id, None, now, PlanOutcome::skipped(SkipReason::NoPolicy))
                    .await;
            }
            Err(e) => {
                tracing::warn!(tenant = %tenant_id, error = %e, "policy read failed");
                return self
                    .finish(
                        tenant_id,
                        None,
                        now,
                        PlanOutcome::skipped(SkipReason::CollaboratorUnavailable),
                    )
                    .await;
            }
        };

        if !policy.active {
            return self
                .finish(tenant_id, Some(&policy), now, PlanOutcome::skipped(SkipReason::Inactive))
                .await;
        }
        if policy.posts_per_hour == 0 {
            return self
                .finish(
                    tenant_id,
                    Some(&policy),
                    now,
                    PlanOutcome::skipped(SkipReason::HourlyDisabled),
                )
                .await;
        }
        if !policy.should_post_at(now.hour() as u8) {
            return self
                .finish(
                    tenant_id,
                    Some(&policy),
                    now,
                    PlanOutcome::skipped(SkipReason::OutsideWindow),
                )
                .await;
        }

        let remaining = 59u32.saturating_sub(now.minute());
        if remaining < 1 {
            return self
                .finish(
                    tenant_id,
                    Some(&policy),
                    now,
                    PlanOutcome::skipped(SkipReason::HourExhausted),
                )
                .await;
        }

        // Single consistent snapshot; no re-fetch inside the cycle
        let fetch_limit = (policy.posts_per_hour as usize) * 2;
        let ranked = match selection::ranked_candidates(
            self.repository.as_ref(),
            &self.scorer,
            &policy,
            now,
            fetch_limit,
        )
        .await
        {
            Ok(ranked) => ranked,
            Err(e) => {
                tracing::warn!(tenant = %tenant_id, error = %e, "candidate fetch failed");
                return self
                    .finish(
                        tenant_id,
                        Some(&policy),
                        now,
                        PlanOutcome::skipped(SkipReason::CollaboratorUnavailable),
                    )
                    .await;
            }
        };

        let available = selection::filter_unscheduled(ranked);
        if available.is_empty() {
            return self
                .finish(
                    tenant_id,
                    Some(&policy),
                    now,
                    PlanOutcome::skipped(SkipReason::NoCandidates),
                )
                .await;
        }

        let selected_count = (policy.posts_per_hour as usize)
            .min(available.len())
            .min(remaining as usize);
        let selected = selection::diversify_by_source(available, selected_count);

        let offsets = {
            let mut source = self.minutes.lock().expect("minute source lock poisoned");
            allocate_minutes(remaining, selected.len() as u32, source.as_mut())
        };

        let outcome = self.persist_assignments(tenant_id, now, selected, offsets).await;
        self.finish(tenant_id, Some(&policy), now, outcome).await
    }

    /// Pair candidates with their minute offsets and persist best-effort
    async fn persist_assignments(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
        selected: Vec<ScoredCandidate>,
        offsets: Vec<u32>,
    ) -> PlanOutcome {
        let mut assignments = Vec::with_capacity(selected.len());

        for (candidate, offset) in selected.into_iter().zip(offsets) {
            let publish_at = now + Duration::minutes(offset as i64);
            match self
                .repository
                .set_scheduled_timestamp(&candidate.offer.id, publish_at)
                .await
            {
                Ok(()) => {
                    tracing::debug!(
                        tenant = %tenant_id,
                        offer = %candidate.offer.id,
                        minute = offset,
                        priority = candidate.priority,
                        "publication slot assigned"
                    );
                    assignments.push(ScheduleAssignment {
                        offer_id: candidate.offer.id,
                        minute_offset: offset,
                        publish_at,
                    });
                }
                Err(e) => {
                    // Best-effort: one failed write must not abort the rest
                    tracing::warn!(
                        tenant = %tenant_id,
                        offer = %candidate.offer.id,
                        error = %e,
                        "timestamp write failed, continuing"
                    );
                }
            }
        }

        PlanOutcome {
            scheduled: assignments.len(),
            skip_reason: None,
            assignments,
        }
    }

    /// Log the cycle result and refresh the tenant status document
    async fn finish(
        &self,
        tenant_id: &str,
        policy: Option<&crate::config::TenantPolicy>,
        now: DateTime<Utc>,
        outcome: PlanOutcome,
    ) -> SchedulerResult<PlanOutcome> {
        match outcome.skip_reason {
            Some(reason) => {
                tracing::info!(tenant = %tenant_id, reason = %reason, "cycle scheduled nothing");
            }
            None => {
                let minutes: Vec<u32> =
                    outcome.assignments.iter().map(|a| a.minute_offset).collect();
                tracing::info!(
                    tenant = %tenant_id,
                    scheduled = outcome.scheduled,
                    minutes = ?minutes,
                    "cycle complete"
                );
            }
        }

        if let Some(cache) = &self.status_cache {
            cache
                .set_status(
                    tenant_id,
                    TenantStatus {
                        active: policy.map(|p| p.active).unwrap_or(false),
                        posts_per_hour: policy.map(|p| p.posts_per_hour).unwrap_or(0),
                        last_scheduled: outcome.scheduled,
                        last_skip_reason: outcome.skip_reason.map(|r| r.to_string()),
                        last_run_at: now,
                    },
                )
                .await;
        }

        Ok(outcome)
    }

    /// Run one cycle for each tenant at the same instant
    ///
    /// Cycles are fully independent (no shared mutable state beyond the
    /// random source) and run concurrently.
    pub async fn plan_many(
        &self,
        tenant_ids: &[String],
        now: DateTime<Utc>,
    ) -> Vec<(String, SchedulerResult<PlanOutcome>)> {
        let cycles = tenant_ids.iter().map(|tenant_id| async move {
            (tenant_id.clone(), self.plan_hour(tenant_id, now).await)
        });
        futures::future::join_all(cycles).await
    }

    /// Pause scheduling for a tenant and clear its pending assignments
    ///
    /// Persists the deactivated policy, unschedules not-yet-published
    /// offers, then fires the policy-changed hook so downstream schedulers
    /// drop stale state.
    pub async fn pause(&self, tenant_id: &str) -> SchedulerResult<()> {
        let mut policy = self
            .config
            .get_active_policy(tenant_id)
            .await
            .map_err(|e| SchedulerError::storage("get_active_policy", e))?
            .ok_or_else(|| SchedulerError::policy_not_found(tenant_id))?;

        policy.active = false;
        self.config
            .save_policy(policy)
            .await
            .map_err(|e| SchedulerError::storage("save_policy", e))?;

        let cleared = self
            .repository
            .clear_schedule(tenant_id)
            .await
            .map_err(|e| SchedulerError::storage("clear_schedule", e))?;
        tracing::info!(tenant = %tenant_id, cleared = cleared, "scheduling paused");

        self.config
            .on_policy_changed(tenant_id)
            .await
            .map_err(|e| SchedulerError::storage("on_policy_changed", e))?;
        Ok(())
    }

    /// Resume scheduling for a paused tenant
    pub async fn resume(&self, tenant_id: &str) -> SchedulerResult<()> {
        let mut policy = self
            .config
            .get_active_policy(tenant_id)
            .await
            .map_err(|e| SchedulerError::storage("get_active_policy", e))?
            .ok_or_else(|| SchedulerError::policy_not_found(tenant_id))?;

        policy.active = true;
        self.config
            .save_policy(policy)
            .await
            .map_err(|e| SchedulerError::storage("save_policy", e))?;

        self.config
            .on_policy_changed(tenant_id)
            .await
            .map_err(|e| SchedulerError::storage("on_policy_changed", e))?;
        tracing::info!(tenant = %tenant_id, "scheduling resumed");
        Ok(())
    }
}
