//! Candidate ranking and source diversification
//!
//! Fetches a bounded candidate snapshot from the repository, scores it
//! with the prioritization model, and diversifies the ranked list across
//! marketplace sources so a single marketplace cannot dominate one hour's
//! output even when it scores highest on average.

use std::collections::HashMap;
use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::scorer::PriorityScorer;
use crate::config::TenantPolicy;
use crate::models::{Marketplace, ScoredCandidate};
use crate::storage::{CandidateRepository, StorageResult};

/// Fetch and rank up to `limit` candidates for one tenant
///
/// Scoring uses a single consistent snapshot; no re-fetch occurs after
/// this call within a cycle. Ranking is descending by priority with ties
/// broken by repository arrival order (the sort is stable).
pub async fn ranked_candidates(
    repository: &dyn CandidateRepository,
    scorer: &PriorityScorer,
    policy: &TenantPolicy,
    now: DateTime<Utc>,
    limit: usize,
) -> StorageResult<Vec<ScoredCandidate>> {
    let offers = repository
        .find_candidates(&policy.tenant_id, &policy.filters(), limit)
        .await?;

    let urls: Vec<String> = offers.iter().map(|o| o.product_url.clone()).collect();
    let stats_by_url: HashMap<String, _> = repository
        .find_statistics(&urls)
        .await?
        .into_iter()
        .map(|s| (s.product_url.clone(), s))
        .collect();

    let mut scored: Vec<ScoredCandidate> = offers
        .into_iter()
        .map(|offer| {
            let stats = stats_by_url.get(&offer.product_url);
            let priority = scorer.score(&offer, stats, now, policy);
            ScoredCandidate::new(offer, priority)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(scored)
}

/// Round-robin the ranked list across marketplace sources
///
/// Candidates are grouped into per-source queues in rank order, then
/// drained one source at a time until `count` is reached or every queue
/// is exhausted. Sources rotate in order of their best-ranked candidate.
pub fn diversify_by_source(ranked: Vec<ScoredCandidate>, count: usize) -> Vec<ScoredCandidate> {
    if count == 0 || ranked.is_empty() {
        return Vec::new();
    }

    // Group into queues preserving rank order; source order follows the
    // first appearance of each source in the ranking.
    let mut source_order: Vec<Option<Marketplace>> = Vec::new();
    let mut queues: HashMap<Option<Marketplace>, VecDeque<ScoredCandidate>> = HashMap::new();
    for candidate in ranked {
        let source = candidate.offer.marketplace;
        if !queues.contains_key(&source) {
            source_order.push(source);
        }
        queues.entry(source).or_default().push_back(candidate);
    }

    let mut selected = Vec::with_capacity(count);
    while selected.len() < count {
        let mut drained_any = false;
        for source in &source_order {
            if selected.len() >= count {
                break;
            }
            if let Some(candidate) = queues.get_mut(source).and_then(VecDeque::pop_front) {
                selected.push(candidate);
                drained_any = true;
            }
        }
        if !drained_any {
            break;
        }
    }

    selected
}

/// Drop candidates that already carry a schedule or were published
///
/// The idempotency guard against double-scheduling when the planner runs
/// twice within the same hour.
pub fn filter_unscheduled(ranked: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    ranked
        .into_iter()
        .filter(|c| c.offer.is_available())
        .collect()
}
