//! Repository traits and in-memory implementations
//!
//! Trait-based abstractions decouple the planning cycle from the stores
//! that own offers, statistics, and policy documents:
//! - Easy testing with the in-memory implementations below
//! - Swappable backends (SQL, document store, remote API)
//!
//! The planner only ever sees these traits; persistence shapes belong to
//! the implementations.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{StorageError, StorageResult};
use crate::config::{CandidateFilters, TenantPolicy};
use crate::models::{Offer, OfferStatistics};

// ============================================================================
// Traits
// ============================================================================

/// Store of per-tenant scheduling policy documents
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch the policy for a tenant, or None if the tenant has none
    async fn get_active_policy(&self, tenant_id: &str) -> StorageResult<Option<TenantPolicy>>;

    /// Persist a policy document, validating it at the boundary
    async fn save_policy(&self, policy: TenantPolicy) -> StorageResult<()>;

    /// Notification hook invoked after an accepted pause/unpause so
    /// downstream schedulers can clear stale assignments
    async fn on_policy_changed(&self, tenant_id: &str) -> StorageResult<()>;
}

/// Store of candidate offers and their historical statistics
#[async_trait]
pub trait CandidateRepository: Send + Sync {
    /// Filtered, bounded candidate lookup for one tenant
    async fn find_candidates(
        &self,
        tenant_id: &str,
        filters: &CandidateFilters,
        limit: usize,
    ) -> StorageResult<Vec<Offer>>;

    /// Batch statistics lookup keyed by canonical product URL
    async fn find_statistics(
        &self,
        product_urls: &[String],
    ) -> StorageResult<Vec<OfferStatistics>>;

    /// Persist a publication timestamp on one offer
    async fn set_scheduled_timestamp(
        &self,
        offer_id: &str,
        publish_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Clear pending (not yet published) schedules for a tenant
    ///
    /// Returns the number of offers whose timestamps were cleared.
    async fn clear_schedule(&self, tenant_id: &str) -> StorageResult<u64>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// In-memory policy store for tests and reference adapters
#[derive(Default)]
pub struct InMemoryConfigStore {
    policies: RwLock<HashMap<String, TenantPolicy>>,
    change_notifications: RwLock<Vec<String>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a policy without boundary validation (test helper)
    pub fn insert(&self, policy: TenantPolicy) {
        self.policies
            .write()
            .expect("policy lock poisoned")
            .insert(policy.tenant_id.clone(), policy);
    }

    /// Tenants for which `on_policy_changed` fired, in order
    pub fn change_notifications(&self) -> Vec<String> {
        self.change_notifications
            .read()
            .expect("notification lock poisoned")
            .clone()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get_active_policy(&self, tenant_id: &str) -> StorageResult<Option<TenantPolicy>> {
        Ok(self
            .policies
            .read()
            .expect("policy lock poisoned")
            .get(tenant_id)
            .cloned())
    }

    async fn save_policy(&self, policy: TenantPolicy) -> StorageResult<()> {
        policy.validate()?;
        self.policies
            .write()
            .expect("policy lock poisoned")
            .insert(policy.tenant_id.clone(), policy);
        Ok(())
    }

    async fn on_policy_changed(&self, tenant_id: &str) -> StorageResult<()> {
        self.change_notifications
            .write()
            .expect("notification lock poisoned")
            .push(tenant_id.to_string());
        Ok(())
    }
}

/// In-memory candidate repository for tests and reference adapters
///
/// Offers are stored per tenant; a configurable failure set simulates
/// per-offer write errors for best-effort persistence tests.
#[derive(Default)]
pub struct InMemoryCandidateRepository {
    offers: RwLock<HashMap<String, Vec<Offer>>>,
    statistics: RwLock<HashMap<String, OfferStatistics>>,
    failing_offers: RwLock<std::collections::HashSet<String>>,
}

impl InMemoryCandidateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an offer to a tenant's candidate pool
    pub fn insert_offer(&self, tenant_id: &str, offer: Offer) {
        self.offers
            .write()
            .expect("offer lock poisoned")
            .entry(tenant_id.to_string())
            .or_default()
            .push(offer);
    }

    /// Add a statistics record
    pub fn insert_statistics(&self, stats: OfferStatistics) {
        self.statistics
            .write()
            .expect("statistics lock poisoned")
            .insert(stats.product_url.clone(), stats);
    }

    /// Make timestamp writes fail for one offer (test helper)
    pub fn fail_writes_for(&self, offer_id: &str) {
        self.failing_offers
            .write()
            .expect("failure lock poisoned")
            .insert(offer_id.to_string());
    }

    /// Snapshot a tenant's offers (test helper)
    pub fn offers_for(&self, tenant_id: &str) -> Vec<Offer> {
        self.offers
            .read()
            .expect("offer lock poisoned")
            .get(tenant_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CandidateRepository for InMemoryCandidateRepository {
    async fn find_candidates(
        &self,
        tenant_id: &str,
        filters: &CandidateFilters,
        limit: usize,
    ) -> StorageResult<Vec<Offer>> {
        let offers = self.offers.read().expect("offer lock poisoned");
        Ok(offers
            .get(tenant_id)
            .map(|pool| {
                pool.iter()
                    .filter(|o| !o.published && filters.accepts(o))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_statistics(
        &self,
        product_urls: &[String],
    ) -> StorageResult<Vec<OfferStatistics>> {
        let stats = self.statistics.read().expect("statistics lock poisoned");
        Ok(product_urls
            .iter()
            .filter_map(|url| stats.get(url).cloned())
            .map(OfferStatistics::normalized)
            .collect())
    }

    async fn set_scheduled_timestamp(
        &self,
        offer_id: &str,
        publish_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        if self
            .failing_offers
            .read()
            .expect("failure lock poisoned")
            .contains(offer_id)
        {
            return Err(StorageError::write_failed(offer_id, "simulated failure"));
        }

        let mut offers = self.offers.write().expect("offer lock poisoned");
        for pool in offers.values_mut() {
            if let Some(offer) = pool.iter_mut().find(|o| o.id == offer_id) {
                offer.scheduled_at = Some(publish_at);
                return Ok(());
            }
        }
        Err(StorageError::write_failed(offer_id, "offer not found"))
    }

    async fn clear_schedule(&self, tenant_id: &str) -> StorageResult<u64> {
        let mut offers = self.offers.write().expect("offer lock poisoned");
        let mut cleared = 0;
        if let Some(pool) = offers.get_mut(tenant_id) {
            for offer in pool.iter_mut() {
                if offer.scheduled_at.is_some() && !offer.published {
                    offer.scheduled_at = None;
                    cleared += 1;
                }
            }
        }
        Ok(cleared)
    }
}
