//! Short-TTL policy caching
//!
//! Policy documents change rarely but are read on every planning cycle and
//! by the tenant-facing status endpoints. [`PolicyCache`] keeps per-tenant
//! entries with a bounded TTL; any accepted policy write invalidates both
//! the policy entry and the derived status entry before returning to the
//! caller, so readers never observe a stale pairing.
//!
//! # Example
//!
//! ```rust,ignore
//! use sijang::cache::{CachedConfigStore, PolicyCache};
//!
//! let cache = Arc::new(PolicyCache::new());
//! let store = CachedConfigStore::new(inner, cache.clone());
//! let policy = store.get_active_policy("tenant-1").await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::TenantPolicy;
use crate::storage::{ConfigStore, StorageResult};

/// Default TTL for cached policy documents
pub const DEFAULT_POLICY_TTL: Duration = Duration::from_secs(300);

/// Tenant-facing scheduling status document
///
/// Served by the web layer; updated by the planner after every cycle and
/// invalidated together with the policy entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantStatus {
    /// Whether scheduling is currently active
    pub active: bool,

    /// Configured posts per hour
    pub posts_per_hour: u32,

    /// Offers scheduled by the last cycle
    pub last_scheduled: usize,

    /// Why the last cycle scheduled nothing, if it did
    pub last_skip_reason: Option<String>,

    /// When the last cycle ran
    pub last_run_at: DateTime<Utc>,
}

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

impl<T: Clone> Entry<T> {
    fn fresh(&self, ttl: Duration) -> Option<T> {
        if self.stored_at.elapsed() < ttl {
            Some(self.value.clone())
        } else {
            None
        }
    }
}

/// Per-tenant TTL cache for policies and derived status documents
///
/// One instance is owned per process and shared between the planner and
/// the configuration write path; entries are always keyed by tenant id so
/// cycles for different tenants never share state.
pub struct PolicyCache {
    policies: RwLock<HashMap<String, Entry<TenantPolicy>>>,
    statuses: RwLock<HashMap<String, Entry<TenantStatus>>>,
    ttl: Duration,
}

impl PolicyCache {
    /// Create a cache with the default 5 minute TTL
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_POLICY_TTL)
    }

    /// Create a cache with a custom TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            policies: RwLock::new(HashMap::new()),
            statuses: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a cached policy if present and unexpired
    pub async fn get(&self, tenant_id: &str) -> Option<TenantPolicy> {
        let policies = self.policies.read().await;
        policies.get(tenant_id).and_then(|e| e.fresh(self.ttl))
    }

    /// Store a policy with the configured TTL
    pub async fn set(&self, tenant_id: &str, policy: TenantPolicy) {
        let mut policies = self.policies.write().await;
        policies.insert(
            tenant_id.to_string(),
            Entry {
                value: policy,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop the policy entry and the derived status entry for a tenant
    ///
    /// Forces the next read to bypass the cache.
    pub async fn invalidate(&self, tenant_id: &str) {
        self.policies.write().await.remove(tenant_id);
        self.statuses.write().await.remove(tenant_id);
        tracing::debug!(tenant = %tenant_id, "policy cache invalidated");
    }

    /// Get a cached status document if present and unexpired
    pub async fn status(&self, tenant_id: &str) -> Option<TenantStatus> {
        let statuses = self.statuses.read().await;
        statuses.get(tenant_id).and_then(|e| e.fresh(self.ttl))
    }

    /// Store a status document with the configured TTL
    pub async fn set_status(&self, tenant_id: &str, status: TenantStatus) {
        let mut statuses = self.statuses.write().await;
        statuses.insert(
            tenant_id.to_string(),
            Entry {
                value: status,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of unexpired policy entries (diagnostics)
    pub async fn len(&self) -> usize {
        let policies = self.policies.read().await;
        policies
            .values()
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .count()
    }

    /// Whether the cache holds no unexpired policy entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for PolicyCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-through, write-invalidated wrapper around a [`ConfigStore`]
///
/// Reads consult the cache first and populate it on a miss; writes
/// invalidate the tenant's entries before touching the inner store, so a
/// concurrent reader can at worst re-fetch the fresh document.
pub struct CachedConfigStore<S> {
    inner: S,
    cache: Arc<PolicyCache>,
}

impl<S: ConfigStore> CachedConfigStore<S> {
    pub fn new(inner: S, cache: Arc<PolicyCache>) -> Self {
        Self { inner, cache }
    }

    /// Shared cache handle, for status readers and the planner
    pub fn cache(&self) -> Arc<PolicyCache> {
        self.cache.clone()
    }

    /// Access the wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ConfigStore> ConfigStore for CachedConfigStore<S> {
    async fn get_active_policy(&self, tenant_id: &str) -> StorageResult<Option<TenantPolicy>> {
        if let Some(policy) = self.cache.get(tenant_id).await {
            tracing::debug!(tenant = %tenant_id, "policy cache hit");
            return Ok(Some(policy));
        }

        tracing::debug!(tenant = %tenant_id, "policy cache miss");
        let policy = self.inner.get_active_policy(tenant_id).await?;
        if let Some(ref p) = policy {
            self.cache.set(tenant_id, p.clone()).await;
        }
        Ok(policy)
    }

    async fn save_policy(&self, policy: TenantPolicy) -> StorageResult<()> {
        let tenant_id = policy.tenant_id.clone();
        self.cache.invalidate(&tenant_id).await;
        self.inner.save_policy(policy).await
    }

    async fn on_policy_changed(&self, tenant_id: &str) -> StorageResult<()> {
        self.cache.invalidate(tenant_id).await;
        self.inner.on_policy_changed(tenant_id).await
    }
}
