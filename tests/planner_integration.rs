//! Integration tests for the hourly planning pipeline
//!
//! These tests verify the complete workflow of:
//! - Policy gating (posting windows, pause/resume)
//! - Candidate ranking with the cached config store in front
//! - Chunked minute allocation and idempotent re-invocation
//! - Tenant isolation across concurrent cycles

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sijang::cache::{CachedConfigStore, PolicyCache};
use sijang::config::{PeakWindow, TenantPolicy};
use sijang::models::{Marketplace, Offer, OfferStatistics};
use sijang::scheduler::{HourlyPlanner, SeededMinutes, SkipReason};
use sijang::storage::{ConfigStore, InMemoryCandidateRepository, InMemoryConfigStore};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("sijang=debug")
        .with_test_writer()
        .try_init();
}

fn offer(id: &str, source: Marketplace, price: f64, discount: f64) -> Offer {
    Offer {
        id: id.into(),
        title: format!("Offer {id}"),
        description: "oferta do dia".into(),
        product_url: format!("https://example.com/p/{id}"),
        current_price: price,
        discount_percent: discount,
        marketplace: Some(source),
        category: "tools".into(),
        ..Default::default()
    }
}

fn stats(url: &str, sales: f64) -> OfferStatistics {
    OfferStatistics {
        product_url: url.into(),
        sales_score: sales,
        popularity_score: sales,
        peak_hour_score: sales,
    }
}

fn daytime_policy(tenant: &str, posts_per_hour: u32) -> TenantPolicy {
    let mut policy = TenantPolicy::new(tenant);
    policy.start_hour = 9;
    policy.end_hour = 21;
    policy.posts_per_hour = posts_per_hour;
    policy.peak_windows = vec![PeakWindow {
        name: "evening".into(),
        start_hour: 18,
        end_hour: 22,
        priority: 8,
    }];
    policy
}

fn nine_oclock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap()
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[tokio::test]
async fn test_end_to_end_hourly_cycle() {
    init_tracing();

    let store = Arc::new(InMemoryConfigStore::new());
    store.insert(daytime_policy("t1", 5));

    let repo = Arc::new(InMemoryCandidateRepository::new());
    for i in 0..10 {
        let id = format!("o{i}");
        repo.insert_offer("t1", offer(&id, Marketplace::Amazon, 120.0, 30.0));
        repo.insert_statistics(stats(&format!("https://example.com/p/{id}"), 40.0));
    }

    let planner = HourlyPlanner::new(store, repo.clone())
        .with_minute_source(Box::new(SeededMinutes::new(11)));

    // 09:00 leaves 59 minutes; exactly posts_per_hour offers get slots
    let outcome = planner.plan_hour("t1", nine_oclock()).await.unwrap();
    assert_eq!(outcome.scheduled, 5);

    let mut offsets: Vec<u32> = outcome.assignments.iter().map(|a| a.minute_offset).collect();
    assert!(offsets.iter().all(|&m| (1..=59).contains(&m)));
    offsets.sort_unstable();
    offsets.dedup();
    assert_eq!(offsets.len(), 5, "minute offsets must be distinct");

    // Every persisted timestamp lands inside the current hour
    for assignment in &outcome.assignments {
        assert!(assignment.publish_at > nine_oclock());
        assert!(assignment.publish_at <= nine_oclock() + chrono::Duration::minutes(59));
    }

    // Repeat call in the same minute must not re-select scheduled offers
    let repeat = planner.plan_hour("t1", nine_oclock()).await.unwrap();
    assert_eq!(repeat.scheduled, 5, "five unscheduled candidates remain");
    let scheduled_ids: Vec<_> = outcome.assignments.iter().map(|a| &a.offer_id).collect();
    for assignment in &repeat.assignments {
        assert!(!scheduled_ids.contains(&&assignment.offer_id));
    }

    // Third call finds an empty pool
    let third = planner.plan_hour("t1", nine_oclock()).await.unwrap();
    assert_eq!(third.scheduled, 0);
    assert_eq!(third.skip_reason, Some(SkipReason::NoCandidates));
}

#[tokio::test]
async fn test_source_diversification_across_marketplaces() {
    let store = Arc::new(InMemoryConfigStore::new());
    store.insert(daytime_policy("t1", 4));

    let repo = Arc::new(InMemoryCandidateRepository::new());
    // Amazon offers score highest but must not take every slot
    for i in 0..4 {
        let id = format!("a{i}");
        repo.insert_offer("t1", offer(&id, Marketplace::Amazon, 45.0, 35.0));
        repo.insert_statistics(stats(&format!("https://example.com/p/{id}"), 60.0));
    }
    repo.insert_offer("t1", offer("s1", Marketplace::Shopee, 150.0, 22.0));
    repo.insert_offer("t1", offer("m1", Marketplace::Magalu, 150.0, 22.0));

    let planner = HourlyPlanner::new(store, repo)
        .with_minute_source(Box::new(SeededMinutes::new(3)));

    let outcome = planner.plan_hour("t1", nine_oclock()).await.unwrap();
    assert_eq!(outcome.scheduled, 4);

    let ids: Vec<_> = outcome.assignments.iter().map(|a| a.offer_id.as_str()).collect();
    assert!(ids.contains(&"s1"), "shopee candidate must get a slot: {ids:?}");
    assert!(ids.contains(&"m1"), "magalu candidate must get a slot: {ids:?}");
}

// ============================================================================
// Cached config store in front of the planner
// ============================================================================

#[tokio::test]
async fn test_planner_with_cached_config_store() {
    let inner = InMemoryConfigStore::new();
    inner.insert(daytime_policy("t1", 2));

    let cache = Arc::new(PolicyCache::new());
    let config = Arc::new(CachedConfigStore::new(inner, cache.clone()));

    let repo = Arc::new(InMemoryCandidateRepository::new());
    for i in 0..4 {
        repo.insert_offer("t1", offer(&format!("o{i}"), Marketplace::Amazon, 120.0, 30.0));
    }

    let planner = HourlyPlanner::new(config.clone(), repo)
        .with_minute_source(Box::new(SeededMinutes::new(5)))
        .with_status_cache(cache.clone());

    let outcome = planner.plan_hour("t1", nine_oclock()).await.unwrap();
    assert_eq!(outcome.scheduled, 2);

    // The cycle populated both cache entries
    assert!(cache.get("t1").await.is_some());
    let status = cache.status("t1").await.unwrap();
    assert_eq!(status.last_scheduled, 2);

    // A policy write invalidates both before returning
    let mut updated = daytime_policy("t1", 9);
    updated.active = true;
    config.save_policy(updated).await.unwrap();
    assert!(cache.get("t1").await.is_none());
    assert!(cache.status("t1").await.is_none());
}

// ============================================================================
// Posting windows
// ============================================================================

#[tokio::test]
async fn test_overnight_window_schedules_after_midnight() {
    let store = Arc::new(InMemoryConfigStore::new());
    let mut policy = daytime_policy("t1", 2);
    policy.start_hour = 20;
    policy.end_hour = 2;
    store.insert(policy);

    let repo = Arc::new(InMemoryCandidateRepository::new());
    repo.insert_offer("t1", offer("o1", Marketplace::Amazon, 120.0, 30.0));
    repo.insert_offer("t1", offer("o2", Marketplace::Shopee, 120.0, 30.0));

    let planner = HourlyPlanner::new(store, repo)
        .with_minute_source(Box::new(SeededMinutes::new(2)));

    // 01:00 falls inside the 20-2 overnight window
    let one_am = Utc.with_ymd_and_hms(2025, 6, 10, 1, 0, 0).unwrap();
    let outcome = planner.plan_hour("t1", one_am).await.unwrap();
    assert_eq!(outcome.scheduled, 2);

    // 10:00 falls outside
    let ten_am = Utc.with_ymd_and_hms(2025, 6, 10, 10, 0, 0).unwrap();
    let outcome = planner.plan_hour("t1", ten_am).await.unwrap();
    assert_eq!(outcome.skip_reason, Some(SkipReason::OutsideWindow));
}

// ============================================================================
// Tenant isolation
// ============================================================================

#[tokio::test]
async fn test_concurrent_cycles_are_tenant_isolated() {
    let store = Arc::new(InMemoryConfigStore::new());
    let repo = Arc::new(InMemoryCandidateRepository::new());

    for tenant in ["t1", "t2", "t3"] {
        store.insert(daytime_policy(tenant, 3));
        for i in 0..5 {
            let id = format!("{tenant}-o{i}");
            repo.insert_offer(tenant, offer(&id, Marketplace::Amazon, 120.0, 30.0));
        }
    }

    let planner = HourlyPlanner::new(store, repo.clone())
        .with_minute_source(Box::new(SeededMinutes::new(17)));

    let tenants: Vec<String> = ["t1", "t2", "t3"].iter().map(|t| t.to_string()).collect();
    let results = planner.plan_many(&tenants, nine_oclock()).await;

    assert_eq!(results.len(), 3);
    for (tenant, result) in results {
        let outcome = result.unwrap();
        assert_eq!(outcome.scheduled, 3, "tenant {tenant} cycle");
        // Every assignment belongs to the tenant's own pool
        for assignment in &outcome.assignments {
            assert!(assignment.offer_id.starts_with(&tenant));
        }
    }
}

// ============================================================================
// Pause / resume control path
// ============================================================================

#[tokio::test]
async fn test_pause_resume_full_path() {
    let inner = InMemoryConfigStore::new();
    inner.insert(daytime_policy("t1", 3));

    let cache = Arc::new(PolicyCache::new());
    let config = Arc::new(CachedConfigStore::new(inner, cache.clone()));

    let repo = Arc::new(InMemoryCandidateRepository::new());
    for i in 0..3 {
        repo.insert_offer("t1", offer(&format!("o{i}"), Marketplace::Amazon, 120.0, 30.0));
    }

    let planner = HourlyPlanner::new(config.clone(), repo.clone())
        .with_minute_source(Box::new(SeededMinutes::new(23)));

    planner.plan_hour("t1", nine_oclock()).await.unwrap();
    assert!(repo.offers_for("t1").iter().any(|o| o.is_scheduled()));

    // Pause clears pending assignments and deactivates the policy
    planner.pause("t1").await.unwrap();
    assert!(repo.offers_for("t1").iter().all(|o| !o.is_scheduled()));

    let outcome = planner.plan_hour("t1", nine_oclock()).await.unwrap();
    assert_eq!(outcome.skip_reason, Some(SkipReason::Inactive));

    // Resume restores scheduling
    planner.resume("t1").await.unwrap();
    let outcome = planner.plan_hour("t1", nine_oclock()).await.unwrap();
    assert_eq!(outcome.scheduled, 3);

    // The change hook fired once per pause/resume
    assert_eq!(config.inner().change_notifications().len(), 2);
}
