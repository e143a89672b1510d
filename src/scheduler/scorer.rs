//! Multi-factor offer prioritization
//!
//! Converts {offer, statistics, current hour, tenant policy} into one
//! scalar priority used purely for relative ranking within one planning
//! cycle. The standard strategy produces scores in [0, 100]; the
//! high-ticket strategy is deliberately unbounded so qualifying expensive
//! items always outrank standard candidates.
//!
//! The peak/off-peak asymmetry implements a "save the best for prime time"
//! distribution: top-tier offers are suppressed during valley hours so
//! they survive until a peak window, while cheap unremarkable items are
//! boosted to clear inventory.

use chrono::{DateTime, Timelike, Utc};

use super::seasonal::SeasonalCalendar;
use crate::config::TenantPolicy;
use crate::models::{Offer, OfferStatistics};

/// Reference minimum discount when the policy leaves it unset
const DEFAULT_DISCOUNT_REFERENCE: f64 = 20.0;

/// Price below which the cheapness score saturates at 100
const CHEAP_PRICE_FLOOR: f64 = 50.0;

/// Price above which the cheapness score reaches 0
const CHEAP_PRICE_CEILING: f64 = 200.0;

/// Component scores above this mark an offer as top tier during off-peak
const TOP_TIER_THRESHOLD: f64 = 70.0;

/// Off-peak suppression factor for top-tier offers
///
/// Tuned by trial in production, kept as a constant rather than policy.
const PRESERVATION_FACTOR: f64 = 0.4;

/// Multi-factor priority scorer
///
/// Pure: no I/O, no clock reads; callers pass "now" explicitly so cycles
/// score from a single consistent instant.
#[derive(Debug, Clone, Default)]
pub struct PriorityScorer {
    calendar: SeasonalCalendar,
}

impl PriorityScorer {
    /// Create a scorer with the default seasonal calendar
    pub fn new() -> Self {
        Self {
            calendar: SeasonalCalendar::new(),
        }
    }

    /// Create a scorer with a custom calendar
    pub fn with_calendar(calendar: SeasonalCalendar) -> Self {
        Self { calendar }
    }

    /// Compute the priority of one offer at one instant
    pub fn score(
        &self,
        offer: &Offer,
        stats: Option<&OfferStatistics>,
        now: DateTime<Utc>,
        policy: &TenantPolicy,
    ) -> f64 {
        let hour = now.hour() as u8;
        let seasonal = self.seasonal_score(offer, now);

        if let Some(ht) = &policy.high_ticket {
            // A price above the ceiling is treated as a likely pricing
            // error and excluded from all selection.
            if offer.current_price > ht.price_ceiling {
                tracing::debug!(
                    offer = %offer.id,
                    price = offer.current_price,
                    ceiling = ht.price_ceiling,
                    "price above high-ticket ceiling, excluding"
                );
                return 0.0;
            }

            if offer.current_price >= ht.min_price && offer.discount_percent >= ht.min_discount {
                let revenue = Self::revenue_score(offer.discount_percent, offer.current_price);
                let sales = Self::sales_score(stats);
                // Unbounded on purpose: any qualifying high-ticket item
                // must dominate every standard-strategy score.
                return revenue + sales * 0.1 + seasonal * 10.0;
            }
            // High-ticket eligible by mode but below a floor this round;
            // fall through to the standard strategy.
        }

        self.standard_score(offer, stats, hour, seasonal, policy)
    }

    /// Standard 0-100 weighted blend
    fn standard_score(
        &self,
        offer: &Offer,
        stats: Option<&OfferStatistics>,
        hour: u8,
        seasonal: f64,
        policy: &TenantPolicy,
    ) -> f64 {
        let sales = Self::sales_score(stats);
        let discount = Self::discount_score(offer, policy);
        let peak = Self::peak_score(policy, hour);
        let price = Self::price_score(offer.current_price);

        let balance = policy.discount_weight_vs_sales as f64;
        let mut sales_weight = (100.0 - balance) / 100.0;
        let mut discount_weight = balance / 100.0;
        let mut peak_weight = 0.1;
        let mut price_weight = 0.1;
        let mut seasonal_weight = 0.05;

        if policy.is_peak_hour(hour) {
            if seasonal >= 100.0 {
                // A strong seasonal match in prime time outweighs the
                // generic peak signal.
                peak_weight = 0.3;
                seasonal_weight = 0.5;
            } else {
                peak_weight = 0.4;
            }
            if policy.favor_best_sellers_in_peak {
                sales_weight *= 2.0;
            }
            if policy.favor_big_discounts_in_peak {
                discount_weight *= 1.5;
            }
            // Expensive purchases are acceptable in prime time
            price_weight = 0.05;
        } else {
            if sales > TOP_TIER_THRESHOLD || discount > TOP_TIER_THRESHOLD {
                // Preservation penalty: suppress top-tier offers so they
                // remain available when a peak window opens.
                return (sales * sales_weight + discount * discount_weight)
                    * PRESERVATION_FACTOR;
            }
            // Valley hours favor cheap, unremarkable items
            price_weight = 0.4;
            sales_weight /= 2.0;
            discount_weight /= 2.0;
        }

        let total_weight =
            sales_weight + discount_weight + peak_weight + price_weight + seasonal_weight;
        let weighted = sales * sales_weight
            + discount * discount_weight
            + peak * peak_weight
            + price * price_weight
            + seasonal * seasonal_weight;

        (weighted / total_weight).clamp(0.0, 100.0)
    }

    /// Peak score: 0 outside peak windows, rank * 10 inside
    pub fn peak_score(policy: &TenantPolicy, hour: u8) -> f64 {
        policy
            .peak_rank_at(hour)
            .map(|rank| rank as f64 * 10.0)
            .unwrap_or(0.0)
    }

    /// Historical sales score, 0 when no statistics exist
    pub fn sales_score(stats: Option<&OfferStatistics>) -> f64 {
        stats.map(|s| s.sales_score.clamp(0.0, 100.0)).unwrap_or(0.0)
    }

    /// Discount normalized against twice the policy's minimum discount
    ///
    /// Doubling the reference means an offer at 2x the minimum saturates
    /// the score.
    pub fn discount_score(offer: &Offer, policy: &TenantPolicy) -> f64 {
        let reference = policy.min_discount.unwrap_or(DEFAULT_DISCOUNT_REFERENCE) * 2.0;
        if reference <= 0.0 {
            return 0.0;
        }
        (offer.discount_percent / reference * 100.0).clamp(0.0, 100.0)
    }

    /// Piecewise-linear cheapness score
    ///
    /// 100 at or below 50 currency units, 0 at or above 200, linear in
    /// between. Used only to favor low-ticket items during off-peak hours.
    pub fn price_score(price: f64) -> f64 {
        if price <= CHEAP_PRICE_FLOOR {
            100.0
        } else if price >= CHEAP_PRICE_CEILING {
            0.0
        } else {
            (CHEAP_PRICE_CEILING - price) / (CHEAP_PRICE_CEILING - CHEAP_PRICE_FLOOR) * 100.0
        }
    }

    /// Binary seasonal score: 100 when an active calendar event's keywords
    /// match the offer text, 0 otherwise
    pub fn seasonal_score(&self, offer: &Offer, now: DateTime<Utc>) -> f64 {
        if self
            .calendar
            .matches(&offer.combined_text(), now.date_naive())
        {
            100.0
        } else {
            0.0
        }
    }

    /// Currency-scaled revenue score, unbounded and price dominated
    ///
    /// Used only by the high-ticket strategy.
    pub fn revenue_score(discount_percent: f64, price: f64) -> f64 {
        discount_percent * 10.0 + price * 100.0
    }
}
