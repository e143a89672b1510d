//! Tenant scheduling policy
//!
//! One policy document per tenant, mutated only through the external
//! configuration API. The scheduling core treats a policy as immutable
//! input for the duration of one planning cycle and reads it through the
//! short-TTL [`crate::cache::PolicyCache`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Marketplace;

/// Result type for policy validation
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Policy validation errors
///
/// Raised at the collaborator boundary so malformed documents never reach
/// the scorer or the planner.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid hour '{hour}' in field '{field}', must be 0-23")]
    InvalidHour { field: String, hour: u32 },

    #[error("invalid peak priority '{priority}' for window '{name}', must be 1-10")]
    InvalidPeakPriority { name: String, priority: u8 },

    #[error("invalid discount weight '{weight}', must be 0-100")]
    InvalidWeight { weight: u8 },

    #[error("invalid high-ticket bounds: {reason}")]
    InvalidHighTicket { reason: String },
}

/// Wraparound-aware hour containment
///
/// `start <= end` is a plain half-open interval; `start > end` wraps past
/// midnight (e.g. 22-2 covers 22, 23, 0, 1).
pub fn hour_in_window(start: u8, end: u8, hour: u8) -> bool {
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

/// A named peak-engagement window with a 1-10 priority rank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakWindow {
    /// Human-readable window name (e.g. "lunch", "prime-time")
    pub name: String,

    /// Window start hour (0-23)
    pub start_hour: u8,

    /// Window end hour, exclusive; may be below start for overnight windows
    pub end_hour: u8,

    /// Priority rank 1-10; contributes rank * 10 to the peak score
    pub priority: u8,
}

impl PeakWindow {
    /// Check whether an hour falls inside this window
    pub fn contains(&self, hour: u8) -> bool {
        hour_in_window(self.start_hour, self.end_hour, hour)
    }
}

/// High-ticket mode settings
///
/// When present and an offer clears both floors, the scorer switches to the
/// revenue strategy; prices above the ceiling are treated as pricing errors
/// and excluded outright.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighTicketPolicy {
    /// Prices above this are treated as likely pricing errors (score 0)
    pub price_ceiling: f64,

    /// Minimum price for an offer to qualify as high-ticket
    pub min_price: f64,

    /// Minimum discount percentage for an offer to qualify
    pub min_discount: f64,
}

/// Repository-side filters derived from a tenant policy
///
/// Handed to the candidate repository so it can pre-filter; the scorer
/// still re-checks discount bounds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateFilters {
    /// Enabled marketplaces; empty means all
    pub marketplaces: Vec<Marketplace>,

    /// Enabled category tags; empty means all
    pub categories: Vec<String>,

    /// Minimum discount percentage
    pub min_discount: Option<f64>,

    /// Maximum price
    pub max_price: Option<f64>,
}

impl CandidateFilters {
    /// Check whether an offer passes these filters
    pub fn accepts(&self, offer: &crate::models::Offer) -> bool {
        if !self.marketplaces.is_empty() {
            match offer.marketplace {
                Some(mp) if self.marketplaces.contains(&mp) => {}
                _ => return false,
            }
        }
        if !self.categories.is_empty() && !self.categories.contains(&offer.category) {
            return false;
        }
        if let Some(min) = self.min_discount {
            if offer.discount_percent < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if offer.current_price > max {
                return false;
            }
        }
        true
    }
}

/// Per-tenant scheduling policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantPolicy {
    /// Tenant this policy belongs to
    pub tenant_id: String,

    /// Whether scheduling is active for this tenant
    pub active: bool,

    /// Posting window start hour (0-23)
    pub start_hour: u8,

    /// Posting window end hour, exclusive; below start wraps past midnight
    pub end_hour: u8,

    /// Desired posts per hour; 0 disables hourly planning
    pub posts_per_hour: u32,

    /// Enabled marketplaces; empty means all
    #[serde(default)]
    pub marketplaces: Vec<Marketplace>,

    /// Enabled categories; empty means all
    #[serde(default)]
    pub categories: Vec<String>,

    /// Minimum discount percentage filter
    #[serde(default)]
    pub min_discount: Option<f64>,

    /// Maximum price filter
    #[serde(default)]
    pub max_price: Option<f64>,

    /// Double the sales weight during peak hours
    #[serde(default)]
    pub favor_best_sellers_in_peak: bool,

    /// Boost the discount weight during peak hours
    #[serde(default)]
    pub favor_big_discounts_in_peak: bool,

    /// 0-100 balance between discount importance (100) and sales history (0)
    pub discount_weight_vs_sales: u8,

    /// Named peak-hour windows
    #[serde(default)]
    pub peak_windows: Vec<PeakWindow>,

    /// Optional high-ticket scoring mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_ticket: Option<HighTicketPolicy>,
}

impl TenantPolicy {
    /// Create a minimal active policy with sane defaults
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            active: true,
            start_hour: 8,
            end_hour: 22,
            posts_per_hour: 3,
            marketplaces: Vec::new(),
            categories: Vec::new(),
            min_discount: None,
            max_price: None,
            favor_best_sellers_in_peak: false,
            favor_big_discounts_in_peak: false,
            discount_weight_vs_sales: 50,
            peak_windows: Vec::new(),
            high_ticket: None,
        }
    }

    /// Whether the tenant's posting window covers the given hour
    pub fn should_post_at(&self, hour: u8) -> bool {
        hour_in_window(self.start_hour, self.end_hour, hour)
    }

    /// Highest priority rank among peak windows covering the hour
    pub fn peak_rank_at(&self, hour: u8) -> Option<u8> {
        self.peak_windows
            .iter()
            .filter(|w| w.contains(hour))
            .map(|w| w.priority)
            .max()
    }

    /// Whether the given hour falls inside any peak window
    pub fn is_peak_hour(&self, hour: u8) -> bool {
        self.peak_rank_at(hour).is_some()
    }

    /// Build repository filters from this policy
    pub fn filters(&self) -> CandidateFilters {
        CandidateFilters {
            marketplaces: self.marketplaces.clone(),
            categories: self.categories.clone(),
            min_discount: self.min_discount,
            max_price: self.max_price,
        }
    }

    /// Validate field ranges
    pub fn validate(&self) -> PolicyResult<()> {
        if self.start_hour > 23 {
            return Err(PolicyError::InvalidHour {
                field: "start_hour".into(),
                hour: self.start_hour as u32,
            });
        }
        if self.end_hour > 23 {
            return Err(PolicyError::InvalidHour {
                field: "end_hour".into(),
                hour: self.end_hour as u32,
            });
        }
        if self.discount_weight_vs_sales > 100 {
            return Err(PolicyError::InvalidWeight {
                weight: self.discount_weight_vs_sales,
            });
        }
        for window in &self.peak_windows {
            if window.start_hour > 23 {
                return Err(PolicyError::InvalidHour {
                    field: format!("peak_windows.{}.start_hour", window.name),
                    hour: window.start_hour as u32,
                });
            }
            if window.end_hour > 23 {
                return Err(PolicyError::InvalidHour {
                    field: format!("peak_windows.{}.end_hour", window.name),
                    hour: window.end_hour as u32,
                });
            }
            if window.priority == 0 || window.priority > 10 {
                return Err(PolicyError::InvalidPeakPriority {
                    name: window.name.clone(),
                    priority: window.priority,
                });
            }
        }
        if let Some(ht) = &self.high_ticket {
            if ht.min_price > ht.price_ceiling {
                return Err(PolicyError::InvalidHighTicket {
                    reason: format!(
                        "min_price {} exceeds price_ceiling {}",
                        ht.min_price, ht.price_ceiling
                    ),
                });
            }
            if ht.price_ceiling <= 0.0 {
                return Err(PolicyError::InvalidHighTicket {
                    reason: "price_ceiling must be positive".into(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_policy() -> TenantPolicy {
        TenantPolicy::new("tenant-1")
    }

    #[test]
    fn test_hour_in_window_plain() {
        // 9..21 half-open interval
        assert!(!hour_in_window(9, 21, 8));
        assert!(hour_in_window(9, 21, 9));
        assert!(hour_in_window(9, 21, 20));
        assert!(!hour_in_window(9, 21, 21));
    }

    #[test]
    fn test_hour_in_window_overnight() {
        // start=20, end=2 wraps past midnight
        assert!(hour_in_window(20, 2, 22));
        assert!(hour_in_window(20, 2, 1));
        assert!(hour_in_window(20, 2, 20));
        assert!(!hour_in_window(20, 2, 2));
        assert!(!hour_in_window(20, 2, 10));
    }

    #[test]
    fn test_should_post_at_overnight_policy() {
        let mut policy = base_policy();
        policy.start_hour = 20;
        policy.end_hour = 2;

        assert!(policy.should_post_at(22));
        assert!(policy.should_post_at(1));
        assert!(!policy.should_post_at(10));
    }

    #[test]
    fn test_peak_rank_picks_highest_match() {
        let mut policy = base_policy();
        policy.peak_windows = vec![
            PeakWindow {
                name: "lunch".into(),
                start_hour: 11,
                end_hour: 14,
                priority: 5,
            },
            PeakWindow {
                name: "noon-flash".into(),
                start_hour: 12,
                end_hour: 13,
                priority: 9,
            },
        ];

        assert_eq!(policy.peak_rank_at(11), Some(5));
        assert_eq!(policy.peak_rank_at(12), Some(9));
        assert_eq!(policy.peak_rank_at(15), None);
        assert!(policy.is_peak_hour(13));
        assert!(!policy.is_peak_hour(14));
    }

    #[test]
    fn test_peak_window_overnight() {
        let window = PeakWindow {
            name: "late-night".into(),
            start_hour: 22,
            end_hour: 2,
            priority: 7,
        };
        assert!(window.contains(23));
        assert!(window.contains(0));
        assert!(!window.contains(2));
        assert!(!window.contains(12));
    }

    #[test]
    fn test_filters_accepts() {
        use crate::models::{Marketplace, Offer};

        let filters = CandidateFilters {
            marketplaces: vec![Marketplace::Amazon],
            categories: vec!["games".into()],
            min_discount: Some(20.0),
            max_price: Some(500.0),
        };

        let mut offer = Offer {
            marketplace: Some(Marketplace::Amazon),
            category: "games".into(),
            discount_percent: 30.0,
            current_price: 250.0,
            ..Default::default()
        };
        assert!(filters.accepts(&offer));

        offer.discount_percent = 10.0;
        assert!(!filters.accepts(&offer));

        offer.discount_percent = 30.0;
        offer.current_price = 900.0;
        assert!(!filters.accepts(&offer));

        offer.current_price = 250.0;
        offer.marketplace = Some(Marketplace::Shopee);
        assert!(!filters.accepts(&offer));

        offer.marketplace = None;
        assert!(!filters.accepts(&offer));
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let mut policy = base_policy();
        policy.start_hour = 24;
        assert!(policy.validate().is_err());

        let mut policy = base_policy();
        policy.peak_windows = vec![PeakWindow {
            name: "bad".into(),
            start_hour: 10,
            end_hour: 12,
            priority: 11,
        }];
        assert!(policy.validate().is_err());

        let mut policy = base_policy();
        policy.high_ticket = Some(HighTicketPolicy {
            price_ceiling: 100.0,
            min_price: 500.0,
            min_discount: 10.0,
        });
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_default() {
        assert!(base_policy().validate().is_ok());
    }

    #[test]
    fn test_policy_json_roundtrip() {
        let mut policy = base_policy();
        policy.peak_windows.push(PeakWindow {
            name: "evening".into(),
            start_hour: 18,
            end_hour: 22,
            priority: 8,
        });

        let json = serde_json::to_string(&policy).unwrap();
        let parsed: TenantPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tenant_id, "tenant-1");
        assert_eq!(parsed.peak_windows.len(), 1);
    }
}
