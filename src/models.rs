// Core data structures for the sijang scheduling engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace an offer was collected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Amazon,
    Shopee,
    Aliexpress,
    MercadoLivre,
    Magalu,
}

impl Marketplace {
    /// Get all known marketplaces
    pub fn all() -> Vec<Self> {
        vec![
            Self::Amazon,
            Self::Shopee,
            Self::Aliexpress,
            Self::MercadoLivre,
            Self::Magalu,
        ]
    }

    /// Get marketplace ID
    pub fn id(&self) -> &'static str {
        match self {
            Self::Amazon => "amazon",
            Self::Shopee => "shopee",
            Self::Aliexpress => "aliexpress",
            Self::MercadoLivre => "mercadolivre",
            Self::Magalu => "magalu",
        }
    }

    /// Parse from string
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "amazon" => Some(Self::Amazon),
            "shopee" => Some(Self::Shopee),
            "aliexpress" | "ali" => Some(Self::Aliexpress),
            "mercadolivre" | "mercado_livre" | "meli" => Some(Self::MercadoLivre),
            "magalu" | "magazineluiza" => Some(Self::Magalu),
            _ => None,
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A candidate deal collected from a marketplace
///
/// Owned by the external candidate repository; the scheduling core only
/// reads offers and requests scheduled-timestamp updates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Offer {
    /// Offer identifier (repository-assigned)
    pub id: String,

    /// Offer title as shown on the marketplace
    pub title: String,

    /// Offer description text
    pub description: String,

    /// Canonical product URL, the key for historical statistics
    pub product_url: String,

    /// Current price in the tenant's currency
    pub current_price: f64,

    /// Discount percentage (0-100) against the reference price
    pub discount_percent: f64,

    /// Marketplace the offer was collected from
    pub marketplace: Option<Marketplace>,

    /// Category tag assigned by the classifier
    pub category: String,

    /// Publication timestamp allocated by a planning cycle, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,

    /// Whether the offer has already been delivered to channels
    #[serde(default)]
    pub published: bool,
}

impl Offer {
    /// Create a fresh offer with a generated identifier
    ///
    /// Collectors use this when a marketplace item has no stable id yet.
    pub fn new(title: impl Into<String>, product_url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            product_url: product_url.into(),
            ..Default::default()
        }
    }

    /// Check whether this offer already carries a publication slot
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_at.is_some()
    }

    /// Whether the offer may still be picked up by a planning cycle
    pub fn is_available(&self) -> bool {
        !self.published && !self.is_scheduled()
    }

    /// Concatenated text used for keyword matching
    pub fn combined_text(&self) -> String {
        format!("{} {} {}", self.title, self.category, self.description)
    }
}

/// Historical performance statistics keyed by canonical product URL
///
/// All scores are 0-100; lifecycle is owned by the external repository.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OfferStatistics {
    /// Canonical product URL this record belongs to
    pub product_url: String,

    /// Aggregate sales score (0-100)
    pub sales_score: f64,

    /// Popularity score (0-100)
    pub popularity_score: f64,

    /// Peak-hour affinity score (0-100)
    pub peak_hour_score: f64,
}

impl OfferStatistics {
    /// Clamp all scores into the 0-100 range
    ///
    /// Applied at the collaborator boundary so out-of-range values never
    /// reach the scorer.
    pub fn normalized(mut self) -> Self {
        self.sales_score = self.sales_score.clamp(0.0, 100.0);
        self.popularity_score = self.popularity_score.clamp(0.0, 100.0);
        self.peak_hour_score = self.peak_hour_score.clamp(0.0, 100.0);
        self
    }
}

/// An offer paired with its computed priority
///
/// Ephemeral, never persisted; lives only for one planning cycle.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub offer: Offer,
    pub priority: f64,
}

impl ScoredCandidate {
    pub fn new(offer: Offer, priority: f64) -> Self {
        Self { offer, priority }
    }
}

/// Mapping of one offer to one publication timestamp within the hour
///
/// Discarded after the timestamp write is requested from the repository.
#[derive(Debug, Clone)]
pub struct ScheduleAssignment {
    /// Offer receiving the slot
    pub offer_id: String,

    /// Minute offset from "now" inside the current hour
    pub minute_offset: u32,

    /// Absolute target publication time
    pub publish_at: DateTime<Utc>,
}
