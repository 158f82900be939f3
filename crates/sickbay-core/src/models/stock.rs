//! Stock inventory models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Threshold used when an intake does not specify one.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 20;

/// Quantity on hand for one drug. Names are unique case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockItem {
    /// Unique stock item ID
    pub id: String,
    /// Drug name
    pub name: String,
    /// Category (e.g., "Analgesic")
    pub category: Option<String>,
    /// Units on hand, never negative
    pub quantity: u32,
    /// Unit label (e.g., "tablets")
    pub unit: String,
    /// Price per unit
    pub unit_price: f64,
    /// At or below this quantity the item is low on stock
    pub low_stock_threshold: u32,
    /// Expiry date of the current batch
    pub expiry_date: Option<NaiveDate>,
    /// Supplier name
    pub supplier: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// First intake timestamp
    pub added_at: DateTime<Utc>,
    /// Last quantity or attribute change
    pub updated_at: DateTime<Utc>,
}

/// Stock level classification for dashboards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    /// At or below half the threshold
    Critical,
    Low,
    InStock,
}

impl StockItem {
    /// Create an item from a first intake.
    pub fn new(name: String, quantity: u32, intake: &StockIntake, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            category: intake.category.clone(),
            quantity,
            unit: intake.unit.clone().unwrap_or_else(|| "units".into()),
            unit_price: intake.unit_price.unwrap_or(0.0),
            low_stock_threshold: intake
                .low_stock_threshold
                .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
            expiry_date: intake.expiry_date,
            supplier: intake.supplier.clone(),
            description: intake.description.clone(),
            added_at: now,
            updated_at: now,
        }
    }

    /// Whether the name matches, ignoring case and surrounding whitespace.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    pub fn is_low(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }

    pub fn level(&self) -> StockLevel {
        if self.quantity == 0 {
            StockLevel::OutOfStock
        } else if f64::from(self.quantity) <= f64::from(self.low_stock_threshold) * 0.5 {
            StockLevel::Critical
        } else if self.is_low() {
            StockLevel::Low
        } else {
            StockLevel::InStock
        }
    }

    /// Value of the units on hand.
    pub fn value(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }

    /// Caregiver-facing projection.
    pub fn summary(&self) -> StockSummary {
        StockSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            quantity: self.quantity,
            unit: self.unit.clone(),
            unit_price: self.unit_price,
        }
    }
}

/// Optional attributes supplied with a stock intake.
///
/// For an existing item only a positive price, supplier and expiry date are
/// overlaid; the other fields only apply when the item is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StockIntake {
    pub category: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
    pub low_stock_threshold: Option<u32>,
    pub expiry_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub description: Option<String>,
}

/// What a caregiver sees when picking a drug for a prescription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockSummary {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: f64,
}
