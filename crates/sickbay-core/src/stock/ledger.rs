//! Stock decrement, intake and availability.

use crate::clock::Clock;
use crate::db::StockStore;
use crate::models::{StockIntake, StockItem, StockSummary};
use crate::notify::{Notification, NotificationSink};

use super::{StockError, StockResult};

/// Result of a successful decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecrement {
    pub item_id: String,
    pub previous: u32,
    pub remaining: u32,
    /// This decrement took the item from above its threshold to at or below it.
    pub crossed_low_threshold: bool,
}

/// Stock snapshot of items with a positive quantity.
///
/// Iterating projects each item to a [`StockSummary`] lazily; iterate as many
/// times as needed.
#[derive(Debug, Clone)]
pub struct AvailableDrugs {
    items: Vec<StockItem>,
}

impl AvailableDrugs {
    pub fn iter(&self) -> <&Self as IntoIterator>::IntoIter {
        self.into_iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a AvailableDrugs {
    type Item = StockSummary;
    type IntoIter =
        std::iter::Map<std::slice::Iter<'a, StockItem>, fn(&StockItem) -> StockSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.items
            .iter()
            .map(StockItem::summary as fn(&StockItem) -> StockSummary)
    }
}

/// Stock bookkeeping over a [`StockStore`].
pub struct StockLedger<'a, S> {
    store: &'a S,
    clock: &'a dyn Clock,
    sink: &'a dyn NotificationSink,
}

impl<'a, S: StockStore> StockLedger<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock, sink: &'a dyn NotificationSink) -> Self {
        Self { store, clock, sink }
    }

    /// Remove `amount` units of a drug.
    ///
    /// Rejected without any change if the drug is unknown or fewer than
    /// `amount` units are on hand. Raises a low-stock notification only on the
    /// decrement that first brings the quantity to or below the threshold.
    pub fn decrement(&self, drug_name: &str, amount: u32) -> StockResult<StockDecrement> {
        if amount == 0 {
            return Err(StockError::InvalidAmount);
        }

        let item = self
            .store
            .find_stock_by_name(drug_name)?
            .ok_or_else(|| StockError::NotFound(drug_name.to_string()))?;

        if item.quantity < amount {
            return Err(self.insufficient(item.name, item.quantity, amount));
        }
        if !self
            .store
            .decrement_stock(&item.id, amount, self.clock.now_utc())?
        {
            // Lost a race with another decrement; report what is left now
            let available = self
                .store
                .find_stock_by_name(&item.name)?
                .map_or(0, |current| current.quantity);
            return Err(self.insufficient(item.name, available, amount));
        }

        let remaining = item.quantity - amount;
        let crossed_low_threshold =
            item.quantity > item.low_stock_threshold && remaining <= item.low_stock_threshold;
        if crossed_low_threshold {
            tracing::warn!(drug = %item.name, remaining, threshold = item.low_stock_threshold, "Stock is running low");
            self.sink.notify(Notification::low_stock(&item, remaining));
        }

        Ok(StockDecrement {
            item_id: item.id,
            previous: item.quantity,
            remaining,
            crossed_low_threshold,
        })
    }

    /// Add `amount` units of a drug, creating the item on first intake.
    ///
    /// A top-up that would push the quantity past `u32::MAX` is rejected as
    /// [`StockError::InvalidAmount`] and leaves the item untouched.
    pub fn intake(&self, drug_name: &str, amount: u32, attrs: &StockIntake) -> StockResult<StockItem> {
        let name = drug_name.trim();
        if name.is_empty() {
            return Err(StockError::MissingName);
        }
        if amount == 0 {
            return Err(StockError::InvalidAmount);
        }

        let now = self.clock.now_utc();
        match self.store.find_stock_by_name(name)? {
            Some(existing) => {
                if existing.quantity.checked_add(amount).is_none()
                    || !self.store.increment_stock(&existing.id, amount, attrs, now)?
                {
                    return Err(StockError::InvalidAmount);
                }
                tracing::info!(drug = %existing.name, added = amount, "Stock topped up");
            }
            None => {
                let item = StockItem::new(name.to_string(), amount, attrs, now);
                self.store.insert_stock_item(&item)?;
                tracing::info!(drug = %item.name, quantity = amount, "Stock item created");
            }
        }

        self.store
            .find_stock_by_name(name)?
            .ok_or_else(|| StockError::NotFound(name.to_string()))
    }

    /// Items with a positive quantity.
    pub fn available_drugs(&self) -> StockResult<AvailableDrugs> {
        Ok(AvailableDrugs {
            items: self.store.list_stock_in_hand()?,
        })
    }

    fn insufficient(&self, name: String, available: u32, requested: u32) -> StockError {
        self.sink
            .notify(Notification::insufficient_stock(&name, available));
        StockError::Insufficient {
            name,
            available,
            requested,
        }
    }
}
