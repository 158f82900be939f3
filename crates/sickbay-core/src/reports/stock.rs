//! Stock reports.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::StockItem;

/// Inventory totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockStatistics {
    pub item_count: u32,
    pub total_units: u64,
    pub low_stock_count: u32,
    /// Sum of quantity times unit price
    pub total_value: f64,
}

impl StockStatistics {
    pub fn from_items(items: &[StockItem]) -> Self {
        Self {
            item_count: items.len() as u32,
            total_units: items.iter().map(|i| u64::from(i.quantity)).sum(),
            low_stock_count: items.iter().filter(|i| i.is_low()).count() as u32,
            total_value: items.iter().map(StockItem::value).sum(),
        }
    }
}

pub fn stock_statistics(db: &Database) -> DbResult<StockStatistics> {
    Ok(StockStatistics::from_items(&db.list_stock_items()?))
}

/// Items at or below their threshold, lowest quantity first.
pub fn low_stock_alerts(db: &Database) -> DbResult<Vec<StockItem>> {
    let mut low: Vec<_> = db
        .list_stock_items()?
        .into_iter()
        .filter(StockItem::is_low)
        .collect();
    low.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));
    Ok(low)
}

/// Items expiring between `today` and `within_days` from it, inclusive,
/// soonest first. Already expired items are left out.
pub fn expiring_stock(db: &Database, today: NaiveDate, within_days: u32) -> DbResult<Vec<StockItem>> {
    let horizon = today
        .checked_add_days(Days::new(u64::from(within_days)))
        .unwrap_or(NaiveDate::MAX);

    let mut expiring: Vec<_> = db
        .list_stock_items()?
        .into_iter()
        .filter(|item| {
            item.expiry_date
                .is_some_and(|expiry| expiry >= today && expiry <= horizon)
        })
        .collect();
    expiring.sort_by_key(|item| item.expiry_date);
    Ok(expiring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StockStore;
    use crate::models::StockIntake;
    use chrono::Utc;

    fn add(db: &Database, name: &str, quantity: u32, price: f64, expiry: Option<NaiveDate>) {
        let intake = StockIntake {
            unit_price: Some(price),
            low_stock_threshold: Some(10),
            expiry_date: expiry,
            ..Default::default()
        };
        db.insert_stock_item(&StockItem::new(name.into(), quantity, &intake, Utc::now()))
            .unwrap();
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    #[test]
    fn test_statistics() {
        let db = Database::open_in_memory().unwrap();
        add(&db, "Ibuprofen", 40, 0.25, None);
        add(&db, "Paracetamol", 8, 0.5, None);
        add(&db, "Cetirizine", 0, 1.0, None);

        let stats = stock_statistics(&db).unwrap();
        assert_eq!(stats.item_count, 3);
        assert_eq!(stats.total_units, 48);
        assert_eq!(stats.low_stock_count, 2);
        assert_eq!(stats.total_value, 14.0);
    }

    #[test]
    fn test_low_stock_lowest_first() {
        let db = Database::open_in_memory().unwrap();
        add(&db, "Ibuprofen", 40, 0.25, None);
        add(&db, "Paracetamol", 8, 0.5, None);
        add(&db, "Cetirizine", 0, 1.0, None);

        let names: Vec<_> = low_stock_alerts(&db)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Cetirizine", "Paracetamol"]);
    }

    #[test]
    fn test_expiring_window() {
        let db = Database::open_in_memory().unwrap();
        add(&db, "Expired", 5, 1.0, Some(date(2, 28)));
        add(&db, "Today", 5, 1.0, Some(date(3, 2)));
        add(&db, "Edge", 5, 1.0, Some(date(4, 1)));
        add(&db, "Later", 5, 1.0, Some(date(4, 2)));
        add(&db, "Undated", 5, 1.0, None);

        let names: Vec<_> = expiring_stock(&db, date(3, 2), 30)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Today", "Edge"]);
    }
}
