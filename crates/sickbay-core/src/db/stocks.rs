//! Stock database operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult, StockStore};
use crate::models::{StockIntake, StockItem};

const STOCK_COLUMNS: &str = r#"
    id, name, category, quantity, unit, unit_price, low_stock_threshold,
    expiry_date, supplier, description, added_at, updated_at
"#;

impl StockStore for Database {
    fn find_stock_by_name(&self, name: &str) -> DbResult<Option<StockItem>> {
        // `name` is declared COLLATE NOCASE
        self.conn
            .query_row(
                &format!("SELECT {STOCK_COLUMNS} FROM stocks WHERE name = ?1"),
                [name.trim()],
                read_stock_row,
            )
            .optional()
            .map_err(Into::into)
    }

    fn insert_stock_item(&self, item: &StockItem) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO stocks (
                id, name, category, quantity, unit, unit_price, low_stock_threshold,
                expiry_date, supplier, description, added_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                item.id,
                item.name,
                item.category,
                item.quantity,
                item.unit,
                item.unit_price,
                item.low_stock_threshold,
                item.expiry_date,
                item.supplier,
                item.description,
                item.added_at,
                item.updated_at,
            ],
        )?;
        Ok(())
    }

    fn decrement_stock(&self, id: &str, amount: u32, at: DateTime<Utc>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE stocks SET
                quantity = quantity - ?2,
                updated_at = ?3
            WHERE id = ?1 AND quantity >= ?2
            "#,
            params![id, amount, at],
        )?;
        Ok(rows_affected > 0)
    }

    fn increment_stock(
        &self,
        id: &str,
        amount: u32,
        intake: &StockIntake,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let unit_price = intake.unit_price.filter(|price| *price > 0.0);
        let supplier = intake
            .supplier
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let rows_affected = self.conn.execute(
            r#"
            UPDATE stocks SET
                quantity = quantity + ?2,
                unit_price = COALESCE(?3, unit_price),
                supplier = COALESCE(?4, supplier),
                expiry_date = COALESCE(?5, expiry_date),
                updated_at = ?6
            WHERE id = ?1 AND quantity + ?2 <= 4294967295
            "#,
            params![id, amount, unit_price, supplier, intake.expiry_date, at],
        )?;
        Ok(rows_affected > 0)
    }

    fn list_stock_in_hand(&self) -> DbResult<Vec<StockItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STOCK_COLUMNS} FROM stocks WHERE quantity > 0 ORDER BY name"
        ))?;
        let rows = stmt.query_map([], read_stock_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl Database {
    /// Get a stock item by ID.
    pub fn get_stock_item(&self, id: &str) -> DbResult<Option<StockItem>> {
        self.conn
            .query_row(
                &format!("SELECT {STOCK_COLUMNS} FROM stocks WHERE id = ?"),
                [id],
                read_stock_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All stock items, most recently added first.
    pub fn list_stock_items(&self) -> DbResult<Vec<StockItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STOCK_COLUMNS} FROM stocks ORDER BY added_at DESC, name"
        ))?;
        let rows = stmt.query_map([], read_stock_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Overwrite an item's editable fields.
    pub fn update_stock_item(&self, item: &StockItem) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE stocks SET
                name = ?2,
                category = ?3,
                quantity = ?4,
                unit = ?5,
                unit_price = ?6,
                low_stock_threshold = ?7,
                expiry_date = ?8,
                supplier = ?9,
                description = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
            params![
                item.id,
                item.name,
                item.category,
                item.quantity,
                item.unit,
                item.unit_price,
                item.low_stock_threshold,
                item.expiry_date,
                item.supplier,
                item.description,
                item.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a stock item.
    pub fn delete_stock_item(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM stocks WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn read_stock_row(row: &Row<'_>) -> rusqlite::Result<StockItem> {
    Ok(StockItem {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        quantity: row.get(3)?,
        unit: row.get(4)?,
        unit_price: row.get(5)?,
        low_stock_threshold: row.get(6)?,
        expiry_date: row.get(7)?,
        supplier: row.get(8)?,
        description: row.get(9)?,
        added_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup_db() -> (Database, StockItem) {
        let db = Database::open_in_memory().unwrap();
        let intake = StockIntake {
            category: Some("Analgesic".into()),
            unit: Some("tablets".into()),
            unit_price: Some(0.25),
            low_stock_threshold: Some(10),
            supplier: Some("MedSupply".into()),
            ..Default::default()
        };
        let item = StockItem::new("Paracetamol".into(), 50, &intake, Utc::now());
        db.insert_stock_item(&item).unwrap();
        (db, item)
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let (db, item) = setup_db();
        let found = db.find_stock_by_name("PARACETAMOL").unwrap().unwrap();
        assert_eq!(found.id, item.id);
        assert!(db.find_stock_by_name(" paracetamol ").unwrap().is_some());
        assert!(db.find_stock_by_name("ibuprofen").unwrap().is_none());
    }

    #[test]
    fn test_decrement_rejects_shortfall() {
        let (db, item) = setup_db();
        assert!(db.decrement_stock(&item.id, 20, Utc::now()).unwrap());
        assert!(!db.decrement_stock(&item.id, 31, Utc::now()).unwrap());

        let after = db.get_stock_item(&item.id).unwrap().unwrap();
        assert_eq!(after.quantity, 30);

        assert!(db.decrement_stock(&item.id, 30, Utc::now()).unwrap());
        assert_eq!(db.get_stock_item(&item.id).unwrap().unwrap().quantity, 0);
        assert!(db.list_stock_in_hand().unwrap().is_empty());
    }

    #[test]
    fn test_increment_overlays_non_empty_attributes() {
        let (db, item) = setup_db();
        let expiry = NaiveDate::from_ymd_opt(2027, 1, 31).unwrap();
        let intake = StockIntake {
            unit_price: Some(0.0),
            supplier: Some("   ".into()),
            expiry_date: Some(expiry),
            ..Default::default()
        };
        assert!(db.increment_stock(&item.id, 10, &intake, Utc::now()).unwrap());

        let after = db.get_stock_item(&item.id).unwrap().unwrap();
        assert_eq!(after.quantity, 60);
        assert_eq!(after.unit_price, 0.25);
        assert_eq!(after.supplier, Some("MedSupply".into()));
        assert_eq!(after.expiry_date, Some(expiry));
    }

    #[test]
    fn test_increment_refuses_u32_overflow() {
        let (db, item) = setup_db();
        let intake = StockIntake {
            supplier: Some("Other".into()),
            ..Default::default()
        };
        assert!(!db.increment_stock(&item.id, u32::MAX, &intake, Utc::now()).unwrap());

        let after = db.get_stock_item(&item.id).unwrap().unwrap();
        assert_eq!(after.quantity, 50);
        assert_eq!(after.supplier, Some("MedSupply".into()));
        assert!(db.increment_stock(&item.id, u32::MAX - 50, &intake, Utc::now()).unwrap());
        assert_eq!(db.get_stock_item(&item.id).unwrap().unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_update_and_delete() {
        let (db, mut item) = setup_db();
        item.description = Some("500mg tablets".into());
        item.low_stock_threshold = 15;
        assert!(db.update_stock_item(&item).unwrap());
        assert_eq!(db.get_stock_item(&item.id).unwrap().unwrap(), item);

        assert!(db.delete_stock_item(&item.id).unwrap());
        assert!(!db.delete_stock_item(&item.id).unwrap());
        assert!(db.list_stock_items().unwrap().is_empty());
    }
}
