//! Narrow store contracts used by the scheduling and compliance logic.
//!
//! Each trait covers one collection and exposes only the reads and writes the
//! core needs, so the logic never scans a whole collection held in memory.

use chrono::{DateTime, NaiveDate, Utc};

use super::DbResult;
use crate::models::{
    DoseRecord, DoseTransition, Prescription, ProgressUpdate, StockIntake, StockItem, Student,
    TimeSlot,
};

/// Student lookups.
pub trait StudentStore {
    fn get_student(&self, id: &str) -> DbResult<Option<Student>>;
}

/// Prescription reads and derived-field writes.
pub trait PrescriptionStore {
    fn insert_prescription(&self, prescription: &Prescription) -> DbResult<()>;

    fn get_prescription(&self, id: &str) -> DbResult<Option<Prescription>>;

    /// Write progress, counts, status and completion timestamp.
    ///
    /// A completion timestamp already stored is never overwritten.
    /// Returns false if the prescription does not exist.
    fn update_prescription_progress(&self, id: &str, update: &ProgressUpdate) -> DbResult<bool>;
}

/// Dose record reads and one-way transitions.
pub trait DoseStore {
    fn insert_dose_record(&self, dose: &DoseRecord) -> DbResult<()>;

    fn get_dose_record(&self, id: &str) -> DbResult<Option<DoseRecord>>;

    fn list_doses_for_prescription(&self, prescription_id: &str) -> DbResult<Vec<DoseRecord>>;

    /// Pending records scheduled on `date`, any slot.
    fn find_pending_on(&self, date: NaiveDate) -> DbResult<Vec<DoseRecord>>;

    /// Pending records scheduled on `date` in `slot`.
    fn find_pending_by_slot(&self, date: NaiveDate, slot: TimeSlot) -> DbResult<Vec<DoseRecord>>;

    /// Apply a transition only if the record is still pending.
    ///
    /// Returns true if this call moved the record out of `pending`; false if
    /// the record was already terminal (or missing). Exactly one caller can
    /// win for a given record.
    fn apply_dose_transition(&self, id: &str, transition: &DoseTransition) -> DbResult<bool>;
}

/// Stock quantity bookkeeping.
pub trait StockStore {
    /// Case-insensitive lookup by drug name.
    fn find_stock_by_name(&self, name: &str) -> DbResult<Option<StockItem>>;

    fn insert_stock_item(&self, item: &StockItem) -> DbResult<()>;

    /// Subtract `amount` if at least `amount` is on hand.
    /// Returns false, without changing anything, otherwise.
    fn decrement_stock(&self, id: &str, amount: u32, at: DateTime<Utc>) -> DbResult<bool>;

    /// Add `amount` and overlay the non-empty intake attributes.
    ///
    /// Returns false, changing nothing, if the item is unknown or the total
    /// would not fit in a `u32`.
    fn increment_stock(
        &self,
        id: &str,
        amount: u32,
        intake: &StockIntake,
        at: DateTime<Utc>,
    ) -> DbResult<bool>;

    /// Items with a positive quantity, by name.
    fn list_stock_in_hand(&self) -> DbResult<Vec<StockItem>>;
}
