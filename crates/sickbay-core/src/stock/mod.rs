//! Stock ledger: quantity on hand per drug.

mod ledger;

pub use ledger::*;

use thiserror::Error;

use crate::db::DbError;

/// Stock errors.
#[derive(Error, Debug)]
pub enum StockError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// No stock is tracked under this name.
    #[error("No stock item named {0}")]
    NotFound(String),

    #[error("Insufficient stock for {name}: {available} available, {requested} requested")]
    Insufficient {
        name: String,
        available: u32,
        requested: u32,
    },

    #[error("Stock amount must be positive and keep the total within range")]
    InvalidAmount,

    #[error("Stock item name is required")]
    MissingName,
}

pub type StockResult<T> = Result<T, StockError>;
