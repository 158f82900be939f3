//! Dose compliance: state transitions, progress and the recurring sweep.
//!
//! A dose record leaves `pending` exactly once. Whoever wins that transition
//! (caregiver or sweeper) runs its side effects; everyone else gets
//! [`TransitionOutcome::AlreadyProcessed`].

mod progress;
mod sweeper;
mod transitions;

pub use progress::*;
pub use sweeper::*;
pub use transitions::*;

use thiserror::Error;

use crate::db::DbError;

/// Dose transition errors.
#[derive(Error, Debug)]
pub enum DoseError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Dose record not found: {0}")]
    NotFound(String),

    #[error("Prescription not found: {0}")]
    PrescriptionNotFound(String),
}

pub type DoseResult<T> = Result<T, DoseError>;
