//! Caregiver and sweeper dose transitions.

use crate::clock::Clock;
use crate::db::{DoseStore, PrescriptionStore, StockStore};
use crate::models::{DoseRecord, DoseStatus, DoseTransition, Prescription};
use crate::notify::NotificationSink;
use crate::schedule::parse_dosage;
use crate::stock::{StockDecrement, StockError, StockLedger};

use super::{DoseError, DoseResult, ProgressAggregator};

/// What happened to stock when a dose was recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum StockEffect {
    /// Missed doses never touch stock.
    NotApplicable,
    Decremented(StockDecrement),
    /// No stock item is tracked for the drug.
    Untracked,
    Insufficient { available: u32, requested: u32 },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTransition {
    pub dose: DoseRecord,
    pub stock: StockEffect,
    /// The owning prescription after progress was recomputed, if that succeeded.
    pub prescription: Option<Prescription>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(AppliedTransition),
    /// The record had already left `pending`; nothing was changed.
    AlreadyProcessed { status: DoseStatus },
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied(_))
    }

    pub fn applied(&self) -> Option<&AppliedTransition> {
        match self {
            TransitionOutcome::Applied(applied) => Some(applied),
            TransitionOutcome::AlreadyProcessed { .. } => None,
        }
    }
}

/// Dose state machine with its stock and progress side effects.
pub struct DoseTracker<'a, S> {
    store: &'a S,
    clock: &'a dyn Clock,
    sink: &'a dyn NotificationSink,
}

impl<'a, S> DoseTracker<'a, S>
where
    S: DoseStore + PrescriptionStore + StockStore,
{
    pub fn new(store: &'a S, clock: &'a dyn Clock, sink: &'a dyn NotificationSink) -> Self {
        Self { store, clock, sink }
    }

    /// Record a dose as taken.
    ///
    /// On success the drug's stock is decremented by the dosage amount and the
    /// prescription's progress recomputed. Both are attempted in that order;
    /// neither failure undoes the transition.
    pub fn mark_taken(
        &self,
        dose_id: &str,
        notes: Option<String>,
        recorded_by: Option<String>,
    ) -> DoseResult<TransitionOutcome> {
        let transition = DoseTransition::Taken {
            at: self.clock.now_utc(),
            notes: notes.filter(|n| !n.trim().is_empty()),
            recorded_by,
        };
        let dose = match self.transition(dose_id, &transition)? {
            Ok(dose) => dose,
            Err(status) => return Ok(TransitionOutcome::AlreadyProcessed { status }),
        };

        tracing::info!(dose_id, drug = %dose.drug_name, slot = dose.slot.label(), "Dose taken");

        let stock = self.decrement_stock(&dose);
        let prescription = match ProgressAggregator::new(self.store, self.clock)
            .recompute(&dose.prescription_id)
        {
            Ok(prescription) => Some(prescription),
            Err(e) => {
                tracing::error!(
                    prescription_id = %dose.prescription_id,
                    error = %e,
                    "Failed to recompute prescription progress"
                );
                None
            }
        };

        Ok(TransitionOutcome::Applied(AppliedTransition {
            dose,
            stock,
            prescription,
        }))
    }

    /// Record a dose as missed. Stock and progress are untouched.
    pub fn mark_missed(&self, dose_id: &str) -> DoseResult<TransitionOutcome> {
        let transition = DoseTransition::Missed {
            at: self.clock.now_utc(),
        };
        let dose = match self.transition(dose_id, &transition)? {
            Ok(dose) => dose,
            Err(status) => return Ok(TransitionOutcome::AlreadyProcessed { status }),
        };

        tracing::info!(dose_id, drug = %dose.drug_name, slot = dose.slot.label(), "Dose missed");

        Ok(TransitionOutcome::Applied(AppliedTransition {
            dose,
            stock: StockEffect::NotApplicable,
            prescription: None,
        }))
    }

    /// Move a record out of `pending`. The inner `Err` carries the status of
    /// a record some earlier call already moved.
    fn transition(
        &self,
        dose_id: &str,
        transition: &DoseTransition,
    ) -> DoseResult<Result<DoseRecord, DoseStatus>> {
        let mut dose = self
            .store
            .get_dose_record(dose_id)?
            .ok_or_else(|| DoseError::NotFound(dose_id.to_string()))?;

        if dose.status.is_terminal() {
            tracing::warn!(dose_id, status = ?dose.status, "Dose already processed");
            return Ok(Err(dose.status));
        }

        if !self.store.apply_dose_transition(dose_id, transition)? {
            // Lost a race with another writer since the read above
            let status = self
                .store
                .get_dose_record(dose_id)?
                .map(|d| d.status)
                .unwrap_or(dose.status);
            tracing::warn!(dose_id, status = ?status, "Dose already processed");
            return Ok(Err(status));
        }

        dose.apply(transition);
        Ok(Ok(dose))
    }

    fn decrement_stock(&self, dose: &DoseRecord) -> StockEffect {
        let amount = match self.store.get_prescription(&dose.prescription_id) {
            Ok(Some(prescription)) => parse_dosage(&prescription.dosage).amount,
            Ok(None) => {
                tracing::error!(prescription_id = %dose.prescription_id, "Dose has no prescription");
                return StockEffect::Failed("prescription not found".into());
            }
            Err(e) => {
                tracing::error!(prescription_id = %dose.prescription_id, error = %e, "Failed to load prescription");
                return StockEffect::Failed(e.to_string());
            }
        };

        let ledger = StockLedger::new(self.store, self.clock, self.sink);
        match ledger.decrement(&dose.drug_name, amount) {
            Ok(decrement) => StockEffect::Decremented(decrement),
            Err(StockError::NotFound(_)) => {
                tracing::warn!(drug = %dose.drug_name, "No stock tracked for drug");
                StockEffect::Untracked
            }
            Err(StockError::Insufficient {
                available,
                requested,
                ..
            }) => {
                tracing::warn!(drug = %dose.drug_name, available, requested, "Insufficient stock for dose");
                StockEffect::Insufficient {
                    available,
                    requested,
                }
            }
            Err(e) => {
                tracing::warn!(drug = %dose.drug_name, error = %e, "Stock decrement failed");
                StockEffect::Failed(e.to_string())
            }
        }
    }
}
