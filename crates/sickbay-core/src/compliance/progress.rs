//! Prescription progress aggregation.

use crate::clock::Clock;
use crate::db::{DoseStore, PrescriptionStore};
use crate::models::{DoseStatus, Prescription, PrescriptionStatus, ProgressUpdate};

use super::{DoseError, DoseResult};

/// `round(taken / total * 100)`, halves rounding up; 0 when there are no doses.
pub fn progress_percent(taken: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let taken = u64::from(taken.min(total));
    let total = u64::from(total);
    ((taken * 200 + total) / (total * 2)) as u8
}

/// Recomputes a prescription's derived fields from its dose records.
pub struct ProgressAggregator<'a, S> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S> ProgressAggregator<'a, S>
where
    S: PrescriptionStore + DoseStore,
{
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Count taken and total doses, write progress back and complete the
    /// prescription once every dose is taken. Safe to repeat.
    pub fn recompute(&self, prescription_id: &str) -> DoseResult<Prescription> {
        let mut prescription = self
            .store
            .get_prescription(prescription_id)?
            .ok_or_else(|| DoseError::PrescriptionNotFound(prescription_id.to_string()))?;

        let doses = self.store.list_doses_for_prescription(prescription_id)?;
        let total_doses = doses.len() as u32;
        let taken_doses = doses
            .iter()
            .filter(|d| d.status == DoseStatus::Taken)
            .count() as u32;
        let progress = progress_percent(taken_doses, total_doses);

        let now = self.clock.now_utc();
        let (status, completed_at) = if progress >= 100 {
            (
                PrescriptionStatus::Completed,
                Some(prescription.completed_at.unwrap_or(now)),
            )
        } else {
            (PrescriptionStatus::Active, None)
        };

        let update = ProgressUpdate {
            taken_doses,
            total_doses,
            progress,
            status,
            completed_at,
            updated_at: now,
        };
        if !self.store.update_prescription_progress(prescription_id, &update)? {
            return Err(DoseError::PrescriptionNotFound(prescription_id.to_string()));
        }

        if status == PrescriptionStatus::Completed && !prescription.is_completed() {
            tracing::info!(prescription_id, drug = %prescription.drug_name, "Prescription completed");
        }

        prescription.taken_doses = taken_doses;
        prescription.total_doses = total_doses;
        prescription.progress = progress;
        prescription.status = status;
        prescription.completed_at = completed_at;
        prescription.updated_at = now;
        Ok(prescription)
    }
}
