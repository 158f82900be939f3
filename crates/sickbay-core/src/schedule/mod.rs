//! Prescription scheduling.
//!
//! Pipeline: Dosage descriptor → [`DosagePlan`] → dose record drafts → store

mod dosage;
mod generator;

pub use dosage::*;
pub use generator::*;

use thiserror::Error;

use crate::clock::Clock;
use crate::db::{DbError, DoseStore, PrescriptionStore, StudentStore};
use crate::models::{DoseRecord, Prescription};

/// Scheduling errors.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Invalid prescription: {0}")]
    InvalidPrescription(String),

    /// Some dose records were written and some were not. The written ones
    /// stay; the caller must reconcile.
    #[error("Schedule for {prescription_id} incomplete: {created} dose records created, {failed} failed")]
    PartialFailure {
        prescription_id: String,
        created: usize,
        failed: usize,
    },
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Caregiver input for a new prescription.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrescription {
    pub student_id: String,
    pub drug_name: String,
    pub dosage: String,
    pub duration_days: u32,
    pub notes: Option<String>,
}

impl NewPrescription {
    fn validate(&self) -> ScheduleResult<()> {
        if self.drug_name.trim().is_empty() {
            return Err(ScheduleError::InvalidPrescription("drug name is required".into()));
        }
        if self.dosage.trim().is_empty() {
            return Err(ScheduleError::InvalidPrescription("dosage is required".into()));
        }
        if self.duration_days == 0 {
            return Err(ScheduleError::InvalidPrescription(
                "duration must be at least one day".into(),
            ));
        }
        Ok(())
    }
}

/// Creates prescriptions and their dose schedules.
pub struct Scheduler<'a, S> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S> Scheduler<'a, S>
where
    S: StudentStore + PrescriptionStore + DoseStore,
{
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Create an active prescription starting today and generate its schedule.
    pub fn create_prescription(
        &self,
        request: NewPrescription,
    ) -> ScheduleResult<(Prescription, Vec<DoseRecord>)> {
        request.validate()?;

        let student = self
            .store
            .get_student(&request.student_id)?
            .ok_or_else(|| ScheduleError::StudentNotFound(request.student_id.clone()))?;

        let plan = parse_dosage(&request.dosage);
        let mut prescription = Prescription::new(
            &student,
            request.drug_name.trim().to_string(),
            request.dosage.trim().to_string(),
            request.duration_days,
            self.clock.now(),
        );
        prescription.notes = request.notes.filter(|n| !n.trim().is_empty());
        prescription.total_doses = total_doses(prescription.duration_days, &plan);

        self.store.insert_prescription(&prescription)?;
        tracing::info!(
            prescription_id = %prescription.id,
            drug = %prescription.drug_name,
            total_doses = prescription.total_doses,
            "Prescription created"
        );

        let doses = self.generate_schedule(&prescription)?;
        Ok((prescription, doses))
    }

    /// Write every dose record for a prescription.
    ///
    /// Best effort: a failed write does not undo earlier ones. Any failure is
    /// reported as [`ScheduleError::PartialFailure`].
    pub fn generate_schedule(&self, prescription: &Prescription) -> ScheduleResult<Vec<DoseRecord>> {
        let plan = parse_dosage(&prescription.dosage);
        let drafts = plan_schedule(prescription, &plan, self.clock.now_utc());

        let mut created = Vec::with_capacity(drafts.len());
        let mut failed = 0;
        for dose in drafts {
            match self.store.insert_dose_record(&dose) {
                Ok(()) => created.push(dose),
                Err(e) => {
                    failed += 1;
                    tracing::error!(
                        prescription_id = %prescription.id,
                        date = %dose.scheduled_date,
                        slot = ?dose.slot,
                        error = %e,
                        "Failed to create dose record"
                    );
                }
            }
        }

        if failed > 0 {
            return Err(ScheduleError::PartialFailure {
                prescription_id: prescription.id.clone(),
                created: created.len(),
                failed,
            });
        }

        tracing::debug!(
            prescription_id = %prescription.id,
            count = created.len(),
            "Dose schedule generated"
        );
        Ok(created)
    }
}
