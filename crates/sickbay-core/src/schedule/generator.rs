//! Dose schedule generation.

use chrono::{DateTime, Utc};

use super::dosage::DosagePlan;
use crate::models::{DoseRecord, DoseStatus, Prescription};

/// Draft every dose record for a prescription: one per day of the course and
/// slot of the plan, all pending, in day-then-slot order.
pub fn plan_schedule(
    prescription: &Prescription,
    plan: &DosagePlan,
    now: DateTime<Utc>,
) -> Vec<DoseRecord> {
    prescription
        .start_date
        .iter_days()
        .take(prescription.duration_days as usize)
        .flat_map(|date| plan.slots.iter().map(move |slot| (date, *slot)))
        .map(|(date, slot)| DoseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            prescription_id: prescription.id.clone(),
            student_id: prescription.student_id.clone(),
            student_name: prescription.student_name.clone(),
            drug_name: prescription.drug_name.clone(),
            scheduled_date: date,
            slot,
            status: DoseStatus::Pending,
            notes: None,
            recorded_by: None,
            created_at: now,
            taken_at: None,
            missed_at: None,
            updated_at: now,
        })
        .collect()
}

/// Total doses a course produces.
pub fn total_doses(duration_days: u32, plan: &DosagePlan) -> u32 {
    duration_days.saturating_mul(plan.doses_per_day())
}
