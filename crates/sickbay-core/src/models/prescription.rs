//! Prescription models.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::student::Student;

/// Prescription status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    /// Doses still outstanding
    Active,
    /// Every dose taken (progress reached 100)
    Completed,
}

/// A course of medication for one student.
///
/// `progress`, `taken_doses`, `total_doses`, `status` and `completed_at` are
/// derived from the prescription's dose records and only written by the
/// progress aggregator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    /// Unique prescription ID
    pub id: String,
    /// Student the prescription is for
    pub student_id: String,
    /// Student name at creation time
    pub student_name: String,
    /// Drug name (matches a stock item name, case-insensitively)
    pub drug_name: String,
    /// Dosage descriptor, e.g. "2x3" (2 units, 3 times a day)
    pub dosage: String,
    /// Course length in whole days
    pub duration_days: u32,
    /// Free-text notes
    pub notes: Option<String>,
    /// Current status
    pub status: PrescriptionStatus,
    /// Percentage of doses taken (0-100)
    pub progress: u8,
    /// Number of doses taken
    pub taken_doses: u32,
    /// Number of scheduled doses
    pub total_doses: u32,
    /// First day of the schedule
    pub start_date: NaiveDate,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Start timestamp
    pub started_at: DateTime<Utc>,
    /// Set once, on the transition into `Completed`
    pub completed_at: Option<DateTime<Utc>>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Prescription {
    /// Create a new active prescription starting on the local date of `now`.
    pub fn new(
        student: &Student,
        drug_name: String,
        dosage: String,
        duration_days: u32,
        now: DateTime<FixedOffset>,
    ) -> Self {
        let now_utc = now.with_timezone(&Utc);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            drug_name,
            dosage,
            duration_days,
            notes: None,
            status: PrescriptionStatus::Active,
            progress: 0,
            taken_doses: 0,
            total_doses: 0,
            start_date: now.date_naive(),
            created_at: now_utc,
            started_at: now_utc,
            completed_at: None,
            updated_at: now_utc,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == PrescriptionStatus::Completed
    }
}

/// Derived progress fields written back after a recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub taken_doses: u32,
    pub total_doses: u32,
    pub progress: u8,
    pub status: PrescriptionStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
