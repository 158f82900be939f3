//! Dose record models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Daily administration window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TimeSlot {
    Morning,
    Midday,
    Evening,
}

impl TimeSlot {
    /// All slots in the order they occur during the day.
    pub const ALL: [TimeSlot; 3] = [TimeSlot::Morning, TimeSlot::Midday, TimeSlot::Evening];

    /// Capitalised name for notifications and display.
    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Morning => "Morning",
            TimeSlot::Midday => "Midday",
            TimeSlot::Evening => "Evening",
        }
    }
}

/// Dose record status.
///
/// `Taken` and `Missed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    /// Scheduled, not yet acted on
    Pending,
    /// Administered by a caregiver
    Taken,
    /// Window closed without administration
    Missed,
}

impl DoseStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DoseStatus::Pending)
    }
}

/// One scheduled administration: one drug, one day, one slot.
///
/// `student_name` and `drug_name` are copied from the prescription when the
/// record is generated. They are display labels, not a live join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoseRecord {
    /// Unique dose record ID
    pub id: String,
    /// Owning prescription
    pub prescription_id: String,
    /// Student the dose is for
    pub student_id: String,
    /// Student name at generation time
    pub student_name: String,
    /// Drug name at generation time
    pub drug_name: String,
    /// Calendar day the dose is due (no time of day)
    pub scheduled_date: NaiveDate,
    /// Window within the day
    pub slot: TimeSlot,
    /// Current status
    pub status: DoseStatus,
    /// Caregiver notes recorded when the dose was given
    pub notes: Option<String>,
    /// Caregiver who recorded the transition
    pub recorded_by: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Set when the dose is marked taken
    pub taken_at: Option<DateTime<Utc>>,
    /// Set when the dose is marked missed
    pub missed_at: Option<DateTime<Utc>>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl DoseRecord {
    /// Whether the record can still be transitioned.
    pub fn is_pending(&self) -> bool {
        self.status == DoseStatus::Pending
    }

    /// Apply a transition to this in-memory copy, mirroring the stored update.
    pub fn apply(&mut self, transition: &DoseTransition) {
        match transition {
            DoseTransition::Taken {
                at,
                notes,
                recorded_by,
            } => {
                self.taken_at = Some(*at);
                self.notes = notes.clone();
                self.recorded_by = recorded_by.clone();
                self.updated_at = *at;
            }
            DoseTransition::Missed { at } => {
                self.missed_at = Some(*at);
                self.updated_at = *at;
            }
        }
        self.status = transition.target_status();
    }
}

/// A one-way change applied to a pending dose record.
#[derive(Debug, Clone, PartialEq)]
pub enum DoseTransition {
    Taken {
        at: DateTime<Utc>,
        notes: Option<String>,
        recorded_by: Option<String>,
    },
    Missed {
        at: DateTime<Utc>,
    },
}

impl DoseTransition {
    /// Status the record ends up in.
    pub fn target_status(&self) -> DoseStatus {
        match self {
            DoseTransition::Taken { .. } => DoseStatus::Taken,
            DoseTransition::Missed { .. } => DoseStatus::Missed,
        }
    }
}
