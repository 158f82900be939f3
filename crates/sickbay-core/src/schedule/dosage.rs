//! Dosage descriptor parser.
//!
//! Descriptors have the form `"<amount>x<frequency>"`, e.g. `"2x3"` for two
//! units three times a day. Parsing is permissive: anything unreadable falls
//! back to one unit once a day in the morning, so a malformed descriptor never
//! blocks scheduling.

use serde::{Deserialize, Serialize};

use crate::models::TimeSlot;

/// Structured form of a dosage descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DosagePlan {
    /// Units per administration
    pub amount: u32,
    /// Administrations per day, as written
    pub frequency: u32,
    /// Daily slots, in time order
    pub slots: Vec<TimeSlot>,
}

impl Default for DosagePlan {
    fn default() -> Self {
        Self {
            amount: 1,
            frequency: 1,
            slots: vec![TimeSlot::Morning],
        }
    }
}

impl DosagePlan {
    /// Number of dose records generated per day.
    pub fn doses_per_day(&self) -> u32 {
        self.slots.len() as u32
    }
}

/// Parse a dosage descriptor. Never fails.
pub fn parse_dosage(descriptor: &str) -> DosagePlan {
    let parts: Vec<&str> = descriptor.split('x').collect();
    if parts.len() != 2 {
        if !descriptor.trim().is_empty() {
            tracing::debug!(descriptor, "Unrecognised dosage descriptor, using 1x1");
        }
        return DosagePlan::default();
    }

    let amount = leading_positive_int(parts[0]).unwrap_or(1);
    let frequency = leading_positive_int(parts[1]).unwrap_or(1);

    DosagePlan {
        amount,
        frequency,
        slots: slots_for_frequency(frequency),
    }
}

/// Fixed frequency-to-slot policy; unknown frequencies fall back to morning.
pub fn slots_for_frequency(frequency: u32) -> Vec<TimeSlot> {
    match frequency {
        2 => vec![TimeSlot::Morning, TimeSlot::Evening],
        3 => vec![TimeSlot::Morning, TimeSlot::Midday, TimeSlot::Evening],
        _ => vec![TimeSlot::Morning],
    }
}

/// Leading integer of a segment, ignoring leading whitespace and trailing
/// text ("2 tablets" reads as 2). Zero, negative or missing yields `None`.
fn leading_positive_int(segment: &str) -> Option<u32> {
    let digits: String = segment
        .trim_start()
        .trim_start_matches('+')
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse::<u32>().ok().filter(|n| *n > 0)
}
