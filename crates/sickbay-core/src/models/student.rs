//! Student models.

use serde::{Deserialize, Serialize};

/// A student known to the sickbay.
///
/// Students are owned by the school's records system; the sickbay only keeps
/// enough of them to label prescriptions and dose records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    /// Opaque student ID
    pub id: String,
    /// Full name
    pub name: String,
    /// Boarding house
    pub house: Option<String>,
    /// Class / form
    pub class: Option<String>,
}

impl Student {
    /// Create a new student with a generated ID.
    pub fn new(name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            house: None,
            class: None,
        }
    }

    /// Name with surrounding whitespace removed, for display.
    pub fn display_name(&self) -> &str {
        self.name.trim()
    }
}
