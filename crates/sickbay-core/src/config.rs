//! Runtime configuration.
//!
//! Defaults reproduce the school's fixed policy; a JSON file can override any
//! field.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{TimeSlot, DEFAULT_LOW_STOCK_THRESHOLD};

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "sickbay_core=info"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SickbayConfig {
    pub sweep: SweepConfig,
    /// Threshold given to new stock items that do not specify one
    pub default_low_stock_threshold: u32,
    /// Stock expiring within this many days is reported as expiring
    pub expiry_warning_days: u32,
}

impl Default for SickbayConfig {
    fn default() -> Self {
        Self {
            sweep: SweepConfig::default(),
            default_low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            expiry_warning_days: 30,
        }
    }
}

impl SickbayConfig {
    /// Load and validate a JSON config file. Missing fields take defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded sickbay config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sweep.validate()
    }
}

/// When reminders for a still-pending dose are repeated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReminderPolicy {
    /// Remind on every sweep tick inside the window.
    #[default]
    EveryTick,
    /// Remind once per dose per window.
    OncePerWindow,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SweepConfig {
    pub interval_secs: u64,
    pub missed_cutoffs: MissedCutoffs,
    pub reminder_windows: ReminderWindows,
    pub reminder_policy: ReminderPolicy,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            missed_cutoffs: MissedCutoffs::default(),
            reminder_windows: ReminderWindows::default(),
            reminder_policy: ReminderPolicy::default(),
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("sweep interval must be positive".into()));
        }

        let c = &self.missed_cutoffs;
        if !(c.morning < c.midday && c.midday < c.evening && c.evening <= 24) {
            return Err(ConfigError::Invalid(format!(
                "missed cutoffs must increase within the day (got {}, {}, {})",
                c.morning, c.midday, c.evening
            )));
        }

        for (slot, window) in self.reminder_windows.iter() {
            if window.start >= window.end || window.end > 24 {
                return Err(ConfigError::Invalid(format!(
                    "{} reminder window {}-{} is empty or past midnight",
                    slot.label(),
                    window.start,
                    window.end
                )));
            }
        }
        Ok(())
    }
}

/// Hour at which each slot's doses become overdue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MissedCutoffs {
    pub morning: u32,
    pub midday: u32,
    pub evening: u32,
}

impl Default for MissedCutoffs {
    fn default() -> Self {
        Self {
            morning: 10,
            midday: 14,
            evening: 19,
        }
    }
}

impl MissedCutoffs {
    /// The most recent slot whose cutoff has passed at `hour`, if any.
    pub fn elapsed_slot(&self, hour: u32) -> Option<TimeSlot> {
        if hour >= self.evening {
            Some(TimeSlot::Evening)
        } else if hour >= self.midday {
            Some(TimeSlot::Midday)
        } else if hour >= self.morning {
            Some(TimeSlot::Morning)
        } else {
            None
        }
    }
}

/// Half-open range of local hours, `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

impl HourWindow {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u32) -> bool {
        self.start <= hour && hour < self.end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReminderWindows {
    pub morning: HourWindow,
    pub midday: HourWindow,
    pub evening: HourWindow,
}

impl Default for ReminderWindows {
    fn default() -> Self {
        Self {
            morning: HourWindow::new(8, 10),
            midday: HourWindow::new(12, 14),
            evening: HourWindow::new(18, 20),
        }
    }
}

impl ReminderWindows {
    pub fn window(&self, slot: TimeSlot) -> HourWindow {
        match slot {
            TimeSlot::Morning => self.morning,
            TimeSlot::Midday => self.midday,
            TimeSlot::Evening => self.evening,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TimeSlot, HourWindow)> + '_ {
        TimeSlot::ALL.into_iter().map(|slot| (slot, self.window(slot)))
    }

    /// Slots whose reminder window contains `hour`.
    pub fn open_at(&self, hour: u32) -> Vec<TimeSlot> {
        self.iter()
            .filter(|(_, window)| window.contains(hour))
            .map(|(slot, _)| slot)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SickbayConfig::default();
        assert_eq!(config.sweep.interval_secs, 60);
        assert_eq!(config.sweep.reminder_policy, ReminderPolicy::EveryTick);
        assert_eq!(config.default_low_stock_threshold, 20);
        assert_eq!(config.expiry_warning_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_elapsed_slot_boundaries() {
        let cutoffs = MissedCutoffs::default();
        assert_eq!(cutoffs.elapsed_slot(0), None);
        assert_eq!(cutoffs.elapsed_slot(9), None);
        assert_eq!(cutoffs.elapsed_slot(10), Some(TimeSlot::Morning));
        assert_eq!(cutoffs.elapsed_slot(13), Some(TimeSlot::Morning));
        assert_eq!(cutoffs.elapsed_slot(14), Some(TimeSlot::Midday));
        assert_eq!(cutoffs.elapsed_slot(15), Some(TimeSlot::Midday));
        assert_eq!(cutoffs.elapsed_slot(19), Some(TimeSlot::Evening));
        assert_eq!(cutoffs.elapsed_slot(23), Some(TimeSlot::Evening));
    }

    #[test]
    fn test_reminder_windows_are_half_open() {
        let windows = ReminderWindows::default();
        assert!(windows.open_at(7).is_empty());
        assert_eq!(windows.open_at(8), vec![TimeSlot::Morning]);
        assert_eq!(windows.open_at(9), vec![TimeSlot::Morning]);
        assert!(windows.open_at(10).is_empty());
        assert_eq!(windows.open_at(13), vec![TimeSlot::Midday]);
        assert_eq!(windows.open_at(19), vec![TimeSlot::Evening]);
        assert!(windows.open_at(20).is_empty());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sweep": {{"interval_secs": 30, "reminder_policy": "once_per_window"}}}}"#
        )
        .unwrap();

        let config = SickbayConfig::load(file.path()).unwrap();
        assert_eq!(config.sweep.interval_secs, 30);
        assert_eq!(config.sweep.reminder_policy, ReminderPolicy::OncePerWindow);
        assert_eq!(config.sweep.missed_cutoffs, MissedCutoffs::default());
        assert_eq!(config.expiry_warning_days, 30);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = SickbayConfig::default();
        config.sweep.interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unordered_cutoffs() {
        let mut config = SickbayConfig::default();
        config.sweep.missed_cutoffs.midday = 9;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_empty_window() {
        let mut config = SickbayConfig::default();
        config.sweep.reminder_windows.evening = HourWindow::new(20, 20);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SickbayConfig::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
