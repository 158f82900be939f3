//! Notification sinks.
//!
//! The core raises caregiver-facing events (dose reminders, stock warnings)
//! as plain title/body pairs. Where they end up is the front end's business.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::models::{DoseRecord, StockItem};

/// What a notification is about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DoseReminder,
    LowStock,
    InsufficientStock,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn dose_reminder(dose: &DoseRecord) -> Self {
        Self {
            kind: NotificationKind::DoseReminder,
            title: format!("Prescription Due: {} Dose", dose.slot.label()),
            body: format!("{} needs to take {}.", dose.student_name, dose.drug_name),
        }
    }

    pub fn low_stock(item: &StockItem, remaining: u32) -> Self {
        Self {
            kind: NotificationKind::LowStock,
            title: "Low stock".into(),
            body: format!(
                "{} is now running low in stock ({} units remaining)",
                item.name, remaining
            ),
        }
    }

    pub fn insufficient_stock(drug_name: &str, available: u32) -> Self {
        Self {
            kind: NotificationKind::InsufficientStock,
            title: "Insufficient stock".into(),
            body: format!(
                "Insufficient stock for {}. Only {} units available.",
                drug_name, available
            ),
        }
    }
}

/// Receives notifications raised by the core.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes every notification to the log.
#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::DoseReminder => tracing::info!(
                title = %notification.title,
                body = %notification.body,
                "Dose reminder"
            ),
            NotificationKind::LowStock | NotificationKind::InsufficientStock => tracing::warn!(
                title = %notification.title,
                body = %notification.body,
                "Stock notification"
            ),
        }
    }
}

/// Collects notifications until they are drained.
#[derive(Debug, Default)]
pub struct MemorySink {
    pending: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every notification collected so far.
    pub fn drain(&self) -> Vec<Notification> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notification: Notification) {
        match self.pending.lock() {
            Ok(mut pending) => pending.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

/// Forwards each notification to every inner sink, in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }
}

impl NotificationSink for FanoutSink {
    fn notify(&self, notification: Notification) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.notify(notification.clone());
            }
            last.notify(notification);
        }
    }
}
