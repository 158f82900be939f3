//! Injected wall clock.
//!
//! Scheduling and compliance decisions depend on the school's local date and
//! hour. Everything that needs "now" takes a [`Clock`] so tests can pin it.

use chrono::{DateTime, FixedOffset, Local, Utc};

/// Source of the current school-local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current instant in UTC, for stored timestamps.
    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Host clock in the host's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
