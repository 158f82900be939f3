//! Sickbay Core Library
//!
//! Dose scheduling and compliance tracking for a school sickbay.
//!
//! # Architecture
//!
//! ```text
//! Caregiver creates prescription ("2x3", 5 days)
//!                 │
//!         Dosage Parser → Schedule Generator
//!                 │
//!     [dose_records: one per day × slot, pending]
//!                 │
//!     ┌───────────┴────────────┐
//!     │                        │
//! Caregiver marks taken    Compliance Sweeper (every minute)
//!     │                    ├─ overdue slot → missed
//!     │                    └─ open window → reminder
//!     ▼
//! Stock Ledger decrement → Progress Aggregator recompute
//! ```
//!
//! # Core Principle
//!
//! **A dose leaves `pending` exactly once.** Stock is never decremented twice
//! for one dose, and a taken dose is never undone by inventory problems.
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence and the narrow store traits
//! - [`models`]: Domain types (Prescription, DoseRecord, StockItem, Student)
//! - [`schedule`]: Dosage parsing and schedule generation
//! - [`compliance`]: Dose state machine, progress and the recurring sweep
//! - [`stock`]: Stock ledger
//! - [`reports`]: Dashboard reports
//! - [`notify`]: Notification sinks
//! - [`clock`], [`config`], [`logging`]: Ambient plumbing

pub mod clock;
pub mod compliance;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod notify;
pub mod reports;
pub mod schedule;
pub mod stock;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use compliance::{ComplianceSweeper, DoseTracker, ProgressAggregator, TransitionOutcome};
pub use config::SickbayConfig;
pub use db::Database;
pub use models::{
    DoseRecord, DoseStatus, Prescription, PrescriptionStatus, StockIntake, StockItem, Student,
    TimeSlot,
};
pub use notify::{MemorySink, Notification, NotificationSink};
pub use schedule::{parse_dosage, NewPrescription, Scheduler};
pub use stock::StockLedger;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use compliance::{StockEffect, SweepOutcome, SweeperHandle};
use db::{DoseStore, PrescriptionStore};
use notify::{FanoutSink, TracingSink};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SickbayError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    InsufficientStock(String),

    #[error("Schedule incomplete: {0}")]
    ScheduleIncomplete(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Please sign in first")]
    Unauthenticated,
}

impl From<db::DbError> for SickbayError {
    fn from(e: db::DbError) -> Self {
        SickbayError::DatabaseError(e.to_string())
    }
}

impl From<schedule::ScheduleError> for SickbayError {
    fn from(e: schedule::ScheduleError) -> Self {
        use schedule::ScheduleError;
        match e {
            ScheduleError::Database(e) => e.into(),
            ScheduleError::StudentNotFound(id) => SickbayError::NotFound(format!("student {id}")),
            ScheduleError::InvalidPrescription(msg) => SickbayError::InvalidInput(msg),
            e @ ScheduleError::PartialFailure { .. } => {
                SickbayError::ScheduleIncomplete(e.to_string())
            }
        }
    }
}

impl From<compliance::DoseError> for SickbayError {
    fn from(e: compliance::DoseError) -> Self {
        use compliance::DoseError;
        match e {
            DoseError::Database(e) => e.into(),
            DoseError::NotFound(id) => SickbayError::NotFound(format!("dose record {id}")),
            DoseError::PrescriptionNotFound(id) => {
                SickbayError::NotFound(format!("prescription {id}"))
            }
        }
    }
}

impl From<stock::StockError> for SickbayError {
    fn from(e: stock::StockError) -> Self {
        use stock::StockError;
        match e {
            StockError::Database(e) => e.into(),
            StockError::NotFound(name) => SickbayError::NotFound(format!("stock item {name}")),
            e @ StockError::Insufficient { .. } => SickbayError::InsufficientStock(e.to_string()),
            e @ (StockError::InvalidAmount | StockError::MissingName) => {
                SickbayError::InvalidInput(e.to_string())
            }
        }
    }
}

impl From<config::ConfigError> for SickbayError {
    fn from(e: config::ConfigError) -> Self {
        SickbayError::ConfigError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for SickbayError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        SickbayError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path with default settings.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<SickbayCore>, SickbayError> {
    let db = Database::open(&path)?;
    Ok(SickbayCore::with_clock(
        db,
        SickbayConfig::default(),
        Arc::new(SystemClock),
    ))
}

/// Open or create a database, reading settings from a JSON config file.
#[uniffi::export]
pub fn open_database_with_config(
    path: String,
    config_path: String,
) -> Result<Arc<SickbayCore>, SickbayError> {
    let config = SickbayConfig::load(&config_path)?;
    let db = Database::open(&path)?;
    Ok(SickbayCore::with_clock(db, config, Arc::new(SystemClock)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<SickbayCore>, SickbayError> {
    let db = Database::open_in_memory()?;
    Ok(SickbayCore::with_clock(
        db,
        SickbayConfig::default(),
        Arc::new(SystemClock),
    ))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe sickbay handle for FFI.
#[derive(uniffi::Object)]
pub struct SickbayCore {
    db: Arc<Mutex<Database>>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    notifications: Arc<MemorySink>,
    sweeper: Arc<ComplianceSweeper>,
    background: Mutex<Option<SweeperHandle>>,
    caregiver: Mutex<Option<String>>,
    config: SickbayConfig,
}

impl SickbayCore {
    /// Build a handle around an open database with an explicit clock.
    pub fn with_clock(db: Database, config: SickbayConfig, clock: Arc<dyn Clock>) -> Arc<Self> {
        let notifications = Arc::new(MemorySink::new());
        let sink: Arc<dyn NotificationSink> = Arc::new(FanoutSink::new(vec![
            Arc::new(TracingSink),
            notifications.clone(),
        ]));
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            clock,
            sink,
            notifications,
            sweeper: Arc::new(ComplianceSweeper::new(config.sweep.clone())),
            background: Mutex::new(None),
            caregiver: Mutex::new(None),
            config,
        })
    }

    fn require_caregiver(&self) -> Result<String, SickbayError> {
        self.caregiver
            .lock()?
            .clone()
            .ok_or(SickbayError::Unauthenticated)
    }

    fn date_or_today(&self, date: Option<String>) -> Result<NaiveDate, SickbayError> {
        match date {
            Some(date) => parse_date(&date),
            None => Ok(self.clock.now().date_naive()),
        }
    }
}

#[uniffi::export]
impl SickbayCore {
    // =========================================================================
    // Session
    // =========================================================================

    /// Sign a caregiver in. Mutating calls fail until someone is signed in.
    pub fn sign_in(&self, caregiver_id: String) -> Result<(), SickbayError> {
        let caregiver_id = caregiver_id.trim().to_string();
        if caregiver_id.is_empty() {
            return Err(SickbayError::InvalidInput("caregiver id is required".into()));
        }
        tracing::info!(caregiver = %caregiver_id, "Caregiver signed in");
        *self.caregiver.lock()? = Some(caregiver_id);
        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), SickbayError> {
        if let Some(caregiver) = self.caregiver.lock()?.take() {
            tracing::info!(caregiver = %caregiver, "Caregiver signed out");
        }
        Ok(())
    }

    pub fn current_caregiver(&self) -> Result<Option<String>, SickbayError> {
        Ok(self.caregiver.lock()?.clone())
    }

    // =========================================================================
    // Student Operations
    // =========================================================================

    /// Add a student.
    pub fn add_student(
        &self,
        name: String,
        house: Option<String>,
        class: Option<String>,
    ) -> Result<FfiStudent, SickbayError> {
        self.require_caregiver()?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(SickbayError::InvalidInput("student name is required".into()));
        }
        let db = self.db.lock()?;
        let mut student = Student::new(name);
        student.house = house;
        student.class = class;
        db.insert_student(&student)?;
        Ok(student.into())
    }

    pub fn list_students(&self) -> Result<Vec<FfiStudent>, SickbayError> {
        let db = self.db.lock()?;
        Ok(db.list_students()?.into_iter().map(|s| s.into()).collect())
    }

    // =========================================================================
    // Prescription Operations
    // =========================================================================

    /// Create a prescription starting today and generate its dose schedule.
    pub fn create_prescription(
        &self,
        student_id: String,
        drug_name: String,
        dosage: String,
        duration_days: u32,
        notes: Option<String>,
    ) -> Result<FfiPrescription, SickbayError> {
        self.require_caregiver()?;
        let db = self.db.lock()?;
        let (prescription, _) = Scheduler::new(&*db, self.clock.as_ref()).create_prescription(
            NewPrescription {
                student_id,
                drug_name,
                dosage,
                duration_days,
                notes,
            },
        )?;
        Ok(prescription.into())
    }

    pub fn get_prescription(&self, id: String) -> Result<Option<FfiPrescription>, SickbayError> {
        let db = self.db.lock()?;
        Ok(db.get_prescription(&id)?.map(|p| p.into()))
    }

    pub fn list_prescriptions_for_student(
        &self,
        student_id: String,
    ) -> Result<Vec<FfiPrescription>, SickbayError> {
        let db = self.db.lock()?;
        let prescriptions = db.list_prescriptions_for_student(&student_id)?;
        Ok(prescriptions.into_iter().map(|p| p.into()).collect())
    }

    /// Completed treatments, newest first.
    pub fn completed_treatments(&self) -> Result<Vec<FfiPrescription>, SickbayError> {
        let db = self.db.lock()?;
        let completed = reports::completed_treatments(&db)?;
        Ok(completed.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Dose Operations
    // =========================================================================

    pub fn list_doses_for_prescription(
        &self,
        prescription_id: String,
    ) -> Result<Vec<FfiDoseRecord>, SickbayError> {
        let db = self.db.lock()?;
        let doses = db.list_doses_for_prescription(&prescription_id)?;
        Ok(doses.into_iter().map(|d| d.into()).collect())
    }

    /// Doses scheduled on a date (`YYYY-MM-DD`, default today).
    pub fn doses_on(&self, date: Option<String>) -> Result<Vec<FfiDoseRecord>, SickbayError> {
        let date = self.date_or_today(date)?;
        let db = self.db.lock()?;
        Ok(db.list_doses_on(date)?.into_iter().map(|d| d.into()).collect())
    }

    /// Record a dose as taken by the signed-in caregiver.
    pub fn mark_dose_taken(
        &self,
        dose_id: String,
        notes: Option<String>,
    ) -> Result<FfiTransitionResult, SickbayError> {
        let caregiver = self.require_caregiver()?;
        let db = self.db.lock()?;
        let outcome = DoseTracker::new(&*db, self.clock.as_ref(), self.sink.as_ref())
            .mark_taken(&dose_id, notes, Some(caregiver))?;
        Ok(outcome.into())
    }

    pub fn mark_dose_missed(&self, dose_id: String) -> Result<FfiTransitionResult, SickbayError> {
        self.require_caregiver()?;
        let db = self.db.lock()?;
        let outcome = DoseTracker::new(&*db, self.clock.as_ref(), self.sink.as_ref())
            .mark_missed(&dose_id)?;
        Ok(outcome.into())
    }

    /// Dose counts for a date (default today).
    pub fn daily_summary(&self, date: Option<String>) -> Result<FfiDailySummary, SickbayError> {
        let date = self.date_or_today(date)?;
        let db = self.db.lock()?;
        Ok(reports::daily_dose_summary(&db, date)?.into())
    }

    /// Per-student dose progress for a date (default today).
    pub fn student_day_board(
        &self,
        date: Option<String>,
    ) -> Result<Vec<FfiStudentDay>, SickbayError> {
        let date = self.date_or_today(date)?;
        let db = self.db.lock()?;
        let board = reports::student_day_board(&db, date)?;
        Ok(board.into_iter().map(|s| s.into()).collect())
    }

    pub fn missed_doses(&self, date: Option<String>) -> Result<Vec<FfiDoseRecord>, SickbayError> {
        let date = self.date_or_today(date)?;
        let db = self.db.lock()?;
        let missed = reports::missed_doses_on(&db, date)?;
        Ok(missed.into_iter().map(|d| d.into()).collect())
    }

    pub fn recent_dose_activity(&self, limit: u32) -> Result<Vec<FfiDoseRecord>, SickbayError> {
        let db = self.db.lock()?;
        let recent = reports::recent_dose_activity(&db, limit as usize)?;
        Ok(recent.into_iter().map(|d| d.into()).collect())
    }

    // =========================================================================
    // Stock Operations
    // =========================================================================

    /// Add units of a drug, creating the stock item on first intake.
    pub fn add_stock(
        &self,
        name: String,
        quantity: u32,
        intake: FfiStockIntake,
    ) -> Result<FfiStockItem, SickbayError> {
        self.require_caregiver()?;
        let mut intake = StockIntake::try_from(intake)?;
        intake.low_stock_threshold = intake
            .low_stock_threshold
            .or(Some(self.config.default_low_stock_threshold));

        let db = self.db.lock()?;
        let item = StockLedger::new(&*db, self.clock.as_ref(), self.sink.as_ref())
            .intake(&name, quantity, &intake)?;
        Ok(item.into())
    }

    /// Overwrite an item's fields. Returns false if no item has this ID.
    pub fn update_stock_item(&self, item: FfiStockItem) -> Result<bool, SickbayError> {
        self.require_caregiver()?;
        if item.name.trim().is_empty() {
            return Err(SickbayError::InvalidInput("stock item name is required".into()));
        }
        let db = self.db.lock()?;
        let Some(existing) = db.get_stock_item(&item.id)? else {
            return Ok(false);
        };
        let updated = StockItem {
            id: existing.id,
            name: item.name.trim().to_string(),
            category: item.category,
            quantity: item.quantity,
            unit: item.unit,
            unit_price: item.unit_price,
            low_stock_threshold: item.low_stock_threshold,
            expiry_date: item.expiry_date.as_deref().map(parse_date).transpose()?,
            supplier: item.supplier,
            description: item.description,
            added_at: existing.added_at,
            updated_at: self.clock.now_utc(),
        };
        Ok(db.update_stock_item(&updated)?)
    }

    pub fn delete_stock_item(&self, id: String) -> Result<bool, SickbayError> {
        self.require_caregiver()?;
        let db = self.db.lock()?;
        Ok(db.delete_stock_item(&id)?)
    }

    pub fn list_stock(&self) -> Result<Vec<FfiStockItem>, SickbayError> {
        let db = self.db.lock()?;
        Ok(db.list_stock_items()?.into_iter().map(|i| i.into()).collect())
    }

    /// Drugs with stock on hand, for the prescription form.
    pub fn available_drugs(&self) -> Result<Vec<FfiStockSummary>, SickbayError> {
        let db = self.db.lock()?;
        let available = StockLedger::new(&*db, self.clock.as_ref(), self.sink.as_ref())
            .available_drugs()?;
        Ok(available.iter().map(|s| s.into()).collect())
    }

    pub fn low_stock_alerts(&self) -> Result<Vec<FfiStockItem>, SickbayError> {
        let db = self.db.lock()?;
        let low = reports::low_stock_alerts(&db)?;
        Ok(low.into_iter().map(|i| i.into()).collect())
    }

    /// Items expiring within the configured warning period.
    pub fn expiring_stock(&self) -> Result<Vec<FfiStockItem>, SickbayError> {
        let today = self.clock.now().date_naive();
        let db = self.db.lock()?;
        let expiring = reports::expiring_stock(&db, today, self.config.expiry_warning_days)?;
        Ok(expiring.into_iter().map(|i| i.into()).collect())
    }

    pub fn stock_statistics(&self) -> Result<FfiStockStatistics, SickbayError> {
        let db = self.db.lock()?;
        Ok(reports::stock_statistics(&db)?.into())
    }

    // =========================================================================
    // Compliance Sweep
    // =========================================================================

    /// Run one sweep now.
    pub fn run_sweep(&self) -> Result<FfiSweepReport, SickbayError> {
        let db = self.db.lock()?;
        let outcome = self
            .sweeper
            .tick(&*db, self.clock.as_ref(), self.sink.as_ref());
        Ok(outcome.into())
    }

    /// Start the recurring sweep. No-op if already running.
    pub fn start_sweeper(&self) -> Result<(), SickbayError> {
        let mut background = self.background.lock()?;
        if background.is_none() {
            *background = Some(compliance::start_background_sweeper(
                self.db.clone(),
                self.sweeper.clone(),
                self.clock.clone(),
                self.sink.clone(),
            ));
        }
        Ok(())
    }

    /// Stop the recurring sweep and wait for it to finish.
    pub fn stop_sweeper(&self) -> Result<(), SickbayError> {
        let handle = self.background.lock()?.take();
        drop(handle);
        Ok(())
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Take the notifications raised since the last call.
    pub fn drain_notifications(&self) -> Vec<FfiNotification> {
        self.notifications
            .drain()
            .into_iter()
            .map(|n| n.into())
            .collect()
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, SickbayError> {
    date.trim()
        .parse::<NaiveDate>()
        .map_err(|e| SickbayError::InvalidInput(format!("invalid date {date:?}: {e}")))
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe student.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStudent {
    pub id: String,
    pub name: String,
    pub house: Option<String>,
    pub class: Option<String>,
}

impl From<Student> for FfiStudent {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            name: student.name,
            house: student.house,
            class: student.class,
        }
    }
}

/// FFI-safe prescription.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub drug_name: String,
    pub dosage: String,
    pub duration_days: u32,
    pub notes: Option<String>,
    pub status: String,
    pub progress: u8,
    pub taken_doses: u32,
    pub total_doses: u32,
    pub start_date: String,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<Prescription> for FfiPrescription {
    fn from(rx: Prescription) -> Self {
        Self {
            status: match rx.status {
                PrescriptionStatus::Active => "active".into(),
                PrescriptionStatus::Completed => "completed".into(),
            },
            id: rx.id,
            student_id: rx.student_id,
            student_name: rx.student_name,
            drug_name: rx.drug_name,
            dosage: rx.dosage,
            duration_days: rx.duration_days,
            notes: rx.notes,
            progress: rx.progress,
            taken_doses: rx.taken_doses,
            total_doses: rx.total_doses,
            start_date: rx.start_date.to_string(),
            created_at: rx.created_at.to_rfc3339(),
            completed_at: rx.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// FFI-safe dose record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoseRecord {
    pub id: String,
    pub prescription_id: String,
    pub student_id: String,
    pub student_name: String,
    pub drug_name: String,
    pub scheduled_date: String,
    pub slot: String,
    pub status: String,
    pub notes: Option<String>,
    pub recorded_by: Option<String>,
    pub taken_at: Option<String>,
    pub missed_at: Option<String>,
}

impl From<DoseRecord> for FfiDoseRecord {
    fn from(dose: DoseRecord) -> Self {
        Self {
            slot: dose.slot.label().to_lowercase(),
            status: status_label(dose.status).into(),
            id: dose.id,
            prescription_id: dose.prescription_id,
            student_id: dose.student_id,
            student_name: dose.student_name,
            drug_name: dose.drug_name,
            scheduled_date: dose.scheduled_date.to_string(),
            notes: dose.notes,
            recorded_by: dose.recorded_by,
            taken_at: dose.taken_at.map(|t| t.to_rfc3339()),
            missed_at: dose.missed_at.map(|t| t.to_rfc3339()),
        }
    }
}

fn status_label(status: DoseStatus) -> &'static str {
    match status {
        DoseStatus::Pending => "pending",
        DoseStatus::Taken => "taken",
        DoseStatus::Missed => "missed",
    }
}

/// FFI-safe result of marking a dose.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTransitionResult {
    /// False if the dose had already been taken or missed
    pub applied: bool,
    /// Dose status after the call
    pub status: String,
    pub dose: Option<FfiDoseRecord>,
    pub stock_remaining: Option<u32>,
    /// Plain-language stock problem, if any
    pub stock_warning: Option<String>,
    pub prescription_progress: Option<u8>,
    pub prescription_completed: bool,
}

impl From<TransitionOutcome> for FfiTransitionResult {
    fn from(outcome: TransitionOutcome) -> Self {
        match outcome {
            TransitionOutcome::AlreadyProcessed { status } => Self {
                applied: false,
                status: status_label(status).into(),
                dose: None,
                stock_remaining: None,
                stock_warning: None,
                prescription_progress: None,
                prescription_completed: false,
            },
            TransitionOutcome::Applied(applied) => {
                let (stock_remaining, stock_warning) = match &applied.stock {
                    StockEffect::NotApplicable => (None, None),
                    StockEffect::Decremented(d) => (Some(d.remaining), None),
                    StockEffect::Untracked => (
                        None,
                        Some(format!("{} is not tracked in stock", applied.dose.drug_name)),
                    ),
                    StockEffect::Insufficient { available, .. } => (
                        Some(*available),
                        Some(format!(
                            "Insufficient stock for {}. Only {} units available.",
                            applied.dose.drug_name, available
                        )),
                    ),
                    StockEffect::Failed(reason) => {
                        (None, Some(format!("Stock was not updated: {reason}")))
                    }
                };
                Self {
                    applied: true,
                    status: status_label(applied.dose.status).into(),
                    stock_remaining,
                    stock_warning,
                    prescription_progress: applied.prescription.as_ref().map(|p| p.progress),
                    prescription_completed: applied
                        .prescription
                        .as_ref()
                        .is_some_and(|p| p.is_completed()),
                    dose: Some(applied.dose.into()),
                }
            }
        }
    }
}

/// FFI-safe stock item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStockItem {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: f64,
    pub low_stock_threshold: u32,
    pub expiry_date: Option<String>,
    pub supplier: Option<String>,
    pub description: Option<String>,
    /// "out_of_stock", "critical", "low" or "in_stock"
    pub level: String,
}

impl From<StockItem> for FfiStockItem {
    fn from(item: StockItem) -> Self {
        let level = match item.level() {
            models::StockLevel::OutOfStock => "out_of_stock",
            models::StockLevel::Critical => "critical",
            models::StockLevel::Low => "low",
            models::StockLevel::InStock => "in_stock",
        };
        Self {
            id: item.id,
            name: item.name,
            category: item.category,
            quantity: item.quantity,
            unit: item.unit,
            unit_price: item.unit_price,
            low_stock_threshold: item.low_stock_threshold,
            expiry_date: item.expiry_date.map(|d| d.to_string()),
            supplier: item.supplier,
            description: item.description,
            level: level.into(),
        }
    }
}

/// FFI-safe stock intake attributes.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiStockIntake {
    pub category: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<f64>,
    pub low_stock_threshold: Option<u32>,
    pub expiry_date: Option<String>,
    pub supplier: Option<String>,
    pub description: Option<String>,
}

impl TryFrom<FfiStockIntake> for StockIntake {
    type Error = SickbayError;

    fn try_from(intake: FfiStockIntake) -> Result<Self, Self::Error> {
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        Ok(StockIntake {
            category: non_empty(intake.category),
            unit: non_empty(intake.unit),
            unit_price: intake.unit_price,
            low_stock_threshold: intake.low_stock_threshold,
            expiry_date: non_empty(intake.expiry_date)
                .as_deref()
                .map(parse_date)
                .transpose()?,
            supplier: non_empty(intake.supplier),
            description: non_empty(intake.description),
        })
    }
}

/// FFI-safe stock summary for drug pickers.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStockSummary {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: f64,
}

impl From<models::StockSummary> for FfiStockSummary {
    fn from(summary: models::StockSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            category: summary.category,
            quantity: summary.quantity,
            unit: summary.unit,
            unit_price: summary.unit_price,
        }
    }
}

/// FFI-safe stock statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStockStatistics {
    pub item_count: u32,
    pub total_units: u64,
    pub low_stock_count: u32,
    pub total_value: f64,
}

impl From<reports::StockStatistics> for FfiStockStatistics {
    fn from(stats: reports::StockStatistics) -> Self {
        Self {
            item_count: stats.item_count,
            total_units: stats.total_units,
            low_stock_count: stats.low_stock_count,
            total_value: stats.total_value,
        }
    }
}

/// FFI-safe daily dose summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDailySummary {
    pub date: String,
    pub pending: u32,
    pub taken: u32,
    pub missed: u32,
    pub students: u32,
}

impl From<reports::DailyDoseSummary> for FfiDailySummary {
    fn from(summary: reports::DailyDoseSummary) -> Self {
        Self {
            date: summary.date.to_string(),
            pending: summary.pending,
            taken: summary.taken,
            missed: summary.missed,
            students: summary.students,
        }
    }
}

/// FFI-safe per-student day progress.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStudentDay {
    pub student_id: String,
    pub student_name: String,
    pub doses: Vec<FfiDoseRecord>,
    pub taken: u32,
    pub total: u32,
    pub progress: u8,
}

impl From<reports::StudentDayProgress> for FfiStudentDay {
    fn from(day: reports::StudentDayProgress) -> Self {
        Self {
            student_id: day.student_id,
            student_name: day.student_name,
            doses: day.doses.into_iter().map(|d| d.into()).collect(),
            taken: day.taken,
            total: day.total,
            progress: day.progress,
        }
    }
}

/// FFI-safe sweep result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSweepReport {
    /// True if another sweep was still running and this one did nothing
    pub skipped: bool,
    pub missed: u32,
    pub reminders: u32,
    pub failures: u32,
}

impl From<SweepOutcome> for FfiSweepReport {
    fn from(outcome: SweepOutcome) -> Self {
        match outcome {
            SweepOutcome::Skipped => Self {
                skipped: true,
                missed: 0,
                reminders: 0,
                failures: 0,
            },
            SweepOutcome::Completed(report) => Self {
                skipped: false,
                missed: report.missed as u32,
                reminders: report.reminders as u32,
                failures: report.failures as u32,
            },
        }
    }
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    /// "dose_reminder", "low_stock" or "insufficient_stock"
    pub kind: String,
    pub title: String,
    pub body: String,
}

impl From<Notification> for FfiNotification {
    fn from(notification: Notification) -> Self {
        let kind = match notification.kind {
            notify::NotificationKind::DoseReminder => "dose_reminder",
            notify::NotificationKind::LowStock => "low_stock",
            notify::NotificationKind::InsufficientStock => "insufficient_stock",
        };
        Self {
            kind: kind.into(),
            title: notification.title,
            body: notification.body,
        }
    }
}
