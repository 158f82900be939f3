//! Prescription database operations.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult, PrescriptionStore};
use crate::models::{Prescription, PrescriptionStatus, ProgressUpdate};

const PRESCRIPTION_COLUMNS: &str = r#"
    id, student_id, student_name, drug_name, dosage, duration_days, notes,
    status, progress, taken_doses, total_doses, start_date,
    created_at, started_at, completed_at, updated_at
"#;

impl PrescriptionStore for Database {
    fn insert_prescription(&self, rx: &Prescription) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO prescriptions (
                id, student_id, student_name, drug_name, dosage, duration_days, notes,
                status, progress, taken_doses, total_doses, start_date,
                created_at, started_at, completed_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                rx.id,
                rx.student_id,
                rx.student_name,
                rx.drug_name,
                rx.dosage,
                rx.duration_days,
                rx.notes,
                status_to_string(&rx.status),
                rx.progress,
                rx.taken_doses,
                rx.total_doses,
                rx.start_date,
                rx.created_at,
                rx.started_at,
                rx.completed_at,
                rx.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_prescription(&self, id: &str) -> DbResult<Option<Prescription>> {
        self.conn
            .query_row(
                &format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = ?"),
                [id],
                read_prescription_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    fn update_prescription_progress(&self, id: &str, update: &ProgressUpdate) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE prescriptions SET
                taken_doses = ?2,
                total_doses = ?3,
                progress = ?4,
                status = ?5,
                completed_at = CASE WHEN ?5 = 'completed'
                    THEN COALESCE(completed_at, ?6) ELSE NULL END,
                updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                id,
                update.taken_doses,
                update.total_doses,
                update.progress,
                status_to_string(&update.status),
                update.completed_at,
                update.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }
}

impl Database {
    /// Completed prescriptions, newest first.
    pub fn list_completed_prescriptions(&self) -> DbResult<Vec<Prescription>> {
        self.query_prescriptions(
            &format!(
                "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions
                 WHERE status = 'completed'
                 ORDER BY created_at DESC"
            ),
            [],
        )
    }

    /// All prescriptions for a student, newest first.
    pub fn list_prescriptions_for_student(&self, student_id: &str) -> DbResult<Vec<Prescription>> {
        self.query_prescriptions(
            &format!(
                "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions
                 WHERE student_id = ?1
                 ORDER BY created_at DESC"
            ),
            params![student_id],
        )
    }

    fn query_prescriptions(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, read_prescription_row)?;

        let mut prescriptions = Vec::new();
        for row in rows {
            prescriptions.push(row?.try_into()?);
        }
        Ok(prescriptions)
    }
}

/// Intermediate row struct for database mapping.
struct PrescriptionRow {
    id: String,
    student_id: String,
    student_name: String,
    drug_name: String,
    dosage: String,
    duration_days: u32,
    notes: Option<String>,
    status: String,
    progress: u8,
    taken_doses: u32,
    total_doses: u32,
    start_date: NaiveDate,
    created_at: DateTime<Utc>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

fn read_prescription_row(row: &Row<'_>) -> rusqlite::Result<PrescriptionRow> {
    Ok(PrescriptionRow {
        id: row.get(0)?,
        student_id: row.get(1)?,
        student_name: row.get(2)?,
        drug_name: row.get(3)?,
        dosage: row.get(4)?,
        duration_days: row.get(5)?,
        notes: row.get(6)?,
        status: row.get(7)?,
        progress: row.get(8)?,
        taken_doses: row.get(9)?,
        total_doses: row.get(10)?,
        start_date: row.get(11)?,
        created_at: row.get(12)?,
        started_at: row.get(13)?,
        completed_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

impl TryFrom<PrescriptionRow> for Prescription {
    type Error = DbError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        Ok(Prescription {
            id: row.id,
            student_id: row.student_id,
            student_name: row.student_name,
            drug_name: row.drug_name,
            dosage: row.dosage,
            duration_days: row.duration_days,
            notes: row.notes,
            status: string_to_status(&row.status)?,
            progress: row.progress,
            taken_doses: row.taken_doses,
            total_doses: row.total_doses,
            start_date: row.start_date,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            updated_at: row.updated_at,
        })
    }
}

fn status_to_string(status: &PrescriptionStatus) -> &'static str {
    match status {
        PrescriptionStatus::Active => "active",
        PrescriptionStatus::Completed => "completed",
    }
}

fn string_to_status(s: &str) -> Result<PrescriptionStatus, DbError> {
    match s {
        "active" => Ok(PrescriptionStatus::Active),
        "completed" => Ok(PrescriptionStatus::Completed),
        _ => Err(DbError::Constraint(format!("Unknown prescription status: {}", s))),
    }
}
