//! Dose record database operations.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult, DoseStore};
use crate::models::{DoseRecord, DoseStatus, DoseTransition, TimeSlot};

const DOSE_COLUMNS: &str = r#"
    id, prescription_id, student_id, student_name, drug_name,
    scheduled_date, time_slot, status, notes, recorded_by,
    created_at, taken_at, missed_at, updated_at
"#;

/// Orders slots by time of day rather than alphabetically.
const SLOT_ORDER: &str = "CASE time_slot WHEN 'morning' THEN 0 WHEN 'midday' THEN 1 ELSE 2 END";

impl DoseStore for Database {
    fn insert_dose_record(&self, dose: &DoseRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO dose_records (
                id, prescription_id, student_id, student_name, drug_name,
                scheduled_date, time_slot, status, notes, recorded_by,
                created_at, taken_at, missed_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                dose.id,
                dose.prescription_id,
                dose.student_id,
                dose.student_name,
                dose.drug_name,
                dose.scheduled_date,
                slot_to_string(&dose.slot),
                status_to_string(&dose.status),
                dose.notes,
                dose.recorded_by,
                dose.created_at,
                dose.taken_at,
                dose.missed_at,
                dose.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_dose_record(&self, id: &str) -> DbResult<Option<DoseRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {DOSE_COLUMNS} FROM dose_records WHERE id = ?"),
                [id],
                read_dose_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    fn list_doses_for_prescription(&self, prescription_id: &str) -> DbResult<Vec<DoseRecord>> {
        self.query_doses(
            &format!(
                "SELECT {DOSE_COLUMNS} FROM dose_records
                 WHERE prescription_id = ?1
                 ORDER BY scheduled_date, {SLOT_ORDER}"
            ),
            params![prescription_id],
        )
    }

    fn find_pending_on(&self, date: NaiveDate) -> DbResult<Vec<DoseRecord>> {
        self.query_doses(
            &format!(
                "SELECT {DOSE_COLUMNS} FROM dose_records
                 WHERE scheduled_date = ?1 AND status = 'pending'
                 ORDER BY student_name, student_id, {SLOT_ORDER}"
            ),
            params![date],
        )
    }

    fn find_pending_by_slot(&self, date: NaiveDate, slot: TimeSlot) -> DbResult<Vec<DoseRecord>> {
        self.query_doses(
            &format!(
                "SELECT {DOSE_COLUMNS} FROM dose_records
                 WHERE scheduled_date = ?1 AND time_slot = ?2 AND status = 'pending'
                 ORDER BY student_name, student_id"
            ),
            params![date, slot_to_string(&slot)],
        )
    }

    fn apply_dose_transition(&self, id: &str, transition: &DoseTransition) -> DbResult<bool> {
        let rows_affected = match transition {
            DoseTransition::Taken {
                at,
                notes,
                recorded_by,
            } => self.conn.execute(
                r#"
                UPDATE dose_records SET
                    status = 'taken',
                    taken_at = ?2,
                    notes = ?3,
                    recorded_by = ?4,
                    updated_at = ?2
                WHERE id = ?1 AND status = 'pending'
                "#,
                params![id, at, notes, recorded_by],
            )?,
            DoseTransition::Missed { at } => self.conn.execute(
                r#"
                UPDATE dose_records SET
                    status = 'missed',
                    missed_at = ?2,
                    updated_at = ?2
                WHERE id = ?1 AND status = 'pending'
                "#,
                params![id, at],
            )?,
        };
        Ok(rows_affected > 0)
    }
}

impl Database {
    /// All dose records scheduled on a date, grouped by student in name order.
    pub fn list_doses_on(&self, date: NaiveDate) -> DbResult<Vec<DoseRecord>> {
        self.query_doses(
            &format!(
                "SELECT {DOSE_COLUMNS} FROM dose_records
                 WHERE scheduled_date = ?1
                 ORDER BY student_name, student_id, {SLOT_ORDER}"
            ),
            params![date],
        )
    }

    /// Dose records on a date with the given status, ordered by student name.
    pub fn list_doses_on_with_status(
        &self,
        date: NaiveDate,
        status: DoseStatus,
    ) -> DbResult<Vec<DoseRecord>> {
        self.query_doses(
            &format!(
                "SELECT {DOSE_COLUMNS} FROM dose_records
                 WHERE scheduled_date = ?1 AND status = ?2
                 ORDER BY student_name, student_id, {SLOT_ORDER}"
            ),
            params![date, status_to_string(&status)],
        )
    }

    /// Most recently updated dose records that have been acted on.
    pub fn list_recent_dose_activity(&self, limit: usize) -> DbResult<Vec<DoseRecord>> {
        self.query_doses(
            &format!(
                "SELECT {DOSE_COLUMNS} FROM dose_records
                 WHERE status <> 'pending'
                 ORDER BY updated_at DESC
                 LIMIT ?1"
            ),
            params![limit as i64],
        )
    }

    fn query_doses(&self, sql: &str, params: impl rusqlite::Params) -> DbResult<Vec<DoseRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, read_dose_row)?;

        let mut doses = Vec::new();
        for row in rows {
            doses.push(row?.try_into()?);
        }
        Ok(doses)
    }
}

/// Intermediate row struct for database mapping.
struct DoseRow {
    id: String,
    prescription_id: String,
    student_id: String,
    student_name: String,
    drug_name: String,
    scheduled_date: NaiveDate,
    time_slot: String,
    status: String,
    notes: Option<String>,
    recorded_by: Option<String>,
    created_at: DateTime<Utc>,
    taken_at: Option<DateTime<Utc>>,
    missed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

fn read_dose_row(row: &Row<'_>) -> rusqlite::Result<DoseRow> {
    Ok(DoseRow {
        id: row.get(0)?,
        prescription_id: row.get(1)?,
        student_id: row.get(2)?,
        student_name: row.get(3)?,
        drug_name: row.get(4)?,
        scheduled_date: row.get(5)?,
        time_slot: row.get(6)?,
        status: row.get(7)?,
        notes: row.get(8)?,
        recorded_by: row.get(9)?,
        created_at: row.get(10)?,
        taken_at: row.get(11)?,
        missed_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

impl TryFrom<DoseRow> for DoseRecord {
    type Error = DbError;

    fn try_from(row: DoseRow) -> Result<Self, Self::Error> {
        Ok(DoseRecord {
            id: row.id,
            prescription_id: row.prescription_id,
            student_id: row.student_id,
            student_name: row.student_name,
            drug_name: row.drug_name,
            scheduled_date: row.scheduled_date,
            slot: string_to_slot(&row.time_slot)?,
            status: string_to_status(&row.status)?,
            notes: row.notes,
            recorded_by: row.recorded_by,
            created_at: row.created_at,
            taken_at: row.taken_at,
            missed_at: row.missed_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn slot_to_string(slot: &TimeSlot) -> &'static str {
    match slot {
        TimeSlot::Morning => "morning",
        TimeSlot::Midday => "midday",
        TimeSlot::Evening => "evening",
    }
}

fn string_to_slot(s: &str) -> Result<TimeSlot, DbError> {
    match s {
        "morning" => Ok(TimeSlot::Morning),
        "midday" => Ok(TimeSlot::Midday),
        "evening" => Ok(TimeSlot::Evening),
        _ => Err(DbError::Constraint(format!("Unknown time slot: {}", s))),
    }
}

fn status_to_string(status: &DoseStatus) -> &'static str {
    match status {
        DoseStatus::Pending => "pending",
        DoseStatus::Taken => "taken",
        DoseStatus::Missed => "missed",
    }
}

fn string_to_status(s: &str) -> Result<DoseStatus, DbError> {
    match s {
        "pending" => Ok(DoseStatus::Pending),
        "taken" => Ok(DoseStatus::Taken),
        "missed" => Ok(DoseStatus::Missed),
        _ => Err(DbError::Constraint(format!("Unknown dose status: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PrescriptionStore;
    use crate::models::{Prescription, Student};
    use chrono::{FixedOffset, TimeZone};

    fn now() -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .unwrap()
    }

    fn setup_db() -> (Database, Prescription) {
        let db = Database::open_in_memory().unwrap();
        let student = Student::new("Amara Okafor".into());
        db.insert_student(&student).unwrap();
        let rx = Prescription::new(&student, "Paracetamol".into(), "1x2".into(), 2, now());
        db.insert_prescription(&rx).unwrap();
        (db, rx)
    }

    fn make_dose(rx: &Prescription, date: NaiveDate, slot: TimeSlot) -> DoseRecord {
        let at = now().with_timezone(&Utc);
        DoseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            prescription_id: rx.id.clone(),
            student_id: rx.student_id.clone(),
            student_name: rx.student_name.clone(),
            drug_name: rx.drug_name.clone(),
            scheduled_date: date,
            slot,
            status: DoseStatus::Pending,
            notes: None,
            recorded_by: None,
            created_at: at,
            taken_at: None,
            missed_at: None,
            updated_at: at,
        }
    }

    #[test]
    fn test_insert_and_get_dose() {
        let (db, rx) = setup_db();
        let dose = make_dose(&rx, rx.start_date, TimeSlot::Evening);
        db.insert_dose_record(&dose).unwrap();

        let retrieved = db.get_dose_record(&dose.id).unwrap().unwrap();
        assert_eq!(retrieved, dose);
    }

    #[test]
    fn test_find_pending_by_slot() {
        let (db, rx) = setup_db();
        let today = rx.start_date;
        let tomorrow = today.succ_opt().unwrap();

        db.insert_dose_record(&make_dose(&rx, today, TimeSlot::Morning)).unwrap();
        db.insert_dose_record(&make_dose(&rx, today, TimeSlot::Evening)).unwrap();
        db.insert_dose_record(&make_dose(&rx, tomorrow, TimeSlot::Morning)).unwrap();

        let morning = db.find_pending_by_slot(today, TimeSlot::Morning).unwrap();
        assert_eq!(morning.len(), 1);
        assert_eq!(morning[0].scheduled_date, today);

        assert_eq!(db.find_pending_on(today).unwrap().len(), 2);
        assert_eq!(db.list_doses_for_prescription(&rx.id).unwrap().len(), 3);
    }

    #[test]
    fn test_transition_only_once() {
        let (db, rx) = setup_db();
        let dose = make_dose(&rx, rx.start_date, TimeSlot::Morning);
        db.insert_dose_record(&dose).unwrap();

        let at = now().with_timezone(&Utc);
        let taken = DoseTransition::Taken {
            at,
            notes: Some("with water".into()),
            recorded_by: Some("nurse-1".into()),
        };
        assert!(db.apply_dose_transition(&dose.id, &taken).unwrap());
        assert!(!db.apply_dose_transition(&dose.id, &taken).unwrap());
        assert!(!db
            .apply_dose_transition(&dose.id, &DoseTransition::Missed { at })
            .unwrap());

        let retrieved = db.get_dose_record(&dose.id).unwrap().unwrap();
        assert_eq!(retrieved.status, DoseStatus::Taken);
        assert_eq!(retrieved.taken_at, Some(at));
        assert_eq!(retrieved.notes, Some("with water".into()));
        assert!(retrieved.missed_at.is_none());
        assert!(db.find_pending_on(rx.start_date).unwrap().is_empty());
    }

    #[test]
    fn test_transition_unknown_dose() {
        let (db, _) = setup_db();
        let at = now().with_timezone(&Utc);
        assert!(!db
            .apply_dose_transition("missing", &DoseTransition::Missed { at })
            .unwrap());
    }

    #[test]
    fn test_list_doses_with_status() {
        let (db, rx) = setup_db();
        let dose = make_dose(&rx, rx.start_date, TimeSlot::Morning);
        db.insert_dose_record(&dose).unwrap();
        db.insert_dose_record(&make_dose(&rx, rx.start_date, TimeSlot::Evening)).unwrap();

        let at = now().with_timezone(&Utc);
        db.apply_dose_transition(&dose.id, &DoseTransition::Missed { at }).unwrap();

        let missed = db
            .list_doses_on_with_status(rx.start_date, DoseStatus::Missed)
            .unwrap();
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].id, dose.id);
        assert_eq!(db.list_doses_on(rx.start_date).unwrap().len(), 2);
        assert_eq!(db.list_recent_dose_activity(10).unwrap().len(), 1);
    }
}
