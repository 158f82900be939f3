//! Dose and treatment reports.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compliance::progress_percent;
use crate::db::{Database, DbResult};
use crate::models::{DoseRecord, DoseStatus, Prescription};

/// Dose counts for one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyDoseSummary {
    pub date: NaiveDate,
    pub pending: u32,
    pub taken: u32,
    pub missed: u32,
    /// Distinct students with at least one dose that day
    pub students: u32,
}

impl DailyDoseSummary {
    pub fn total(&self) -> u32 {
        self.pending + self.taken + self.missed
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One student's doses for a day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentDayProgress {
    pub student_id: String,
    pub student_name: String,
    pub doses: Vec<DoseRecord>,
    pub taken: u32,
    pub total: u32,
    /// Percentage of the day's doses taken
    pub progress: u8,
}

pub fn daily_dose_summary(db: &Database, date: NaiveDate) -> DbResult<DailyDoseSummary> {
    let doses = db.list_doses_on(date)?;

    let mut summary = DailyDoseSummary {
        date,
        pending: 0,
        taken: 0,
        missed: 0,
        students: 0,
    };
    let mut students = HashSet::new();
    for dose in &doses {
        match dose.status {
            DoseStatus::Pending => summary.pending += 1,
            DoseStatus::Taken => summary.taken += 1,
            DoseStatus::Missed => summary.missed += 1,
        }
        students.insert(dose.student_id.as_str());
    }
    summary.students = students.len() as u32;
    Ok(summary)
}

/// The day's doses grouped by student, in student name order.
pub fn student_day_board(db: &Database, date: NaiveDate) -> DbResult<Vec<StudentDayProgress>> {
    let mut board: Vec<StudentDayProgress> = Vec::new();

    // Rows arrive ordered by student name then id, so each student's doses are contiguous
    for dose in db.list_doses_on(date)? {
        match board.last_mut() {
            Some(entry) if entry.student_id == dose.student_id => entry.doses.push(dose),
            _ => board.push(StudentDayProgress {
                student_id: dose.student_id.clone(),
                student_name: dose.student_name.clone(),
                doses: vec![dose],
                taken: 0,
                total: 0,
                progress: 0,
            }),
        }
    }

    for entry in &mut board {
        entry.total = entry.doses.len() as u32;
        entry.taken = entry
            .doses
            .iter()
            .filter(|d| d.status == DoseStatus::Taken)
            .count() as u32;
        entry.progress = progress_percent(entry.taken, entry.total);
    }
    Ok(board)
}

/// Doses missed on a date, by student name.
pub fn missed_doses_on(db: &Database, date: NaiveDate) -> DbResult<Vec<DoseRecord>> {
    db.list_doses_on_with_status(date, DoseStatus::Missed)
}

/// Completed prescriptions, newest first.
pub fn completed_treatments(db: &Database) -> DbResult<Vec<Prescription>> {
    db.list_completed_prescriptions()
}

/// Latest taken or missed doses.
pub fn recent_dose_activity(db: &Database, limit: usize) -> DbResult<Vec<DoseRecord>> {
    db.list_recent_dose_activity(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::compliance::DoseTracker;
    use crate::models::Student;
    use crate::notify::MemorySink;
    use crate::schedule::{NewPrescription, Scheduler};
    use chrono::{FixedOffset, TimeZone};

    fn clock_at(hour: u32) -> FixedClock {
        FixedClock(
            FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2026, 3, 2, hour, 0, 0)
                .unwrap(),
        )
    }

    fn prescribe(db: &Database, name: &str, dosage: &str) -> Vec<DoseRecord> {
        let student = Student::new(name.into());
        db.insert_student(&student).unwrap();
        Scheduler::new(db, &clock_at(7))
            .create_prescription(NewPrescription {
                student_id: student.id,
                drug_name: "Paracetamol".into(),
                dosage: dosage.into(),
                duration_days: 2,
                notes: None,
            })
            .unwrap()
            .1
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn test_daily_summary_and_board() {
        let db = Database::open_in_memory().unwrap();
        let zara = prescribe(&db, "Zara Musa", "1x2");
        let amara = prescribe(&db, "Amara Okafor", "1x3");

        let clock = clock_at(15);
        let sink = MemorySink::new();
        let tracker = DoseTracker::new(&db, &clock, &sink);
        tracker.mark_taken(&amara[0].id, None, None).unwrap();
        tracker.mark_missed(&amara[1].id).unwrap();
        tracker.mark_taken(&zara[0].id, None, None).unwrap();

        let summary = daily_dose_summary(&db, today()).unwrap();
        assert_eq!(summary.taken, 2);
        assert_eq!(summary.missed, 1);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.students, 2);
        assert_eq!(summary.total(), 5);
        assert!(summary.to_json().unwrap().contains("\"pending\": 2"));

        let board = student_day_board(&db, today()).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].student_name, "Amara Okafor");
        assert_eq!((board[0].taken, board[0].total, board[0].progress), (1, 3, 33));
        assert_eq!(board[1].student_name, "Zara Musa");
        assert_eq!((board[1].taken, board[1].total, board[1].progress), (1, 2, 50));

        let missed = missed_doses_on(&db, today()).unwrap();
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].id, amara[1].id);

        let recent = recent_dose_activity(&db, 10).unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent.iter().all(|d| d.status.is_terminal()));
    }

    #[test]
    fn test_board_keeps_same_named_students_apart() {
        let db = Database::open_in_memory().unwrap();
        let first = prescribe(&db, "Amara Okafor", "1x2");
        let second = prescribe(&db, "Amara Okafor", "1x2");

        let clock = clock_at(15);
        let sink = MemorySink::new();
        DoseTracker::new(&db, &clock, &sink)
            .mark_taken(&first[0].id, None, None)
            .unwrap();

        let board = student_day_board(&db, today()).unwrap();
        assert_eq!(board.len(), 2);
        assert!(board.iter().all(|entry| entry.total == 2));
        assert!(board.iter().all(|entry| entry.doses.iter().all(|d| d.student_id == entry.student_id)));

        let first_entry = board
            .iter()
            .find(|entry| entry.student_id == first[0].student_id)
            .unwrap();
        assert_eq!((first_entry.taken, first_entry.progress), (1, 50));
        let second_entry = board
            .iter()
            .find(|entry| entry.student_id == second[0].student_id)
            .unwrap();
        assert_eq!((second_entry.taken, second_entry.progress), (0, 0));
    }

    #[test]
    fn test_empty_day() {
        let db = Database::open_in_memory().unwrap();
        let summary = daily_dose_summary(&db, today()).unwrap();
        assert_eq!(summary.total(), 0);
        assert_eq!(summary.students, 0);
        assert!(student_day_board(&db, today()).unwrap().is_empty());
    }

    #[test]
    fn test_completed_treatments() {
        let db = Database::open_in_memory().unwrap();
        let student = Student::new("Amara Okafor".into());
        db.insert_student(&student).unwrap();
        let (rx, doses) = Scheduler::new(&db, &clock_at(7))
            .create_prescription(NewPrescription {
                student_id: student.id.clone(),
                drug_name: "Ibuprofen".into(),
                dosage: "1x1".into(),
                duration_days: 1,
                notes: None,
            })
            .unwrap();
        assert!(completed_treatments(&db).unwrap().is_empty());

        let clock = clock_at(8);
        let sink = MemorySink::new();
        DoseTracker::new(&db, &clock, &sink)
            .mark_taken(&doses[0].id, None, None)
            .unwrap();

        let completed = completed_treatments(&db).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, rx.id);
        assert_eq!(completed[0].completed_at, Some(clock.now_utc()));
    }
}
