//! Student database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult, StudentStore};
use crate::models::Student;

impl StudentStore for Database {
    fn get_student(&self, id: &str) -> DbResult<Option<Student>> {
        self.conn
            .query_row(
                "SELECT id, name, house, class FROM students WHERE id = ?",
                [id],
                |row| {
                    Ok(Student {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        house: row.get(2)?,
                        class: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

impl Database {
    /// Insert or update a student.
    pub fn insert_student(&self, student: &Student) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO students (id, name, house, class)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                house = excluded.house,
                class = excluded.class
            "#,
            params![student.id, student.name, student.house, student.class],
        )?;
        Ok(())
    }

    /// List all students by name.
    pub fn list_students(&self) -> DbResult<Vec<Student>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, house, class FROM students ORDER BY name")?;

        let rows = stmt.query_map([], |row| {
            Ok(Student {
                id: row.get(0)?,
                name: row.get(1)?,
                house: row.get(2)?,
                class: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();

        let mut student = Student::new("Amara Okafor".into());
        student.house = Some("Aggrey".into());
        student.class = Some("Form 2B".into());
        db.insert_student(&student).unwrap();

        let retrieved = db.get_student(&student.id).unwrap().unwrap();
        assert_eq!(retrieved, student);
        assert!(db.get_student("missing").unwrap().is_none());
    }

    #[test]
    fn test_insert_updates_existing() {
        let db = Database::open_in_memory().unwrap();

        let mut student = Student::new("Kofi".into());
        db.insert_student(&student).unwrap();
        student.house = Some("Guggisberg".into());
        db.insert_student(&student).unwrap();

        let students = db.list_students().unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].house, Some("Guggisberg".into()));
    }
}
