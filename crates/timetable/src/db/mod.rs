/// Database module for storing subjects and timetable periods

mod types;

pub use types::{NewPeriod, NewSubject, Period, Subject};

use crate::error::TimetableError;
use rusqlite::{Connection, OptionalExtension, Row};
use std::sync::{Mutex, MutexGuard};

const SCHEMA_SQL: &str = include_str!("../../sql/init_timetable.sql");

/// Persistence boundary for subjects and periods.
///
/// Every call is scoped to an explicit user id. Implementations must be
/// `Send + Sync` so they can sit in the shared server state.
pub trait TimetableStore: Send + Sync {
    /// Lists the user's subjects in creation order.
    fn list_subjects(&self, user_id: &str) -> Result<Vec<Subject>, TimetableError>;

    /// Creates a subject and returns the stored record.
    fn create_subject(&self, user_id: &str, subject: &NewSubject)
        -> Result<Subject, TimetableError>;

    /// Lists the user's periods ordered by day, start time and id.
    fn list_periods(&self, user_id: &str) -> Result<Vec<Period>, TimetableError>;

    /// Creates a period and returns the stored record.
    fn create_period(&self, user_id: &str, period: &NewPeriod) -> Result<Period, TimetableError>;

    /// Deletes a period. Returns false if the user has no such period.
    fn delete_period(&self, user_id: &str, period_id: i64) -> Result<bool, TimetableError>;
}

pub struct TimetableDb {
    db: Mutex<Connection>,
}

impl TimetableDb {
    /// Opens (or creates) the database at `db_path` and initializes the schema
    pub fn open(db_path: &str) -> Result<Self, TimetableError> {
        Self::init(Connection::open(db_path)?)
    }

    /// Creates a private in-memory database
    pub fn open_in_memory() -> Result<Self, TimetableError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, TimetableError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, TimetableError> {
        self.db.lock().map_err(|_| TimetableError::Persistence {
            message: "database lock poisoned".to_string(),
        })
    }

    /// Looks up a single subject owned by the user
    pub fn get_subject(
        &self,
        user_id: &str,
        subject_id: i64,
    ) -> Result<Option<Subject>, TimetableError> {
        let db = self.conn()?;
        let subject = db
            .query_row(
                "SELECT subject_id, user_id, name, color, is_active
                 FROM subjects
                 WHERE user_id = ?1 AND subject_id = ?2",
                (user_id, subject_id),
                subject_from_row,
            )
            .optional()?;

        Ok(subject)
    }
}

impl TimetableStore for TimetableDb {
    fn list_subjects(&self, user_id: &str) -> Result<Vec<Subject>, TimetableError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT subject_id, user_id, name, color, is_active
             FROM subjects
             WHERE user_id = ?
             ORDER BY subject_id",
        )?;

        let subjects = stmt
            .query_map([user_id], subject_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(subjects)
    }

    fn create_subject(
        &self,
        user_id: &str,
        subject: &NewSubject,
    ) -> Result<Subject, TimetableError> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO subjects (user_id, name, color, is_active, created_at)
             VALUES (?1, ?2, ?3, 1, datetime('now'))",
            (user_id, &subject.name, &subject.color),
        )?;

        Ok(Subject {
            id: db.last_insert_rowid(),
            user_id: user_id.to_string(),
            name: subject.name.clone(),
            color: subject.color.clone(),
            is_active: true,
        })
    }

    fn list_periods(&self, user_id: &str) -> Result<Vec<Period>, TimetableError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT period_id, user_id, subject_id, day_of_week, start_time, end_time,
                    location, teacher, notes
             FROM periods
             WHERE user_id = ?
             ORDER BY day_of_week, start_time, period_id",
        )?;

        let periods = stmt
            .query_map([user_id], period_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(periods)
    }

    fn create_period(&self, user_id: &str, period: &NewPeriod) -> Result<Period, TimetableError> {
        // The subject must belong to the same user
        if self.get_subject(user_id, period.subject_id)?.is_none() {
            return Err(TimetableError::NotFound {
                what: format!("subject {}", period.subject_id),
            });
        }

        let db = self.conn()?;
        db.execute(
            "INSERT INTO periods (
                user_id, subject_id, day_of_week, start_time, end_time,
                location, teacher, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))",
            (
                user_id,
                period.subject_id,
                period.day_of_week,
                &period.start_time,
                &period.end_time,
                &period.location,
                &period.teacher,
                &period.notes,
            ),
        )?;

        Ok(Period {
            id: db.last_insert_rowid(),
            user_id: user_id.to_string(),
            subject_id: period.subject_id,
            day_of_week: period.day_of_week,
            start_time: period.start_time.clone(),
            end_time: period.end_time.clone(),
            location: period.location.clone(),
            teacher: period.teacher.clone(),
            notes: period.notes.clone(),
        })
    }

    fn delete_period(&self, user_id: &str, period_id: i64) -> Result<bool, TimetableError> {
        let db = self.conn()?;
        let deleted = db.execute(
            "DELETE FROM periods WHERE user_id = ?1 AND period_id = ?2",
            (user_id, period_id),
        )?;

        Ok(deleted > 0)
    }
}

fn subject_from_row(row: &Row<'_>) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        is_active: row.get(4)?,
    })
}

fn period_from_row(row: &Row<'_>) -> rusqlite::Result<Period> {
    Ok(Period {
        id: row.get(0)?,
        user_id: row.get(1)?,
        subject_id: row.get(2)?,
        day_of_week: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        location: row.get(6)?,
        teacher: row.get(7)?,
        notes: row.get(8)?,
    })
}
