/// Timetable import: recognizer output to stored periods
mod recognizer;
mod resolver;
mod types;

pub use recognizer::{parse_recognizer_response, RecognizerClient, RecognizerConfig};
pub use resolver::{
    palette_color, word_similarity, AbbreviationMatch, ContainmentMatch, ExactMatch,
    MatchStrategy, Resolution, SubjectResolver, WordOverlapMatch, SUBJECT_PALETTE,
};
pub use types::*;

use crate::db::{NewPeriod, Subject, TimetableStore};
use crate::error::TimetableError;
use crate::time::normalize_range;
use crate::types::AppState;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Turns raw recognized periods into stored periods.
///
/// Each period is handled on its own: a bad time, a failed subject create or
/// a failed period insert is recorded and the batch moves on. Nothing is
/// rolled back.
#[derive(Default)]
pub struct PeriodIngestor {
    resolver: SubjectResolver,
}

impl PeriodIngestor {
    pub fn new(resolver: SubjectResolver) -> Self {
        Self { resolver }
    }

    /// Ingests a batch of raw periods for one user.
    ///
    /// # Arguments
    /// * `store` - Where subjects and periods are written
    /// * `user_id` - Owner of every record created
    /// * `raw_periods` - Recognizer output, in order
    /// * `existing_subjects` - The user's current subject catalog
    ///
    /// # Returns
    /// The number of periods stored, the stored records, any subjects created
    /// along the way, and one failure report per period that was skipped.
    pub fn ingest<S: TimetableStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
        raw_periods: &[RawPeriod],
        existing_subjects: &[Subject],
    ) -> IngestResult {
        let mut result = IngestResult::default();

        // Working catalog: grows as subjects are created so a repeated
        // unresolved name maps to the subject made for its first occurrence.
        let mut catalog: Vec<Subject> = existing_subjects.to_vec();
        let mut created_by_name: HashMap<String, i64> = HashMap::new();

        for (index, raw) in raw_periods.iter().enumerate() {
            let outcome = self
                .validate(raw)
                .and_then(|(start, end, day)| {
                    let subject_id = self.resolve_subject(
                        store,
                        user_id,
                        raw,
                        &mut catalog,
                        &mut created_by_name,
                        &mut result,
                    )?;
                    Ok(NewPeriod {
                        subject_id,
                        day_of_week: day,
                        start_time: start,
                        end_time: end,
                        location: non_blank(&raw.location),
                        teacher: non_blank(&raw.teacher),
                        notes: None,
                    })
                })
                .and_then(|period| store.create_period(user_id, &period));

            match outcome {
                Ok(period) => {
                    result.created += 1;
                    result.periods.push(period);
                }
                Err(error) => {
                    warn!(
                        user_id = %user_id,
                        index = index,
                        subject = %raw.subject_text,
                        error = %error,
                        "Skipping period"
                    );
                    result.failures.push(FailureReport {
                        index,
                        subject_text: raw.subject_text.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            user_id = %user_id,
            submitted = raw_periods.len(),
            created = result.created,
            new_subjects = result.new_subjects.len(),
            failed = result.failures.len(),
            "Ingested timetable periods"
        );

        result
    }

    /// Normalizes times and checks the day before any subject is touched.
    fn validate(&self, raw: &RawPeriod) -> Result<(String, String, u8), TimetableError> {
        let (start, end) = normalize_range(&raw.start_time, &raw.end_time)?;
        let day = validate_day(raw.day_of_week)?;
        if raw.subject_text.trim().is_empty() {
            return Err(TimetableError::EmptySubjectName);
        }

        Ok((start, end, day))
    }

    fn resolve_subject<S: TimetableStore + ?Sized>(
        &self,
        store: &S,
        user_id: &str,
        raw: &RawPeriod,
        catalog: &mut Vec<Subject>,
        created_by_name: &mut HashMap<String, i64>,
        result: &mut IngestResult,
    ) -> Result<i64, TimetableError> {
        let key = raw.subject_text.trim().to_lowercase();
        if let Some(&subject_id) = created_by_name.get(&key) {
            return Ok(subject_id);
        }

        match self.resolver.resolve(&raw.subject_text, catalog) {
            Resolution::Existing { subject_id, .. } => Ok(subject_id),
            Resolution::Create(new_subject) => {
                let subject = store.create_subject(user_id, &new_subject)?;
                info!(
                    user_id = %user_id,
                    subject_id = subject.id,
                    name = %subject.name,
                    "Created subject from import"
                );

                created_by_name.insert(key, subject.id);
                catalog.push(subject.clone());
                result.new_subjects.push(subject.clone());
                Ok(subject.id)
            }
        }
    }
}

/// Checks a day-of-week number is in 0..=6.
pub fn validate_day(day: i64) -> Result<u8, TimetableError> {
    u8::try_from(day)
        .ok()
        .filter(|d| *d <= 6)
        .ok_or(TimetableError::InvalidDay { day })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Ingests already-recognized periods for a user.
///
/// An empty batch is treated like an empty recognizer result and nothing is
/// written.
pub fn ingest_timetable(
    state: &Arc<AppState>,
    user_id: &str,
    raw_periods: &[RawPeriod],
) -> Result<IngestResult, TimetableError> {
    if raw_periods.is_empty() {
        return Err(TimetableError::RecognizerEmpty);
    }

    // Always resolve against the latest catalog
    let existing = state.store.list_subjects(user_id)?;
    Ok(state
        .ingestor
        .ingest(state.store.as_ref(), user_id, raw_periods, &existing))
}

/// Sends a timetable image to the recognizer and ingests whatever it finds.
///
/// The recognizer is called once with no retries. If it finds nothing the
/// import stops before anything is written.
pub async fn import_timetable_image(
    state: &Arc<AppState>,
    user_id: &str,
    request: &ImportRequest,
) -> Result<IngestResult, TimetableError> {
    let existing = state.store.list_subjects(user_id)?;
    let names: Vec<String> = existing.iter().map(|s| s.name.clone()).collect();

    let raw_periods = state.recognizer.recognize(request, &names).await?;
    if raw_periods.is_empty() {
        return Err(TimetableError::RecognizerEmpty);
    }

    ingest_timetable(state, user_id, &raw_periods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewSubject, Period, TimetableDb};
    use std::sync::Mutex;

    fn raw(subject: &str, day: i64, start: &str, end: &str) -> RawPeriod {
        RawPeriod {
            subject_text: subject.to_string(),
            day_of_week: day,
            start_time: start.to_string(),
            end_time: end.to_string(),
            location: None,
            teacher: None,
        }
    }

    #[test]
    fn test_valid_periods_survive_a_bad_one() {
        let db = TimetableDb::open_in_memory().unwrap();
        let batch = vec![
            raw("Math", 1, "09:00", "10:00"),
            raw("Physics", 1, "10:00", "11:30"),
            raw("Chemistry", 2, "10:00", "10:00"),
            raw("Math", 3, "13:00:00", "14:00:00"),
        ];

        let result = PeriodIngestor::default().ingest(&db, "alice", &batch, &[]);

        assert_eq!(result.created, 3);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].index, 2);
        assert!(matches!(
            result.failures[0].error,
            TimetableError::InvalidPeriodRange { .. }
        ));
        assert!(result.is_partial());
        assert_eq!(db.list_periods("alice").unwrap().len(), 3);

        // The dropped period never created its subject
        let names: Vec<String> = db
            .list_subjects("alice")
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Math", "Physics"]);
    }

    #[test]
    fn test_repeated_unknown_name_creates_one_subject() {
        let db = TimetableDb::open_in_memory().unwrap();
        let batch = vec![
            raw("Organic Chemistry", 1, "09:00", "10:00"),
            raw("organic chemistry ", 3, "09:00", "10:00"),
            raw("Organic Chemistry", 5, "09:00", "10:00"),
        ];

        let result = PeriodIngestor::default().ingest(&db, "alice", &batch, &[]);

        assert_eq!(result.created, 3);
        assert_eq!(result.new_subjects.len(), 1);
        let subject_id = result.new_subjects[0].id;
        assert!(result.periods.iter().all(|p| p.subject_id == subject_id));
    }

    #[test]
    fn test_resolves_against_existing_catalog() {
        let db = TimetableDb::open_in_memory().unwrap();
        let networks = db
            .create_subject(
                "alice",
                &NewSubject {
                    name: "Computer Networks".to_string(),
                    color: SUBJECT_PALETTE[2].to_string(),
                },
            )
            .unwrap();

        let result = PeriodIngestor::default().ingest(
            &db,
            "alice",
            &[raw("CN", 2, "08:00", "09:00")],
            &[networks.clone()],
        );

        assert!(result.new_subjects.is_empty());
        assert_eq!(result.periods[0].subject_id, networks.id);
    }

    #[test]
    fn test_new_subject_colors_continue_round_robin() {
        let db = TimetableDb::open_in_memory().unwrap();
        let batch = vec![
            raw("Biology", 1, "09:00", "10:00"),
            raw("History", 1, "10:00", "11:00"),
        ];

        let result = PeriodIngestor::default().ingest(&db, "alice", &batch, &[]);

        let colors: Vec<&str> = result.new_subjects.iter().map(|s| s.color.as_str()).collect();
        assert_eq!(colors, vec![SUBJECT_PALETTE[0], SUBJECT_PALETTE[1]]);
    }

    #[test]
    fn test_bad_time_and_day_are_reported() {
        let db = TimetableDb::open_in_memory().unwrap();
        let batch = vec![
            raw("Math", 1, "9", "10:00"),
            raw("Math", 7, "09:00", "10:00"),
            raw("   ", 1, "09:00", "10:00"),
        ];

        let result = PeriodIngestor::default().ingest(&db, "alice", &batch, &[]);

        assert_eq!(result.created, 0);
        let errors: Vec<TimetableError> = result.failures.into_iter().map(|f| f.error).collect();
        assert_eq!(
            errors,
            vec![
                TimetableError::InvalidTimeFormat {
                    input: "9".to_string()
                },
                TimetableError::InvalidDay { day: 7 },
                TimetableError::EmptySubjectName,
            ]
        );
        assert!(db.list_subjects("alice").unwrap().is_empty());
    }

    #[test]
    fn test_blank_optional_fields_dropped() {
        let db = TimetableDb::open_in_memory().unwrap();
        let mut period = raw("Math", 1, "09:00", "10:00");
        period.location = Some("  ".to_string());
        period.teacher = Some(" Dr. Rao ".to_string());

        let result = PeriodIngestor::default().ingest(&db, "alice", &[period], &[]);

        assert_eq!(result.periods[0].location, None);
        assert_eq!(result.periods[0].teacher.as_deref(), Some("Dr. Rao"));
    }

    /// Store that refuses to create one named subject and fails every Nth period.
    struct FlakyStore {
        inner: TimetableDb,
        bad_subject: &'static str,
        period_calls: Mutex<usize>,
        fail_period_call: usize,
    }

    impl TimetableStore for FlakyStore {
        fn list_subjects(&self, user_id: &str) -> Result<Vec<Subject>, TimetableError> {
            self.inner.list_subjects(user_id)
        }

        fn create_subject(
            &self,
            user_id: &str,
            subject: &NewSubject,
        ) -> Result<Subject, TimetableError> {
            if subject.name == self.bad_subject {
                return Err(TimetableError::Persistence {
                    message: "insert rejected".to_string(),
                });
            }
            self.inner.create_subject(user_id, subject)
        }

        fn list_periods(&self, user_id: &str) -> Result<Vec<Period>, TimetableError> {
            self.inner.list_periods(user_id)
        }

        fn create_period(
            &self,
            user_id: &str,
            period: &NewPeriod,
        ) -> Result<Period, TimetableError> {
            let mut calls = self.period_calls.lock().unwrap();
            *calls += 1;
            if *calls == self.fail_period_call {
                return Err(TimetableError::Persistence {
                    message: "write timed out".to_string(),
                });
            }
            self.inner.create_period(user_id, period)
        }

        fn delete_period(&self, user_id: &str, period_id: i64) -> Result<bool, TimetableError> {
            self.inner.delete_period(user_id, period_id)
        }
    }

    #[test]
    fn test_persistence_failures_do_not_roll_back() {
        let store = FlakyStore {
            inner: TimetableDb::open_in_memory().unwrap(),
            bad_subject: "Art",
            period_calls: Mutex::new(0),
            fail_period_call: 2,
        };
        let batch = vec![
            raw("Math", 1, "09:00", "10:00"),
            raw("Art", 1, "10:00", "11:00"),
            raw("Math", 2, "09:00", "10:00"),
            raw("Math", 3, "09:00", "10:00"),
        ];

        let result = PeriodIngestor::default().ingest(&store, "alice", &batch, &[]);

        // Art fails at subject creation; the second period insert fails
        assert_eq!(result.created, 2);
        let failed: Vec<usize> = result.failures.iter().map(|f| f.index).collect();
        assert_eq!(failed, vec![1, 2]);
        assert!(result
            .failures
            .iter()
            .all(|f| matches!(f.error, TimetableError::Persistence { .. })));
        assert_eq!(store.list_periods("alice").unwrap().len(), 2);
    }

    #[test]
    fn test_validate_day() {
        assert_eq!(validate_day(0), Ok(0));
        assert_eq!(validate_day(6), Ok(6));
        assert_eq!(validate_day(-1), Err(TimetableError::InvalidDay { day: -1 }));
        assert_eq!(validate_day(300), Err(TimetableError::InvalidDay { day: 300 }));
    }
}
