/// Types for timetable import data
use crate::db::{Period, Subject};
use crate::error::TimetableError;
use serde::{Deserialize, Serialize};

/// One class period as extracted by the recognizer, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPeriod {
    #[serde(alias = "subject_text")]
    pub subject_text: String,

    /// 0 = Sunday. Kept wide so out-of-range values can be reported
    #[serde(alias = "day_of_week")]
    pub day_of_week: i64,

    #[serde(alias = "start_time")]
    pub start_time: String,

    #[serde(alias = "end_time")]
    pub end_time: String,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub teacher: Option<String>,
}

/// Why a single raw period was not stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Position of the period in the submitted batch
    pub index: usize,
    pub subject_text: String,
    pub error: TimetableError,
}

/// Outcome of ingesting a batch of raw periods
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestResult {
    pub created: usize,
    pub periods: Vec<Period>,
    pub new_subjects: Vec<Subject>,
    pub failures: Vec<FailureReport>,
}

impl IngestResult {
    /// Returns true if some periods were stored and some were not.
    pub fn is_partial(&self) -> bool {
        self.created > 0 && !self.failures.is_empty()
    }
}

/// Image payload sent to the recognizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    /// Base64-encoded image bytes
    pub image: String,

    #[serde(default)]
    pub mime_type: Option<String>,

    /// Free-text hints for the recognizer (e.g. "week A only")
    #[serde(default)]
    pub hints: Option<String>,
}
