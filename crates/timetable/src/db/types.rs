/// Database types for subjects and timetable periods
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: i64,
    pub user_id: String,
    pub subject_id: i64,
    pub day_of_week: u8, // 0 = Sunday
    pub start_time: String, // HH:MM:SS
    pub end_time: String,   // HH:MM:SS
    pub location: Option<String>,
    pub teacher: Option<String>,
    pub notes: Option<String>,
}

/// A period that has been validated and resolved but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPeriod {
    pub subject_id: i64,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub location: Option<String>,
    pub teacher: Option<String>,
    pub notes: Option<String>,
}
