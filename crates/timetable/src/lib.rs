//! Timetable import and weekly scheduling grid.
//!
//! Recognized timetable images are reconciled against a user's subjects and
//! stored as periods; stored periods are laid out as a weekly grid that both
//! the interactive view and the printable export draw from.

pub mod config;
pub mod db;
pub mod error;
pub mod grid;
pub mod import;
pub mod server;
pub mod time;
pub mod types;

pub use error::TimetableError;
pub use grid::{layout, GridCell, GridLayout};
pub use import::{IngestResult, PeriodIngestor, RawPeriod, SubjectResolver};
