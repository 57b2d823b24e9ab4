pub mod status;
pub mod subjects;
pub mod timetable;
