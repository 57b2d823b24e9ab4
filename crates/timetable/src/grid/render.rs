//! Interactive and printable views of a `GridLayout`.
//!
//! Both views walk the layout through `drawable_rows`, which applies the
//! single skip rule (spanned cells are not drawn). Neither view makes any
//! layout decision of its own.

use super::{GridCell, GridLayout, HiddenPeriod};
use crate::db::{Period, Subject};
use crate::error::TimetableError;
use crate::time::truncate_to_slot;
use askama::Template;
use serde::Serialize;
use std::collections::HashMap;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const UNKNOWN_SUBJECT: &str = "Unknown subject";
const UNKNOWN_COLOR: &str = "#9ca3af";

/// English name for a day number (0 = Sunday).
pub fn day_name(day: u8) -> &'static str {
    DAY_NAMES.get(day as usize).copied().unwrap_or("?")
}

/// One drawable cell; spanned cells never appear here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCell<'a> {
    Period {
        day: u8,
        period: &'a Period,
        row_span: usize,
    },
    Empty {
        day: u8,
    },
}

/// One grid row in draw order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRow<'a> {
    pub slot: &'a str,
    pub cells: Vec<DrawCell<'a>>,
}

/// Row-major walk over the layout, skipping spanned cells.
pub fn drawable_rows(layout: &GridLayout) -> Vec<DrawRow<'_>> {
    layout
        .time_slots
        .iter()
        .zip(&layout.cells)
        .map(|(slot, row)| DrawRow {
            slot: slot.as_str(),
            cells: layout
                .active_days
                .iter()
                .zip(row)
                .filter_map(|(&day, cell)| match cell {
                    GridCell::Spanned { .. } => None,
                    GridCell::Start { period, row_span } => Some(DrawCell::Period {
                        day,
                        period,
                        row_span: *row_span,
                    }),
                    GridCell::Empty => Some(DrawCell::Empty { day }),
                })
                .collect(),
        })
        .collect()
}

/// Subject details shown in a period cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellPeriod {
    pub period_id: i64,
    pub subject_id: i64,
    pub subject_name: String,
    pub color: String,
    pub time_range: String,
    pub location: Option<String>,
    pub teacher: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractiveCell {
    pub day: u8,
    pub row_span: usize,
    pub period: Option<CellPeriod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractiveRow {
    pub slot: String,
    pub cells: Vec<InteractiveCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayHeader {
    pub day: u8,
    pub name: &'static str,
}

/// Cell tree for the interactive timetable view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractiveGrid {
    pub days: Vec<DayHeader>,
    pub rows: Vec<InteractiveRow>,
    /// Overlapping periods that have no cell, so the view can flag them
    pub hidden: Vec<HiddenPeriod>,
}

fn cell_period(period: &Period, subjects: &HashMap<i64, &Subject>) -> CellPeriod {
    let subject = subjects.get(&period.subject_id);
    CellPeriod {
        period_id: period.id,
        subject_id: period.subject_id,
        subject_name: subject
            .map(|s| s.name.clone())
            .unwrap_or_else(|| UNKNOWN_SUBJECT.to_string()),
        color: subject
            .map(|s| s.color.clone())
            .unwrap_or_else(|| UNKNOWN_COLOR.to_string()),
        time_range: format!(
            "{}-{}",
            truncate_to_slot(&period.start_time),
            truncate_to_slot(&period.end_time)
        ),
        location: period.location.clone(),
        teacher: period.teacher.clone(),
    }
}

fn subject_index(subjects: &[Subject]) -> HashMap<i64, &Subject> {
    subjects.iter().map(|s| (s.id, s)).collect()
}

/// Builds the interactive view.
pub fn render_interactive(layout: &GridLayout, subjects: &[Subject]) -> InteractiveGrid {
    let index = subject_index(subjects);

    let rows = drawable_rows(layout)
        .into_iter()
        .map(|row| InteractiveRow {
            slot: row.slot.to_string(),
            cells: row
                .cells
                .into_iter()
                .map(|cell| match cell {
                    DrawCell::Period {
                        day,
                        period,
                        row_span,
                    } => InteractiveCell {
                        day,
                        row_span,
                        period: Some(cell_period(period, &index)),
                    },
                    DrawCell::Empty { day } => InteractiveCell {
                        day,
                        row_span: 1,
                        period: None,
                    },
                })
                .collect(),
        })
        .collect();

    InteractiveGrid {
        days: layout
            .active_days
            .iter()
            .map(|&day| DayHeader {
                day,
                name: day_name(day),
            })
            .collect(),
        rows,
        hidden: layout.hidden.clone(),
    }
}

/// Printable page; the markup lives in `templates/timetable_print.html`.
#[derive(Template)]
#[template(path = "timetable_print.html")]
struct PrintPage<'a> {
    grid: &'a InteractiveGrid,
}

/// Builds a standalone HTML page with the timetable as a `<table>`.
///
/// The page is rendered from the same cell tree as the interactive view,
/// with all text HTML-escaped.
pub fn render_printable(
    layout: &GridLayout,
    subjects: &[Subject],
) -> Result<String, TimetableError> {
    let grid = render_interactive(layout, subjects);
    Ok(PrintPage { grid: &grid }.render()?)
}

#[cfg(test)]
mod tests {
    use super::super::layout;
    use super::*;
    use scraper::{Html, Selector};

    fn subject(id: i64, name: &str, color: &str) -> Subject {
        Subject {
            id,
            user_id: "alice".to_string(),
            name: name.to_string(),
            color: color.to_string(),
            is_active: true,
        }
    }

    fn period(id: i64, subject_id: i64, day: u8, start: &str, end: &str) -> Period {
        Period {
            id,
            user_id: "alice".to_string(),
            subject_id,
            day_of_week: day,
            start_time: start.to_string(),
            end_time: end.to_string(),
            location: None,
            teacher: None,
            notes: None,
        }
    }

    fn sample() -> (Vec<Period>, Vec<Subject>) {
        let mut lab = period(2, 2, 1, "10:00:00", "12:00:00");
        lab.location = Some("Lab <B>".to_string());
        let periods = vec![
            period(1, 1, 1, "09:00:00", "10:00:00"),
            lab,
            period(3, 1, 3, "11:00:00", "12:00:00"),
            period(4, 3, 3, "09:00:00", "10:00:00"),
        ];
        let subjects = vec![
            subject(1, "Math", "#3b82f6"),
            subject(2, "Physics & Lab", "#ef4444"),
        ];
        (periods, subjects)
    }

    #[test]
    fn test_drawable_rows_skip_spanned() {
        let (periods, _) = sample();
        let grid = layout(&periods);
        let rows = drawable_rows(&grid);

        assert_eq!(rows.len(), 3);
        // Monday's 11:00 cell is covered by the lab
        let days: Vec<Vec<u8>> = rows
            .iter()
            .map(|r| {
                r.cells
                    .iter()
                    .map(|c| match c {
                        DrawCell::Period { day, .. } | DrawCell::Empty { day } => *day,
                    })
                    .collect()
            })
            .collect();
        assert_eq!(days, vec![vec![1, 3], vec![1, 3], vec![3]]);
    }

    #[test]
    fn test_interactive_cells() {
        let (periods, subjects) = sample();
        let grid = render_interactive(&layout(&periods), &subjects);

        assert_eq!(
            grid.days,
            vec![
                DayHeader {
                    day: 1,
                    name: "Monday"
                },
                DayHeader {
                    day: 3,
                    name: "Wednesday"
                },
            ]
        );

        let lab = &grid.rows[1].cells[0];
        assert_eq!(lab.row_span, 2);
        let info = lab.period.as_ref().unwrap();
        assert_eq!(info.subject_name, "Physics & Lab");
        assert_eq!(info.time_range, "10:00-12:00");
        assert_eq!(info.location.as_deref(), Some("Lab <B>"));

        // Subject 3 is not in the catalog
        let unknown = grid.rows[0].cells[1].period.as_ref().unwrap();
        assert_eq!(unknown.subject_name, UNKNOWN_SUBJECT);
        assert_eq!(unknown.color, UNKNOWN_COLOR);
    }

    #[test]
    fn test_printable_matches_interactive() {
        let (periods, subjects) = sample();
        let grid = layout(&periods);
        let interactive = render_interactive(&grid, &subjects);
        let printed = render_printable(&grid, &subjects).unwrap();

        let document = Html::parse_document(&printed);
        let row_selector = Selector::parse("tbody tr").unwrap();
        let cell_selector = Selector::parse("td").unwrap();

        let printed_rows: Vec<Vec<(u8, usize, Option<i64>)>> = document
            .select(&row_selector)
            .map(|row| {
                row.select(&cell_selector)
                    .map(|td| {
                        let attr = |name: &str| td.value().attr(name).unwrap_or_default();
                        (
                            attr("data-day").parse().unwrap(),
                            attr("rowspan").parse().unwrap(),
                            attr("data-period").parse().ok(),
                        )
                    })
                    .collect()
            })
            .collect();

        let interactive_rows: Vec<Vec<(u8, usize, Option<i64>)>> = interactive
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|c| (c.day, c.row_span, c.period.as_ref().map(|p| p.period_id)))
                    .collect()
            })
            .collect();

        assert_eq!(printed_rows, interactive_rows);
    }

    #[test]
    fn test_printable_columns_stay_aligned_with_hidden_period() {
        // Period 5 loses the 09:00 tie-break on Monday and is not drawn
        let periods = vec![
            period(1, 1, 1, "09:00:00", "10:00:00"),
            period(5, 1, 1, "09:00:00", "12:00:00"),
            period(3, 2, 2, "10:00:00", "11:00:00"),
            period(4, 2, 2, "11:00:00", "12:00:00"),
        ];
        let (_, subjects) = sample();
        let printed = render_printable(&layout(&periods), &subjects).unwrap();

        let document = Html::parse_document(&printed);
        let row_selector = Selector::parse("tbody tr").unwrap();
        let cell_selector = Selector::parse("td").unwrap();
        let days: Vec<Vec<String>> = document
            .select(&row_selector)
            .map(|row| {
                row.select(&cell_selector)
                    .map(|td| td.value().attr("data-day").unwrap_or_default().to_string())
                    .collect()
            })
            .collect();

        assert_eq!(days, vec![vec!["1", "2"]; 3]);
    }

    #[test]
    fn test_printable_escapes_text() {
        let (periods, subjects) = sample();
        let printed = render_printable(&layout(&periods), &subjects).unwrap();

        assert!(printed.contains("Physics &amp; Lab"));
        assert!(printed.contains("Lab &lt;B&gt;"));
        assert!(!printed.contains("Lab <B>"));
    }

    #[test]
    fn test_empty_layout_prints_default_grid() {
        let printed = render_printable(&layout(&[]), &[]).unwrap();
        let document = Html::parse_document(&printed);

        let headers = Selector::parse("thead th").unwrap();
        assert_eq!(document.select(&headers).count(), 6);
        let empty = Selector::parse("td.empty").unwrap();
        assert_eq!(document.select(&empty).count(), 14 * 5);
    }

    #[test]
    fn test_day_name() {
        assert_eq!(day_name(0), "Sunday");
        assert_eq!(day_name(6), "Saturday");
        assert_eq!(day_name(9), "?");
    }
}
