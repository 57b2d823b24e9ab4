//! Weekly scheduling grid.
//!
//! `layout` turns an unordered set of periods into rows (distinct start
//! times) and columns (days that have periods), and decides for every cell
//! whether a period starts there, whether it is covered by a period that
//! started higher up, or whether it is empty. The layout is recomputed from
//! the period list on every read and never patched in place.

mod render;

pub use render::{
    day_name, drawable_rows, render_interactive, render_printable, CellPeriod, DrawCell,
    DrawRow, InteractiveCell, InteractiveGrid, InteractiveRow,
};

use crate::db::{Period, TimetableStore};
use crate::error::TimetableError;
use crate::time::truncate_to_slot;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Days shown when there are no periods (Monday to Friday).
pub const DEFAULT_DAYS: [u8; 5] = [1, 2, 3, 4, 5];

/// First default slot hour and number of hourly slots when there are no periods.
const DEFAULT_FIRST_HOUR: u32 = 7;
const DEFAULT_SLOT_COUNT: u32 = 14;

/// Content of one (day, slot) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridCell {
    /// A period starts here and covers `row_span` rows
    Start { period: Period, row_span: usize },
    /// Covered by a period that started in an earlier row; never drawn
    Spanned { by: i64 },
    Empty,
}

impl GridCell {
    pub fn is_spanned(&self) -> bool {
        matches!(self, GridCell::Spanned { .. })
    }
}

/// Why a period has no visible cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenReason {
    /// Another period on the same day starts in the same slot and sorts first
    SameStartSlot,
    /// The period starts inside another period's span
    Covered,
}

/// A period that overlaps another one and therefore is not drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HiddenPeriod {
    pub period_id: i64,
    pub hidden_by: i64,
    pub reason: HiddenReason,
}

/// Derived weekly grid. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridLayout {
    /// Row headers, `HH:MM`, strictly ascending
    pub time_slots: Vec<String>,
    /// Column headers, day numbers ascending (0 = Sunday)
    pub active_days: Vec<u8>,
    /// `cells[slot_index][day_index]`
    pub cells: Vec<Vec<GridCell>>,
    /// Periods that exist but have no cell of their own
    pub hidden: Vec<HiddenPeriod>,
}

impl GridLayout {
    /// Looks up the cell for a day number and slot index.
    pub fn cell(&self, day: u8, slot_index: usize) -> Option<&GridCell> {
        let day_index = self.active_days.iter().position(|d| *d == day)?;
        self.cells.get(slot_index)?.get(day_index)
    }

    /// Finds where a period starts, as (day, slot index, row span).
    pub fn start_of(&self, period_id: i64) -> Option<(u8, usize, usize)> {
        self.cells.iter().enumerate().find_map(|(slot_index, row)| {
            row.iter().enumerate().find_map(|(day_index, cell)| match cell {
                GridCell::Start { period, row_span } if period.id == period_id => {
                    Some((self.active_days[day_index], slot_index, *row_span))
                }
                _ => None,
            })
        })
    }
}

/// Hourly `HH:MM` labels used when there is nothing to lay out.
pub fn default_time_slots() -> Vec<String> {
    (DEFAULT_FIRST_HOUR..DEFAULT_FIRST_HOUR + DEFAULT_SLOT_COUNT)
        .map(|hour| format!("{:02}:00", hour))
        .collect()
}

/// Expands an `HH:MM` slot label to a comparable `HH:MM:SS` time.
fn slot_time(slot: &str) -> String {
    format!("{}:00", slot)
}

/// Number of slots from `start_index` that begin before `end_time`, at least 1.
fn row_span(time_slots: &[String], start_index: usize, end_time: &str) -> usize {
    let mut j = start_index;
    while j < time_slots.len() && slot_time(&time_slots[j]).as_str() < end_time {
        j += 1;
    }
    (j - start_index).max(1)
}

/// Computes the weekly grid for a set of periods.
///
/// Periods are expected to carry normalized `HH:MM:SS` times with
/// `start_time < end_time`, as stored. The result depends only on the input
/// set, not its order.
pub fn layout(periods: &[Period]) -> GridLayout {
    let mut sorted: Vec<&Period> = periods.iter().collect();
    sorted.sort_by(|a, b| {
        (a.day_of_week, &a.start_time, a.id).cmp(&(b.day_of_week, &b.start_time, b.id))
    });

    let time_slots: Vec<String> = if sorted.is_empty() {
        default_time_slots()
    } else {
        sorted
            .iter()
            .map(|p| truncate_to_slot(&p.start_time).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };

    let active_days: Vec<u8> = if sorted.is_empty() {
        DEFAULT_DAYS.to_vec()
    } else {
        sorted
            .iter()
            .map(|p| p.day_of_week)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };

    let mut cells = vec![vec![GridCell::Empty; active_days.len()]; time_slots.len()];
    let mut hidden = Vec::new();

    for (day_index, &day) in active_days.iter().enumerate() {
        let day_periods: Vec<&Period> = sorted
            .iter()
            .copied()
            .filter(|p| p.day_of_week == day)
            .collect();

        // Last drawn period on this day; only drawn periods cover cells
        let mut cover: Option<&Period> = None;

        for (slot_index, slot) in time_slots.iter().enumerate() {
            let at = slot_time(slot);
            cover = cover.filter(|c| at.as_str() < c.end_time.as_str());

            let mut starting = day_periods
                .iter()
                .copied()
                .filter(|p| truncate_to_slot(&p.start_time) == slot.as_str());

            cells[slot_index][day_index] = match cover {
                // Covered cells win over anything starting in them
                Some(c) => {
                    for p in starting {
                        hidden.push(HiddenPeriod {
                            period_id: p.id,
                            hidden_by: c.id,
                            reason: HiddenReason::Covered,
                        });
                    }
                    GridCell::Spanned { by: c.id }
                }
                None => match starting.next() {
                    Some(first) => {
                        for p in starting {
                            hidden.push(HiddenPeriod {
                                period_id: p.id,
                                hidden_by: first.id,
                                reason: HiddenReason::SameStartSlot,
                            });
                        }
                        cover = Some(first);
                        GridCell::Start {
                            period: first.clone(),
                            row_span: row_span(&time_slots, slot_index, &first.end_time),
                        }
                    }
                    None => GridCell::Empty,
                },
            };
        }
    }

    if !hidden.is_empty() {
        debug!(hidden = hidden.len(), "Some periods overlap and are not drawn");
    }

    GridLayout {
        time_slots,
        active_days,
        cells,
        hidden,
    }
}

/// Reads the user's current periods and lays them out.
pub fn get_weekly_layout<S: TimetableStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<GridLayout, TimetableError> {
    let periods = store.list_periods(user_id)?;
    Ok(layout(&periods))
}
