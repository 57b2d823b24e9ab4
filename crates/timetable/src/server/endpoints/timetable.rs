//! API endpoints for periods, timetable import and the weekly grid.
//!
//! Layout endpoints recompute the grid from the stored periods on every
//! request; nothing layout-related is cached.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::db::NewPeriod;
use crate::error::TimetableError;
use crate::grid::{self, GridLayout};
use crate::import::{self, validate_day, ImportRequest, IngestResult, RawPeriod};
use crate::server::types::ApiErrorType;
use crate::time::normalize_range;
use crate::types::AppState;

/// Body for entering a period by hand.
#[derive(Debug, Deserialize)]
pub struct CreatePeriodBody {
    pub subject_id: i64,
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreatePeriodBody {
    /// Applies the same time normalization as imported periods.
    fn validate(self) -> Result<NewPeriod, TimetableError> {
        let (start_time, end_time) = normalize_range(&self.start_time, &self.end_time)?;
        let day_of_week = validate_day(self.day_of_week)?;

        Ok(NewPeriod {
            subject_id: self.subject_id,
            day_of_week,
            start_time,
            end_time,
            location: self.location,
            teacher: self.teacher,
            notes: self.notes,
        })
    }
}

/// Converts an ingest result to a response. Failures stay in the body.
fn ingest_response(user_id: &str, result: Result<IngestResult, TimetableError>) -> Response {
    match result {
        Ok(result) => {
            if !result.failures.is_empty() {
                warn!(
                    "Import for {} stored {} periods, {} failed",
                    user_id,
                    result.created,
                    result.failures.len()
                );
            }
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(e) => {
            error!("Timetable import failed for {}: {}", user_id, e);
            ApiErrorType::from(e).into_response()
        }
    }
}

fn current_layout(state: &AppState, user_id: &str) -> Result<GridLayout, TimetableError> {
    grid::get_weekly_layout(state.store.as_ref(), user_id)
}

/// GET /users/:user_id/periods
pub async fn get_periods(
    Path(user_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /users/{}/periods", user_id);

    match s.store.list_periods(&user_id) {
        Ok(periods) => (StatusCode::OK, Json(periods)).into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}

/// POST /users/:user_id/periods
pub async fn post_period(
    Path(user_id): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(body): Json<CreatePeriodBody>,
) -> Response {
    info!("POST /users/{}/periods", user_id);

    let created = body
        .validate()
        .and_then(|period| s.store.create_period(&user_id, &period));

    match created {
        Ok(period) => (StatusCode::CREATED, Json(period)).into_response(),
        Err(e) => {
            warn!("Rejected period for {}: {}", user_id, e);
            ApiErrorType::from(e).into_response()
        }
    }
}

/// DELETE /users/:user_id/periods/:period_id
pub async fn delete_period(
    Path((user_id, period_id)): Path<(String, i64)>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("DELETE /users/{}/periods/{}", user_id, period_id);

    match s.store.delete_period(&user_id, period_id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => ApiErrorType::from(TimetableError::NotFound {
            what: format!("period {}", period_id),
        })
        .into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}

/// POST /users/:user_id/timetable/import
///
/// Sends the image to the recognizer, then stores what it found.
pub async fn post_import_image(
    Path(user_id): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(request): Json<ImportRequest>,
) -> Response {
    info!("POST /users/{}/timetable/import", user_id);

    let result = import::import_timetable_image(&s, &user_id, &request).await;
    ingest_response(&user_id, result)
}

/// POST /users/:user_id/timetable/ingest
///
/// Stores periods that were already recognized elsewhere.
pub async fn post_ingest(
    Path(user_id): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(raw_periods): Json<Vec<RawPeriod>>,
) -> Response {
    info!(
        "POST /users/{}/timetable/ingest ({} periods)",
        user_id,
        raw_periods.len()
    );

    let result = import::ingest_timetable(&s, &user_id, &raw_periods);
    ingest_response(&user_id, result)
}

/// GET /users/:user_id/timetable/layout
pub async fn get_layout(
    Path(user_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /users/{}/timetable/layout", user_id);

    match current_layout(&s, &user_id) {
        Ok(layout) => (StatusCode::OK, Json(layout)).into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}

/// GET /users/:user_id/timetable/grid
pub async fn get_interactive_grid(
    Path(user_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /users/{}/timetable/grid", user_id);

    let rendered = current_layout(&s, &user_id).and_then(|layout| {
        let subjects = s.store.list_subjects(&user_id)?;
        Ok(grid::render_interactive(&layout, &subjects))
    });

    match rendered {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}

/// GET /users/:user_id/timetable/print
pub async fn get_printable_grid(
    Path(user_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /users/{}/timetable/print", user_id);

    let rendered = current_layout(&s, &user_id).and_then(|layout| {
        let subjects = s.store.list_subjects(&user_id)?;
        grid::render_printable(&layout, &subjects)
    });

    match rendered {
        Ok(page) => (StatusCode::OK, Html(page)).into_response(),
        Err(e) => ApiErrorType::from(e).into_response(),
    }
}
