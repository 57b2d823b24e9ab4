use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::server::endpoints::{status, subjects, timetable};
use crate::types::AppState;

mod endpoints;
mod types;

pub use types::ApiErrorType;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Everything below is scoped to one user; there is no ambient session
    let user_router = Router::new()
        .route(
            "/subjects",
            get(subjects::get_subjects).post(subjects::post_subject),
        )
        .route(
            "/periods",
            get(timetable::get_periods).post(timetable::post_period),
        )
        .route("/periods/:period_id", delete(timetable::delete_period))
        .route("/timetable/import", post(timetable::post_import_image))
        .route("/timetable/ingest", post(timetable::post_ingest))
        .route("/timetable/layout", get(timetable::get_layout))
        .route("/timetable/grid", get(timetable::get_interactive_grid))
        .route("/timetable/print", get(timetable::get_printable_grid));

    Router::new()
        .route("/health", get(status::get_health))
        .nest("/users/:user_id", user_router)
        .with_state(app_state)
}
