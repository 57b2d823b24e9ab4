//! API endpoints for a user's subject catalog.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::db::NewSubject;
use crate::import::{palette_color, ExactMatch, MatchStrategy};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// Body for creating a subject by hand.
#[derive(Debug, Deserialize)]
pub struct CreateSubjectBody {
    pub name: String,
    /// Palette color is picked when omitted
    #[serde(default)]
    pub color: Option<String>,
}

/// GET /users/:user_id/subjects
pub async fn get_subjects(
    Path(user_id): Path<String>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!("GET /users/{}/subjects", user_id);

    match s.store.list_subjects(&user_id) {
        Ok(subjects) => (StatusCode::OK, Json(subjects)).into_response(),
        Err(e) => {
            error!("Failed to list subjects: {}", e);
            ApiErrorType::from(e).into_response()
        }
    }
}

/// POST /users/:user_id/subjects
///
/// Names are unique per user, ignoring case.
pub async fn post_subject(
    Path(user_id): Path<String>,
    State(s): State<Arc<AppState>>,
    Json(body): Json<CreateSubjectBody>,
) -> Response {
    info!("POST /users/{}/subjects", user_id);

    let name = body.name.trim();
    if name.is_empty() {
        return ApiErrorType::from(crate::error::TimetableError::EmptySubjectName).into_response();
    }

    let existing = match s.store.list_subjects(&user_id) {
        Ok(existing) => existing,
        Err(e) => return ApiErrorType::from(e).into_response(),
    };

    let lowered = name.to_lowercase();
    if existing
        .iter()
        .any(|subject| ExactMatch.matches(&subject.name.trim().to_lowercase(), &lowered))
    {
        return ApiErrorType::from((
            StatusCode::CONFLICT,
            "Subject already exists",
            Some(format!("A subject named {:?} already exists", name)),
        ))
        .into_response();
    }

    let new_subject = NewSubject {
        name: name.to_string(),
        color: body
            .color
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| palette_color(existing.len()).to_string()),
    };

    match s.store.create_subject(&user_id, &new_subject) {
        Ok(subject) => (StatusCode::CREATED, Json(subject)).into_response(),
        Err(e) => {
            error!("Failed to create subject: {}", e);
            ApiErrorType::from(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::SUBJECT_PALETTE;
    use crate::server::endpoints::test_util::{body_json, test_state};

    fn body(name: &str, color: Option<&str>) -> Json<CreateSubjectBody> {
        Json(CreateSubjectBody {
            name: name.to_string(),
            color: color.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let state = test_state();

        let created = post_subject(
            Path("alice".to_string()),
            State(state.clone()),
            body(" Biology ", None),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = body_json(created).await;
        assert_eq!(created["name"], "Biology");
        assert_eq!(created["color"], SUBJECT_PALETTE[0]);

        let listed = get_subjects(Path("alice".to_string()), State(state)).await;
        assert_eq!(listed.status(), StatusCode::OK);
        assert_eq!(body_json(listed).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let state = test_state();
        post_subject(
            Path("alice".to_string()),
            State(state.clone()),
            body("Biology", Some("#000000")),
        )
        .await;

        let again = post_subject(
            Path("alice".to_string()),
            State(state),
            body("BIOLOGY", None),
        )
        .await;
        assert_eq!(again.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let state = test_state();
        let response = post_subject(Path("alice".to_string()), State(state), body("  ", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
