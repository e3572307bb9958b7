//! `/feedback` routes. Students submit, staff read and delete.

use super::{AppState, auth::CurrentUser, extract::ApiJson};
use crate::{
    core::feedback::{self, FeedbackView, NewFeedback},
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde_json::{Value, json};

/// Routes mounted under `/feedback`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit))
        .route("/all", get(list_all))
        .route("/{id}", delete(remove))
}

async fn submit(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<NewFeedback>,
) -> Result<(StatusCode, Json<Value>)> {
    let student_id = user.require_student()?;
    let saved = feedback::submit_feedback(&state.db, student_id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Feedback submitted successfully",
            "feedbackId": saved.id,
        })),
    ))
}

async fn list_all(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<FeedbackView>>> {
    user.require_staff()?;
    Ok(Json(feedback::list_feedback(&state.db).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(feedback_id): Path<i64>,
) -> Result<Json<Value>> {
    user.require_staff()?;
    feedback::delete_feedback(&state.db, feedback_id).await?;
    Ok(Json(json!({ "success": true, "message": "Feedback deleted successfully" })))
}
