//! `/students` routes. Staff only.

use super::{AppState, auth::CurrentUser};
use crate::{
    core::account::{self, StudentHistory, StudentSummary},
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use serde_json::{Value, json};

/// Routes mounted under `/students`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}/history", get(history))
        .route("/{id}", delete(remove))
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<StudentSummary>>> {
    user.require_staff()?;
    Ok(Json(account::list_students(&state.db).await?))
}

async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(student_id): Path<i64>,
) -> Result<Json<StudentHistory>> {
    user.require_staff()?;
    Ok(Json(account::get_student_history(&state.db, student_id).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(student_id): Path<i64>,
) -> Result<Json<Value>> {
    user.require_staff()?;
    account::delete_student(&state.db, student_id).await?;
    Ok(Json(json!({ "success": true, "message": "Student deleted successfully" })))
}
