//! `/favourites` routes. Students only.

use super::{AppState, auth::CurrentUser, extract::ApiJson};
use crate::{
    core::{favourite, menu::MenuItemView},
    errors::Result,
};
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Routes mounted under `/favourites`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/toggle", post(toggle))
}

#[derive(Debug, Deserialize)]
struct ToggleRequest {
    menu_item_id: i64,
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<MenuItemView>>> {
    let student_id = user.require_student()?;
    Ok(Json(favourite::list_favourites(&state.db, student_id).await?))
}

async fn toggle(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<ToggleRequest>,
) -> Result<Json<Value>> {
    let student_id = user.require_student()?;
    let is_favourite = favourite::toggle_favourite(&state.db, student_id, req.menu_item_id).await?;
    let message = if is_favourite {
        "Added to favourites"
    } else {
        "Removed from favourites"
    };
    Ok(Json(json!({ "success": true, "message": message, "isFavourite": is_favourite })))
}
