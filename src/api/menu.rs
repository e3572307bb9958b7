//! `/menu` routes.

use super::{AppState, auth::CurrentUser, extract::ApiJson};
use crate::{
    core::menu::{self, MenuItemChanges, MenuItemView, NewMenuItem},
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use serde_json::{Value, json};

/// Routes mounted under `/menu`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_menu).post(create_item))
        .route("/all", get(list_all))
        .route("/{id}", put(update_item).delete(delete_item))
}

async fn list_menu(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<MenuItemView>>> {
    Ok(Json(menu::list_menu(&state.db, false).await?))
}

async fn list_all(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<MenuItemView>>> {
    user.require_staff()?;
    Ok(Json(menu::list_menu(&state.db, true).await?))
}

async fn create_item(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_item): ApiJson<NewMenuItem>,
) -> Result<(StatusCode, Json<Value>)> {
    user.require_staff()?;
    let item = MenuItemView::from(menu::create_menu_item(&state.db, new_item).await?);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Menu item created", "item": item })),
    ))
}

async fn update_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<i64>,
    ApiJson(changes): ApiJson<MenuItemChanges>,
) -> Result<Json<Value>> {
    user.require_staff()?;
    let item = MenuItemView::from(menu::update_menu_item(&state.db, item_id, changes).await?);
    Ok(Json(json!({ "success": true, "message": "Menu item updated", "item": item })))
}

async fn delete_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(item_id): Path<i64>,
) -> Result<Json<Value>> {
    user.require_staff()?;
    menu::delete_menu_item(&state.db, item_id).await?;
    Ok(Json(json!({ "success": true, "message": "Menu item deleted" })))
}
