//! `/cart` routes. Students only.

use super::{AppState, auth::CurrentUser, extract::ApiJson};
use crate::{
    core::cart::{self, CartLine},
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Routes mounted under `/cart`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_item).put(update_item))
        .route("/{menu_item_id}", delete(remove_item))
}

#[derive(Debug, Deserialize)]
struct CartRequest {
    menu_item_id: i64,
    quantity: i32,
}

async fn get_cart(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<CartLine>>> {
    let student_id = user.require_student()?;
    Ok(Json(cart::get_cart(&state.db, student_id).await?))
}

async fn add_item(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<CartRequest>,
) -> Result<Json<Value>> {
    let student_id = user.require_student()?;
    cart::add_to_cart(&state.db, student_id, req.menu_item_id, req.quantity).await?;
    Ok(Json(json!({ "success": true, "message": "Item added to cart" })))
}

async fn update_item(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<CartRequest>,
) -> Result<Json<Value>> {
    let student_id = user.require_student()?;
    let message = match cart::update_cart_item(&state.db, student_id, req.menu_item_id, req.quantity)
        .await?
    {
        Some(_) => "Cart updated",
        None => "Item removed from cart",
    };
    Ok(Json(json!({ "success": true, "message": message })))
}

async fn remove_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(menu_item_id): Path<i64>,
) -> Result<Json<Value>> {
    let student_id = user.require_student()?;
    cart::remove_from_cart(&state.db, student_id, menu_item_id).await?;
    Ok(Json(json!({ "success": true, "message": "Item removed from cart" })))
}
