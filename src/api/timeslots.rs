//! `/timeslots` routes.

use super::{AppState, auth::CurrentUser, extract::ApiJson};
use crate::{
    core::timeslot::{self, AvailableSlot, SlotChanges},
    entities::time_slot,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Routes mounted under `/timeslots`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_slots).post(create_slot))
        .route("/available", get(available_slots))
        .route("/{id}", put(update_slot).delete(delete_slot))
        .route("/{id}/reset", post(reset_slot))
}

#[derive(Debug, Deserialize)]
struct NewSlot {
    start_time: String,
    end_time: String,
    max_orders: i32,
}

async fn list_slots(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<time_slot::Model>>> {
    user.require_staff()?;
    Ok(Json(timeslot::list_all(&state.db).await?))
}

async fn available_slots(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<AvailableSlot>>> {
    Ok(Json(timeslot::list_available(&state.db).await?))
}

async fn create_slot(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<NewSlot>,
) -> Result<(StatusCode, Json<Value>)> {
    user.require_staff()?;
    let start = timeslot::parse_slot_time(&req.start_time)?;
    let end = timeslot::parse_slot_time(&req.end_time)?;
    let slot = timeslot::create_slot(&state.db, start, end, req.max_orders).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Time slot created", "slot": slot })),
    ))
}

async fn update_slot(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slot_id): Path<i64>,
    ApiJson(changes): ApiJson<SlotChanges>,
) -> Result<Json<Value>> {
    user.require_staff()?;
    let slot = timeslot::update_slot(&state.db, slot_id, changes).await?;
    Ok(Json(json!({ "success": true, "message": "Time slot updated", "slot": slot })))
}

async fn delete_slot(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slot_id): Path<i64>,
) -> Result<Json<Value>> {
    user.require_staff()?;
    timeslot::delete_slot(&state.db, slot_id).await?;
    Ok(Json(json!({ "success": true, "message": "Time slot deleted" })))
}

async fn reset_slot(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slot_id): Path<i64>,
) -> Result<Json<Value>> {
    user.require_staff()?;
    timeslot::reset_count(&state.db, slot_id).await?;
    Ok(Json(json!({ "success": true, "message": "Order count reset" })))
}
