//! `/orders` routes: checkout, history, fulfilment and reporting.

use super::{AppState, auth::CurrentUser, extract::ApiJson};
use crate::{
    core::{checkout, ledger, status},
    entities::OrderStatus,
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::{Value, json};

/// Routes mounted under `/orders`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(student_orders))
        .route("/checkout", post(validate_checkout))
        .route("/complete", post(complete_order))
        .route("/cancel", post(cancel_reservation))
        .route("/staff", get(staff_orders))
        .route("/revenue", get(revenue_stats))
        .route("/spending", get(student_spending))
        .route("/{id}", get(order_details))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/hide", get(hide_order).patch(hide_order))
}

#[derive(Debug, Deserialize)]
struct SlotRequest {
    slot_id: Option<i64>,
}

impl SlotRequest {
    fn slot_id(&self) -> Result<i64> {
        self.slot_id
            .ok_or_else(|| Error::validation("Time slot ID is required"))
    }
}

#[derive(Debug, Deserialize)]
struct CompleteRequest {
    slot_id: Option<i64>,
    order_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: String,
}

#[derive(Debug, Deserialize)]
struct StaffFilter {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RevenueQuery {
    month: Option<String>,
    year: Option<i32>,
}

async fn validate_checkout(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<SlotRequest>,
) -> Result<Json<Value>> {
    user.require_student()?;
    checkout::validate_checkout(&state.db, req.slot_id()?).await?;
    Ok(Json(json!({ "success": true, "message": "Time slot is available" })))
}

async fn complete_order(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(req): ApiJson<CompleteRequest>,
) -> Result<Json<Value>> {
    let student_id = user.require_student()?;
    let slot_id = req
        .slot_id
        .ok_or_else(|| Error::validation("Time slot ID is required"))?;

    let placed = checkout::complete_order(&state.db, student_id, slot_id, req.order_notes).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Order placed successfully",
        "orderId": placed.order.id,
    })))
}

async fn cancel_reservation(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiJson(req): ApiJson<SlotRequest>,
) -> Result<Json<Value>> {
    checkout::cancel_slot_reservation(&state.db, req.slot_id()?).await?;
    Ok(Json(json!({ "success": true, "message": "Slot capacity restored" })))
}

async fn student_orders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ledger::OrderView>>> {
    let student_id = user.require_student()?;
    Ok(Json(ledger::get_student_orders(&state.db, student_id).await?))
}

async fn staff_orders(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<StaffFilter>,
) -> Result<Json<Vec<ledger::OrderView>>> {
    user.require_staff()?;
    let status = filter
        .status
        .as_deref()
        .map(OrderStatus::parse_staff_filter)
        .transpose()?;
    Ok(Json(ledger::get_staff_orders(&state.db, status).await?))
}

async fn order_details(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<i64>,
) -> Result<Json<ledger::OrderView>> {
    Ok(Json(
        ledger::get_order_details(&state.db, order_id, &user.0).await?,
    ))
}

async fn update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<i64>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> Result<Json<Value>> {
    user.require_staff()?;
    let next = OrderStatus::parse(&req.status)?;
    let order = status::set_status(&state.db, order_id, next).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Order status updated to {}", order.status),
        "order": order,
    })))
}

async fn revenue_stats(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<ledger::RevenueStats>> {
    user.require_staff()?;
    let period = ledger::RevenuePeriod::parse(query.month.as_deref())?;
    let year = query.year.unwrap_or_else(|| chrono::Utc::now().year());
    Ok(Json(ledger::get_revenue_stats(&state.db, period, year).await?))
}

async fn student_spending(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ledger::StudentSpending>> {
    let student_id = user.require_student()?;
    let today = chrono::Utc::now().date_naive();
    Ok(Json(
        ledger::get_student_spending(&state.db, student_id, today).await?,
    ))
}

async fn hide_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<i64>,
) -> Result<Json<Value>> {
    let student_id = user.require_student()?;
    ledger::hide_order_for_student(&state.db, student_id, order_id).await?;
    Ok(Json(json!({ "success": true, "message": "Order removed from history" })))
}
