//! Time-slot capacity manager.
//!
//! `current_orders` is only written through the conditional updates in this
//! module. [`try_reserve`] and [`release`] each compile to a single `UPDATE`
//! whose `WHERE` clause carries the capacity check, so the check and the
//! increment cannot be split by a concurrent request no matter how many
//! server processes share the database.

use crate::{
    entities::{Order, TimeSlot, order, time_slot},
    errors::{Error, Result},
};
use chrono::NaiveTime;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Advisory snapshot of a slot. Never use it to admit an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    /// Slot row exists
    pub exists: bool,
    /// Slot accepts reservations
    pub is_active: bool,
    /// `current_orders < max_orders` at the time of the read
    pub has_capacity: bool,
}

/// Whether an active slot still has room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotStatus {
    /// At least one seat left
    Available,
    /// No seats left
    Full,
}

/// Active slot projected for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableSlot {
    /// Slot id
    pub slot_id: i64,
    /// Start of the pickup window
    pub start_time: NaiveTime,
    /// End of the pickup window
    pub end_time: NaiveTime,
    /// Capacity
    pub max_orders: i32,
    /// Reservations held
    pub current_orders: i32,
    /// Seats left
    pub remaining_capacity: i32,
    /// Derived from `remaining_capacity`
    pub status: SlotStatus,
}

impl From<time_slot::Model> for AvailableSlot {
    fn from(slot: time_slot::Model) -> Self {
        let remaining_capacity = slot.remaining_capacity();
        Self {
            slot_id: slot.id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            max_orders: slot.max_orders,
            current_orders: slot.current_orders,
            remaining_capacity,
            status: if remaining_capacity > 0 {
                SlotStatus::Available
            } else {
                SlotStatus::Full
            },
        }
    }
}

/// Partial update of a slot
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SlotChanges {
    /// New capacity
    pub max_orders: Option<i32>,
    /// Open or close the slot for reservations
    pub is_active: Option<bool>,
}

/// Parses `H:MM`, `HH:MM` or `HH:MM:SS` (hours 0-23).
///
/// # Errors
/// Returns [`Error::Validation`] for anything else.
pub fn parse_slot_time(raw: &str) -> Result<NaiveTime> {
    let trimmed = raw.trim();
    let format = match trimmed.matches(':').count() {
        1 => "%H:%M",
        2 => "%H:%M:%S",
        _ => "",
    };

    NaiveTime::parse_from_str(trimmed, format).map_err(|_| {
        Error::validation(format!(
            "Time must be in HH:MM or HH:MM:SS format, got '{raw}'"
        ))
    })
}

/// Atomically takes one seat in an active slot.
///
/// Executes `UPDATE time_slots SET current_orders = current_orders + 1
/// WHERE id = ? AND current_orders < max_orders AND is_active`. Returns `false`
/// when no row matched: the slot is full, inactive or missing. That is an
/// admission denial, not an error.
pub async fn try_reserve<C>(db: &C, slot_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = TimeSlot::update_many()
        .col_expr(
            time_slot::Column::CurrentOrders,
            Expr::col(time_slot::Column::CurrentOrders).add(1),
        )
        .filter(time_slot::Column::Id.eq(slot_id))
        .filter(time_slot::Column::IsActive.eq(true))
        .filter(
            Expr::col(time_slot::Column::CurrentOrders)
                .lt(Expr::col(time_slot::Column::MaxOrders)),
        )
        .exec(db)
        .await?;

    let reserved = result.rows_affected == 1;
    debug!(slot_id, reserved, "slot reservation attempted");
    Ok(reserved)
}

/// Atomically gives one seat back.
///
/// Executes `UPDATE time_slots SET current_orders = current_orders - 1
/// WHERE id = ? AND current_orders > 0`, so the counter never goes negative.
/// Returns `false` if the slot is missing or already at zero, which makes
/// repeated compensating releases harmless.
pub async fn release<C>(db: &C, slot_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = TimeSlot::update_many()
        .col_expr(
            time_slot::Column::CurrentOrders,
            Expr::col(time_slot::Column::CurrentOrders).sub(1),
        )
        .filter(time_slot::Column::Id.eq(slot_id))
        .filter(time_slot::Column::CurrentOrders.gt(0))
        .exec(db)
        .await?;

    let released = result.rows_affected == 1;
    debug!(slot_id, released, "slot release attempted");
    Ok(released)
}

/// Finds a slot by id.
pub async fn get_slot<C: ConnectionTrait>(db: &C, slot_id: i64) -> Result<Option<time_slot::Model>> {
    TimeSlot::find_by_id(slot_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Reads a slot's state for pre-flight UI validation.
///
/// The answer may be stale by the time the client completes checkout; only
/// [`try_reserve`] decides admission.
pub async fn check_availability(db: &DatabaseConnection, slot_id: i64) -> Result<SlotAvailability> {
    Ok(get_slot(db, slot_id)
        .await?
        .map_or(
            SlotAvailability {
                exists: false,
                is_active: false,
                has_capacity: false,
            },
            |slot| SlotAvailability {
                exists: true,
                is_active: slot.is_active,
                has_capacity: slot.current_orders < slot.max_orders,
            },
        ))
}

/// Active slots ordered by start time, with remaining capacity.
pub async fn list_available(db: &DatabaseConnection) -> Result<Vec<AvailableSlot>> {
    let slots = TimeSlot::find()
        .filter(time_slot::Column::IsActive.eq(true))
        .order_by_asc(time_slot::Column::StartTime)
        .all(db)
        .await?;

    Ok(slots.into_iter().map(AvailableSlot::from).collect())
}

/// Every slot, active or not, ordered by start time.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<time_slot::Model>> {
    TimeSlot::find()
        .order_by_asc(time_slot::Column::StartTime)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a slot after rejecting empty ranges and overlaps with active slots.
///
/// The overlap scan and the insert run in one transaction. Only active slots
/// are considered, so a deactivated window can be replaced by a new one.
/// Adjacent windows (`09:00-10:00` and `10:00-11:00`) do not overlap.
///
/// New slots start active with no reservations.
///
/// # Arguments
/// * `db` - Database connection
/// * `start_time` - Start of the pickup window
/// * `end_time` - End of the pickup window, strictly after `start_time`
/// * `max_orders` - Capacity; `0` creates a slot that admits nobody
///
/// # Returns
/// The inserted slot.
///
/// # Errors
/// - [`Error::InvalidTimeRange`] when `end_time` is not after `start_time`
/// - [`Error::Validation`] when `max_orders` is negative
/// - [`Error::SlotOverlap`] with the first conflicting active slot
/// - [`Error::Database`] for storage failures
pub async fn create_slot(
    db: &DatabaseConnection,
    start_time: NaiveTime,
    end_time: NaiveTime,
    max_orders: i32,
) -> Result<time_slot::Model> {
    if start_time >= end_time {
        return Err(Error::InvalidTimeRange);
    }
    if max_orders < 0 {
        return Err(Error::validation("Max orders must be a non-negative integer"));
    }

    let txn = db.begin().await?;

    let conflicting = TimeSlot::find()
        .filter(time_slot::Column::IsActive.eq(true))
        .order_by_asc(time_slot::Column::StartTime)
        .all(&txn)
        .await?
        .into_iter()
        .find(|slot| slot.overlaps(start_time, end_time));

    if let Some(conflicting) = conflicting {
        info!(
            conflicting_slot = conflicting.id,
            %start_time,
            %end_time,
            "rejected overlapping time slot"
        );
        return Err(Error::SlotOverlap {
            conflicting: Box::new(conflicting),
        });
    }

    let slot = time_slot::ActiveModel {
        start_time: Set(start_time),
        end_time: Set(end_time),
        max_orders: Set(max_orders),
        current_orders: Set(0),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(slot_id = slot.id, %start_time, %end_time, max_orders, "time slot created");
    Ok(slot)
}

/// Updates capacity and/or the active flag.
///
/// Lowering `max_orders` below `current_orders` is allowed; the slot then
/// reports FULL until reservations drain.
pub async fn update_slot(
    db: &DatabaseConnection,
    slot_id: i64,
    changes: SlotChanges,
) -> Result<time_slot::Model> {
    if changes.max_orders.is_none() && changes.is_active.is_none() {
        return Err(Error::validation(
            "At least one field (max_orders, is_active) must be provided",
        ));
    }
    if changes.max_orders.is_some_and(|max| max < 0) {
        return Err(Error::validation("Max orders must be a non-negative integer"));
    }

    let mut slot: time_slot::ActiveModel = get_slot(db, slot_id)
        .await?
        .ok_or(Error::SlotNotFound { slot_id })?
        .into();

    if let Some(max_orders) = changes.max_orders {
        slot.max_orders = Set(max_orders);
    }
    if let Some(is_active) = changes.is_active {
        slot.is_active = Set(is_active);
    }

    slot.update(db).await.map_err(Into::into)
}

/// Forces `current_orders` back to zero. Manual correction only.
pub async fn reset_count(db: &DatabaseConnection, slot_id: i64) -> Result<()> {
    let result = TimeSlot::update_many()
        .col_expr(time_slot::Column::CurrentOrders, Expr::value(0))
        .filter(time_slot::Column::Id.eq(slot_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::SlotNotFound { slot_id });
    }
    info!(slot_id, "time slot reservation count reset");
    Ok(())
}

/// Deletes a slot that no order references.
pub async fn delete_slot(db: &DatabaseConnection, slot_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let referencing = Order::find()
        .filter(order::Column::SlotId.eq(slot_id))
        .count(&txn)
        .await?;
    if referencing > 0 {
        return Err(Error::SlotInUse { slot_id });
    }

    let result = TimeSlot::delete_by_id(slot_id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(Error::SlotNotFound { slot_id });
    }

    txn.commit().await?;
    Ok(())
}
