//! Checkout orchestration - turns a student's cart into an order.
//!
//! [`complete_order`] runs as one database transaction, in this order:
//!
//! 1. reserve a seat in the pickup slot ([`timeslot::try_reserve`])
//! 2. read the cart joined with current menu prices and stock
//! 3. total the lines using those prices
//! 4. insert the order header as `PAID`
//! 5. insert one line per cart entry with the price snapshot
//! 6. take the ordered units out of stock (guarded, never below zero)
//! 7. clear the cart
//!
//! Any failure rolls the whole transaction back, including the seat taken in
//! step 1. Notifications go out only after commit and cannot undo the order.

use crate::{
    core::{account, cart, menu, notification, timeslot},
    entities::{
        CartEntry, MenuItem, OrderLine, OrderStatus, cart_entry, menu_item, order, order_line,
    },
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{error, info, warn};

/// What a successful checkout produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    /// The order header
    pub order: order::Model,
    /// Its lines, in cart order
    pub lines: Vec<order_line::Model>,
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Advisory pre-flight check used before the client starts payment.
///
/// Reports why the slot would be refused right now. Passing this check does
/// not guarantee [`complete_order`] will get a seat.
pub async fn validate_checkout(db: &DatabaseConnection, slot_id: i64) -> Result<()> {
    let availability = timeslot::check_availability(db, slot_id).await?;

    if !availability.exists {
        return Err(Error::SlotNotFound { slot_id });
    }
    if !availability.is_active || !availability.has_capacity {
        return Err(Error::SlotUnavailable { slot_id });
    }
    Ok(())
}

/// Places an order for everything in the student's cart.
///
/// The seat reservation, order header, order lines, stock decrements and cart
/// clear all happen in one transaction. The seat is taken first with a single
/// conditional update, so two students racing for the last seat cannot both
/// get it; the loser's transaction never writes anything else.
///
/// Prices are read from the catalog inside the transaction and frozen onto
/// each order line. After commit the student and every staff member get a
/// notification. Notification failures are logged and do not affect the
/// returned order.
///
/// # Arguments
/// * `db` - Database connection; the transaction is opened on it
/// * `student_id` - Owner of the cart being checked out
/// * `slot_id` - Pickup slot to reserve a seat in
/// * `notes` - Free-text instructions; trimmed, and dropped when blank
///
/// # Returns
/// The committed order header and its lines, in cart order.
///
/// # Errors
/// - [`Error::SlotUnavailable`] when the slot is full, inactive or missing
/// - [`Error::EmptyCart`] when there is nothing to order
/// - [`Error::InsufficientStock`] / [`Error::ItemUnavailable`] when the cart
///   no longer matches the catalog
/// - [`Error::MenuItemNotFound`] when a cart item has been deleted
/// - [`Error::Validation`] when the order total does not fit in cents
/// - [`Error::Database`] for storage failures
///
/// In every error case the slot counter, stock, cart and ledger are left
/// exactly as they were.
pub async fn complete_order(
    db: &DatabaseConnection,
    student_id: i64,
    slot_id: i64,
    notes: Option<String>,
) -> Result<PlacedOrder> {
    let notes = normalize_notes(notes);
    let txn = db.begin().await?;

    let placed = match place_order(&txn, student_id, slot_id, notes).await {
        Ok(placed) => placed,
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                error!(student_id, slot_id, error = %rollback_err, "rollback failed after checkout error");
            }
            if e.is_client_error() {
                info!(student_id, slot_id, reason = %e, "checkout rejected");
            } else {
                error!(student_id, slot_id, error = %e, "complete_order failed");
            }
            return Err(e);
        }
    };

    txn.commit()
        .await
        .inspect_err(|e| error!(student_id, slot_id, error = %e, "checkout commit failed"))?;

    info!(
        order_id = placed.order.id,
        student_id,
        slot_id,
        total_cents = placed.order.total_cents,
        lines = placed.lines.len(),
        "order placed"
    );

    announce_order(db, &placed.order).await;
    Ok(placed)
}

/// Steps 1-7. Must only touch `txn`; the caller owns commit and rollback.
async fn place_order(
    txn: &DatabaseTransaction,
    student_id: i64,
    slot_id: i64,
    notes: Option<String>,
) -> Result<PlacedOrder> {
    if !timeslot::try_reserve(txn, slot_id).await? {
        return Err(Error::SlotUnavailable { slot_id });
    }

    let entries = CartEntry::find()
        .filter(cart_entry::Column::StudentId.eq(student_id))
        .find_also_related(MenuItem)
        .order_by_asc(cart_entry::Column::Id)
        .all(txn)
        .await?;

    if entries.is_empty() {
        return Err(Error::EmptyCart);
    }

    let mut items = Vec::with_capacity(entries.len());
    for (entry, item) in entries {
        let item = item
            .filter(|item| !item.is_deleted)
            .ok_or(Error::MenuItemNotFound {
                item_id: entry.menu_item_id,
            })?;
        if !item.is_available {
            return Err(Error::ItemUnavailable { item: item.name });
        }
        items.push((entry, item));
    }

    let total_cents = order_total_cents(&items)?;

    let now = chrono::Utc::now();
    let order = order::ActiveModel {
        student_id: Set(student_id),
        slot_id: Set(slot_id),
        total_cents: Set(total_cents),
        status: Set(OrderStatus::Paid),
        order_notes: Set(notes),
        is_student_hidden: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let mut lines = Vec::with_capacity(items.len());
    for (entry, item) in &items {
        let line = order_line::ActiveModel {
            order_id: Set(order.id),
            menu_item_id: Set(item.id),
            quantity: Set(entry.quantity),
            price_at_order_cents: Set(item.price_cents),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        lines.push(line);
    }

    for (entry, item) in &items {
        if !menu::decrement_stock(txn, item.id, entry.quantity).await? {
            return Err(Error::InsufficientStock {
                item: item.name.clone(),
                available: item.quantity,
                requested: entry.quantity,
            });
        }
    }

    cart::clear_cart(txn, student_id).await?;

    Ok(PlacedOrder { order, lines })
}

/// Sum of `price * quantity` over the cart, refusing totals that do not fit in cents.
fn order_total_cents(items: &[(cart_entry::Model, menu_item::Model)]) -> Result<i64> {
    items.iter().try_fold(0_i64, |total, (entry, item)| {
        item.price_cents
            .checked_mul(i64::from(entry.quantity))
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| Error::validation("Order total is out of range"))
    })
}

/// Best-effort notifications for a committed order. Failures are logged only.
async fn announce_order(db: &DatabaseConnection, order: &order::Model) {
    let student_message = format!(
        "Your order #{} has been placed and paid. We'll let you know when it's ready.",
        order.id
    );
    if let Err(e) =
        notification::notify_student(db, order.student_id, order.id, student_message).await
    {
        warn!(order_id = order.id, error = %e, "failed to notify student of new order");
    }

    let student_name = match account::get_student(db, order.student_id).await {
        Ok(Some(student)) => student.name,
        Ok(None) => "A student".to_string(),
        Err(e) => {
            warn!(order_id = order.id, error = %e, "failed to look up student name");
            "A student".to_string()
        }
    };
    let staff_message = format!("New order #{} received from {student_name}!", order.id);
    if let Err(e) = notification::notify_all_staff(db, order.id, &staff_message).await {
        warn!(order_id = order.id, error = %e, "failed to notify staff of new order");
    }
}

/// Gives one seat back to a slot without touching any order.
///
/// Kept for clients that undo a reservation on their own; cancelling a real
/// order should go through [`crate::core::status::cancel_order_with_release`].
pub async fn cancel_slot_reservation(db: &DatabaseConnection, slot_id: i64) -> Result<()> {
    if timeslot::release(db, slot_id).await? {
        info!(slot_id, "slot capacity restored");
        Ok(())
    } else {
        Err(Error::NothingToRelease { slot_id })
    }
}

/// Lines of an order, for callers that only have the id.
pub async fn lines_for_order(db: &DatabaseConnection, order_id: i64) -> Result<Vec<order_line::Model>> {
    OrderLine::find()
        .filter(order_line::Column::OrderId.eq(order_id))
        .order_by_asc(order_line::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
