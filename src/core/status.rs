//! Order status machine.
//!
//! ```text
//! PAID -> PREPARING -> READY -> COMPLETED
//!   \________\___________\_____> CANCELLED
//! ```
//!
//! Forward moves may skip states. `COMPLETED` and `CANCELLED` are terminal.
//! Status writes are conditional on the status that was read, so two staff
//! members racing on the same order cannot both win. Cancelling also hands
//! the order's slot seat back in the same transaction.

use crate::{
    core::{notification, timeslot},
    entities::{Order, OrderStatus, order},
    errors::{Error, Result},
};
use sea_orm::{TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{error, info, warn};

impl OrderStatus {
    /// Every status, in fulfilment order.
    pub const ALL: [Self; 5] = [
        Self::Paid,
        Self::Preparing,
        Self::Ready,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Upper-case wire name (`"PAID"`, ...)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "PAID",
            Self::Preparing => "PREPARING",
            Self::Ready => "READY",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses one of the five wire names, ignoring case.
    ///
    /// # Errors
    /// Returns [`Error::InvalidStatus`] for anything else.
    pub fn parse(raw: &str) -> Result<Self> {
        let upper = raw.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| Error::InvalidStatus {
                status: raw.to_string(),
            })
    }

    /// Parses the staff dashboard filter, which uses kitchen vocabulary
    /// (`pending` means `PAID`) but also accepts raw status names.
    pub fn parse_staff_filter(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Paid),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "completed" => Ok(Self::Completed),
            _ => Self::parse(raw),
        }
    }

    /// No further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Counts toward revenue and spending.
    #[must_use]
    pub const fn is_revenue(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Paid => 0,
            Self::Preparing => 1,
            Self::Ready => 2,
            Self::Completed => 3,
            Self::Cancelled => 4,
        }
    }

    /// Whether `self -> next` is a legal move.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }

    /// Message sent to the student when an order enters this state.
    #[must_use]
    pub fn student_message(self, order_id: i64) -> Option<String> {
        match self {
            Self::Paid => None,
            Self::Preparing => Some(format!("Your order #{order_id} is being prepared.")),
            Self::Ready => Some(format!("Your order #{order_id} is READY for pickup!")),
            Self::Completed => Some(format!(
                "Your order #{order_id} has been COMPLETED. Enjoy your meal!"
            )),
            Self::Cancelled => Some(format!("Your order #{order_id} has been cancelled.")),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moves the order from `current.status` to `next` if nobody changed it meanwhile.
async fn write_transition<C>(db: &C, current: &order::Model, next: OrderStatus) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    if !current.status.can_transition_to(next) {
        return Err(Error::InvalidTransition {
            from: current.status.to_string(),
            to: next.to_string(),
        });
    }

    let result = Order::update_many()
        .col_expr(order::Column::Status, Expr::value(next))
        .col_expr(order::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(order::Column::Id.eq(current.id))
        .filter(order::Column::Status.eq(current.status))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        // Someone else moved it first; report against what is stored now
        let stored = Order::find_by_id(current.id)
            .one(db)
            .await?
            .ok_or(Error::OrderNotFound {
                order_id: current.id,
            })?;
        return Err(Error::InvalidTransition {
            from: stored.status.to_string(),
            to: next.to_string(),
        });
    }

    Ok(order::Model {
        status: next,
        ..current.clone()
    })
}

async fn notify_transition(db: &DatabaseConnection, updated: &order::Model) {
    let Some(message) = updated.status.student_message(updated.id) else {
        return;
    };

    if let Err(e) =
        notification::notify_student(db, updated.student_id, updated.id, message).await
    {
        warn!(order_id = updated.id, error = %e, "failed to notify student of status change");
    }
}

/// Transitions an order and notifies its student.
///
/// Orders only move forward along `PAID → PREPARING → READY → COMPLETED`,
/// possibly skipping steps, and can be cancelled from any non-terminal state.
/// The write is conditional on the status that was read, so two staff members
/// updating the same order at once cannot both succeed.
///
/// Moving to `CANCELLED` goes through [`cancel_order_with_release`] so the
/// slot seat is returned atomically with the status change. The student
/// notification is sent after the write and its failure is only logged.
///
/// # Arguments
/// * `db` - Database connection
/// * `order_id` - Order to transition
/// * `next` - Target status
///
/// # Returns
/// The order as stored after the transition.
///
/// # Errors
/// - [`Error::OrderNotFound`] when the order does not exist
/// - [`Error::InvalidTransition`] for backward, same-state or post-terminal moves,
///   including losing a race against another update
/// - [`Error::Database`] for storage failures
pub async fn set_status(
    db: &DatabaseConnection,
    order_id: i64,
    next: OrderStatus,
) -> Result<order::Model> {
    if next == OrderStatus::Cancelled {
        return cancel_order_with_release(db, order_id).await;
    }

    let current = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { order_id })?;

    let updated = write_transition(db, &current, next)
        .await
        .inspect_err(|e| {
            if !e.is_client_error() {
                error!(order_id, status = %next, error = %e, "set_status failed");
            }
        })?;

    info!(order_id, from = %current.status, to = %next, "order status changed");
    notify_transition(db, &updated).await;
    Ok(updated)
}

/// Cancels an order and releases its slot seat in one transaction.
///
/// If the slot counter was already zero (for example after a manual reset)
/// the cancellation still succeeds and the skipped release is logged.
pub async fn cancel_order_with_release(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<order::Model> {
    let txn = db.begin().await?;

    let outcome = async {
        let current = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or(Error::OrderNotFound { order_id })?;

        let updated = write_transition(&txn, &current, OrderStatus::Cancelled).await?;
        let released = timeslot::release(&txn, updated.slot_id).await?;
        Ok::<_, Error>((updated, released))
    }
    .await;

    let (updated, released) = match outcome {
        Ok(done) => done,
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                error!(order_id, error = %rollback_err, "rollback failed after cancel error");
            }
            if !e.is_client_error() {
                error!(order_id, error = %e, "cancel_order_with_release failed");
            }
            return Err(e);
        }
    };

    txn.commit().await?;

    if !released {
        warn!(
            order_id,
            slot_id = updated.slot_id,
            "cancelled order but slot counter was already at zero"
        );
    }
    info!(order_id, slot_id = updated.slot_id, "order cancelled");

    notify_transition(db, &updated).await;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{account::Identity, timeslot};
    use crate::entities::{Notification, notification as notification_entity};
    use crate::test_utils::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(OrderStatus::parse("READY").unwrap(), OrderStatus::Ready);
        assert_eq!(OrderStatus::parse("cancelled").unwrap(), OrderStatus::Cancelled);
        assert!(matches!(
            OrderStatus::parse("SHIPPED"),
            Err(Error::InvalidStatus { .. })
        ));
    }

    #[test]
    fn test_parse_staff_filter_translates_pending() {
        assert_eq!(
            OrderStatus::parse_staff_filter("pending").unwrap(),
            OrderStatus::Paid
        );
        assert_eq!(
            OrderStatus::parse_staff_filter("PAID").unwrap(),
            OrderStatus::Paid
        );
        assert_eq!(
            OrderStatus::parse_staff_filter("Cancelled").unwrap(),
            OrderStatus::Cancelled
        );
        assert!(OrderStatus::parse_staff_filter("lost").is_err());
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::{Cancelled, Completed, Paid, Preparing, Ready};

        assert!(Paid.can_transition_to(Preparing));
        assert!(Paid.can_transition_to(Ready));
        assert!(Preparing.can_transition_to(Completed));
        assert!(Ready.can_transition_to(Cancelled));

        assert!(!Completed.can_transition_to(Preparing));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Paid));
        assert!(!Ready.can_transition_to(Preparing));
        assert!(!Paid.can_transition_to(Paid));
    }

    #[tokio::test]
    async fn test_set_status_ready_notifies_student_once() -> Result<()> {
        let (db, fixture) = setup_with_placed_order().await?;

        let student_notes = || {
            Notification::find()
                .filter(notification_entity::Column::StudentId.eq(fixture.student_id))
                .filter(notification_entity::Column::OrderId.eq(fixture.order_id))
        };
        let before = student_notes().count(&db).await?;

        let updated = set_status(&db, fixture.order_id, OrderStatus::Ready).await?;
        assert_eq!(updated.status, OrderStatus::Ready);

        let notes = student_notes().all(&db).await?;
        assert_eq!(notes.len() as u64, before + 1);
        let newest = notes.iter().max_by_key(|n| n.id).unwrap();
        assert!(newest.message.contains("READY"));
        assert_eq!(newest.order_id, Some(fixture.order_id));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_status_rejects_backwards_move() -> Result<()> {
        let (db, fixture) = setup_with_placed_order().await?;

        set_status(&db, fixture.order_id, OrderStatus::Completed).await?;
        let result = set_status(&db, fixture.order_id, OrderStatus::Preparing).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));

        let result = set_status(&db, fixture.order_id, OrderStatus::Cancelled).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_status_unknown_order() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            set_status(&db, 404, OrderStatus::Ready).await,
            Err(Error::OrderNotFound { order_id: 404 })
        ));
        assert!(matches!(
            cancel_order_with_release(&db, 404).await,
            Err(Error::OrderNotFound { order_id: 404 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_releases_slot_capacity() -> Result<()> {
        let (db, fixture) = setup_with_placed_order().await?;
        let before = timeslot::get_slot(&db, fixture.slot_id).await?.unwrap();
        assert_eq!(before.current_orders, 1);

        let cancelled = set_status(&db, fixture.order_id, OrderStatus::Cancelled).await?;
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let after = timeslot::get_slot(&db, fixture.slot_id).await?.unwrap();
        assert_eq!(after.current_orders, 0);

        // A second cancel is rejected and does not release again
        assert!(cancel_order_with_release(&db, fixture.order_id).await.is_err());
        let still = timeslot::get_slot(&db, fixture.slot_id).await?.unwrap();
        assert_eq!(still.current_orders, 0);

        let notes = notification::list_for(&db, &Identity::student(fixture.student_id)).await?;
        assert!(notes[0].message.contains("cancelled"));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_after_reset_still_succeeds() -> Result<()> {
        let (db, fixture) = setup_with_placed_order().await?;
        timeslot::reset_count(&db, fixture.slot_id).await?;

        let cancelled = cancel_order_with_release(&db, fixture.order_id).await?;
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        let slot = timeslot::get_slot(&db, fixture.slot_id).await?.unwrap();
        assert_eq!(slot.current_orders, 0);
        Ok(())
    }
}
