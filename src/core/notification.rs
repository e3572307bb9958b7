//! Notification business logic.
//!
//! Writes are side effects of order and feedback events. Callers issue them only after
//! their own transaction has committed and log, rather than propagate, any
//! failure. Reads are always scoped to the requesting identity.

use crate::{
    core::account::{self, Identity, Role},
    entities::{Notification, NotificationKind, RecipientType, notification},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};

const LIST_LIMIT: u64 = 50;

fn recipient_filter(recipient: &Identity) -> sea_orm::Condition {
    let condition = sea_orm::Condition::all();
    match recipient.role {
        Role::Student => condition
            .add(notification::Column::RecipientType.eq(RecipientType::Student))
            .add(notification::Column::StudentId.eq(recipient.id)),
        Role::Staff => condition
            .add(notification::Column::RecipientType.eq(RecipientType::Staff))
            .add(notification::Column::StaffId.eq(recipient.id)),
    }
}

/// Inserts one order notification addressed to a student.
pub async fn notify_student<C>(
    db: &C,
    student_id: i64,
    order_id: i64,
    message: String,
) -> Result<notification::Model>
where
    C: ConnectionTrait,
{
    notification::ActiveModel {
        recipient_type: Set(RecipientType::Student),
        student_id: Set(Some(student_id)),
        staff_id: Set(None),
        order_id: Set(Some(order_id)),
        message: Set(message),
        kind: Set(NotificationKind::Order),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Fans an order notification out to every staff member.
///
/// Returns the number of rows written (zero when there is no staff).
pub async fn notify_all_staff<C>(db: &C, order_id: i64, message: &str) -> Result<usize>
where
    C: ConnectionTrait,
{
    broadcast_to_staff(db, NotificationKind::Order, Some(order_id), message).await
}

/// Fans a notification of any kind out to every staff member, one row each.
///
/// `order_id` is `None` for events that are not about an order, such as
/// feedback. Returns the number of rows written.
pub async fn broadcast_to_staff<C>(
    db: &C,
    kind: NotificationKind,
    order_id: Option<i64>,
    message: &str,
) -> Result<usize>
where
    C: ConnectionTrait,
{
    let staff_ids = account::list_staff_ids(db).await?;
    if staff_ids.is_empty() {
        return Ok(0);
    }

    let now = chrono::Utc::now();
    let rows: Vec<notification::ActiveModel> = staff_ids
        .iter()
        .map(|staff_id| notification::ActiveModel {
            recipient_type: Set(RecipientType::Staff),
            student_id: Set(None),
            staff_id: Set(Some(*staff_id)),
            order_id: Set(order_id),
            message: Set(message.to_string()),
            kind: Set(kind),
            is_read: Set(false),
            created_at: Set(now),
            ..Default::default()
        })
        .collect();

    let count = rows.len();
    Notification::insert_many(rows).exec(db).await?;
    Ok(count)
}

/// The recipient's 50 most recent notifications, newest first.
pub async fn list_for(
    db: &DatabaseConnection,
    recipient: &Identity,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(recipient_filter(recipient))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .limit(LIST_LIMIT)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of unread notifications for the recipient.
pub async fn unread_count(db: &DatabaseConnection, recipient: &Identity) -> Result<u64> {
    Notification::find()
        .filter(recipient_filter(recipient))
        .filter(notification::Column::IsRead.eq(false))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Marks one of the recipient's notifications as read.
///
/// Notifications addressed to someone else are reported as not found.
pub async fn mark_read(
    db: &DatabaseConnection,
    recipient: &Identity,
    notification_id: i64,
) -> Result<()> {
    let result = Notification::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .filter(notification::Column::Id.eq(notification_id))
        .filter(recipient_filter(recipient))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotificationNotFound { notification_id });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_notify_all_staff_fans_out() -> Result<()> {
        let (db, fixture) = setup_with_placed_order().await?;
        let second = create_test_staff(&db, "Meena").await?;

        let written = notify_all_staff(&db, fixture.order_id, "hello staff").await?;
        assert_eq!(written, 2);

        let for_second = list_for(&db, &Identity::staff(second.id)).await?;
        assert_eq!(for_second.len(), 1);
        assert_eq!(for_second[0].message, "hello staff");
        assert_eq!(for_second[0].order_id, Some(fixture.order_id));
        Ok(())
    }

    #[tokio::test]
    async fn test_broadcast_without_order() -> Result<()> {
        let db = setup_test_db().await?;
        let staff = create_test_staff(&db, "Ravi").await?;

        let written =
            broadcast_to_staff(&db, NotificationKind::Feedback, None, "new feedback").await?;
        assert_eq!(written, 1);

        let notes = list_for(&db, &Identity::staff(staff.id)).await?;
        assert_eq!(notes[0].kind, NotificationKind::Feedback);
        assert_eq!(notes[0].order_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_notify_all_staff_without_staff() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(notify_all_staff(&db, 1, "nobody").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_are_scoped_to_recipient() -> Result<()> {
        let (db, fixture) = setup_with_placed_order().await?;
        let other = create_test_student(&db, "Ravi").await?;

        let mine = Identity::student(fixture.student_id);
        let theirs = Identity::student(other.id);

        // Checkout already wrote one "order placed" notification
        let before = unread_count(&db, &mine).await?;
        notify_student(&db, fixture.student_id, fixture.order_id, "extra".to_string()).await?;
        assert_eq!(unread_count(&db, &mine).await?, before + 1);
        assert_eq!(unread_count(&db, &theirs).await?, 0);

        let latest = list_for(&db, &mine).await?;
        assert_eq!(latest[0].message, "extra");

        assert!(matches!(
            mark_read(&db, &theirs, latest[0].id).await,
            Err(Error::NotificationNotFound { .. })
        ));
        mark_read(&db, &mine, latest[0].id).await?;
        assert_eq!(unread_count(&db, &mine).await?, before);
        Ok(())
    }
}
