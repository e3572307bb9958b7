//! Notification entity - Write-only side effects of order events.
//!
//! A row targets exactly one recipient: a student (`student_id`) or a staff
//! member (`staff_id`). Staff broadcasts are fanned out to one row per staff
//! member.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Who a notification is addressed to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    /// A student
    #[sea_orm(string_value = "student")]
    Student,
    /// A staff member
    #[sea_orm(string_value = "staff")]
    Staff,
}

/// What kind of event produced the notification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    /// Order placed or status changed
    #[sea_orm(string_value = "ORDER")]
    Order,
    /// Feedback received or answered
    #[sea_orm(string_value = "FEEDBACK")]
    Feedback,
}

/// Notification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier for the notification
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Whether a student or a staff member receives it
    pub recipient_type: RecipientType,
    /// Recipient when `recipient_type` is student
    pub student_id: Option<i64>,
    /// Recipient when `recipient_type` is staff
    pub staff_id: Option<i64>,
    /// Order the notification is about, if any
    pub order_id: Option<i64>,
    /// Message text
    pub message: String,
    /// Event category
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Whether the recipient has read it
    pub is_read: bool,
    /// When it was created
    pub created_at: DateTimeUtc,
}

/// Notifications are looked up by recipient columns, not via relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
