//! Order entity - Header rows of the order ledger.
//!
//! Orders are created together with their lines by checkout and are
//! immutable afterwards except for `status` and `is_student_hidden`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fulfilment state of an order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Paid at checkout, waiting for the kitchen
    #[sea_orm(string_value = "PAID")]
    Paid,
    /// Kitchen is working on it
    #[sea_orm(string_value = "PREPARING")]
    Preparing,
    /// Waiting at the counter
    #[sea_orm(string_value = "READY")]
    Ready,
    /// Picked up
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    /// Cancelled before completion
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Ledger-assigned order number
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student who placed the order
    pub student_id: i64,
    /// Pickup slot reserved for the order
    pub slot_id: i64,
    /// Sum of line subtotals at order time, in cents
    pub total_cents: i64,
    /// Current fulfilment state
    pub status: OrderStatus,
    /// Free-text instructions from the student
    pub order_notes: Option<String>,
    /// Hidden from the student's own history (staff still see it)
    pub is_student_hidden: bool,
    /// When the order was placed
    pub created_at: DateTimeUtc,
    /// When the status last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// Each order holds one slot reservation
    #[sea_orm(
        belongs_to = "super::time_slot::Entity",
        from = "Column::SlotId",
        to = "super::time_slot::Column::Id"
    )]
    TimeSlot,
    /// One order has many lines
    #[sea_orm(has_many = "super::order_line::Entity")]
    OrderLines,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::time_slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimeSlot.def()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
