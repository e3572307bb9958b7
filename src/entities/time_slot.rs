//! Time slot entity - A pickup window with bounded order capacity.
//!
//! `current_orders` is a reservation counter. It is only ever written by the
//! conditional updates in [`crate::core::timeslot`], which keep
//! `0 <= current_orders <= max_orders` under concurrent checkouts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Time slot database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "time_slots")]
pub struct Model {
    /// Unique identifier for the slot
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Inclusive start of the pickup window
    pub start_time: Time,
    /// Exclusive end of the pickup window
    pub end_time: Time,
    /// Capacity
    pub max_orders: i32,
    /// Reservations currently held
    pub current_orders: i32,
    /// Admission gate; inactive slots accept no reservations
    pub is_active: bool,
    /// When the slot was created
    pub created_at: DateTime,
}

/// Defines relationships between `TimeSlot` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One slot has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Seats left before the slot is full; never negative.
    #[must_use]
    pub fn remaining_capacity(&self) -> i32 {
        (self.max_orders - self.current_orders).max(0)
    }

    /// Half-open interval intersection with `[start, end)`.
    #[must_use]
    pub fn overlaps(&self, start: Time, end: Time) -> bool {
        self.start_time < end && self.end_time > start
    }
}
