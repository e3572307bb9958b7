//! Menu item entity - The inventory store.
//!
//! Each item carries a price in cents, a stock `quantity`, and an
//! `is_available` gate that is independent of stock. Stock is decremented
//! only by checkout; staff edits may set it directly.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown on the menu (e.g., "Tea", "Veg Sandwich")
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Menu grouping (e.g., "beverages", "snacks")
    pub category: String,
    /// Current unit price in cents
    pub price_cents: i64,
    /// Units in stock
    pub quantity: i32,
    /// Below this many units the item reports limited stock
    pub low_stock_threshold: i32,
    /// Whether the item can be ordered at all
    pub is_available: bool,
    /// Soft delete flag - deleted items stay referenced by historical orders
    pub is_deleted: bool,
    /// When the item was created
    pub created_at: DateTime,
    /// When the item was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between `MenuItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One item appears in many cart entries
    #[sea_orm(has_many = "super::cart_entry::Entity")]
    CartEntries,
    /// One item appears in many order lines
    #[sea_orm(has_many = "super::order_line::Entity")]
    OrderLines,
    /// One item is bookmarked by many students
    #[sea_orm(has_many = "super::favourite::Entity")]
    Favourites,
}

impl Related<super::cart_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartEntries.def()
    }
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLines.def()
    }
}

impl Related<super::favourite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favourites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
