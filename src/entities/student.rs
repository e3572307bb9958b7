//! Student entity - The ordering side of the canteen.
//!
//! Credentials and verification live with the external auth service; this
//! table only holds what orders and notifications need to reference.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Identity issued by the auth service (the `id` claim)
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, used in staff notifications
    pub name: String,
    /// Contact address; rewritten on deletion so the address can be reused
    pub email: String,
    /// Soft-delete flag; deleted students keep their order history
    pub is_deleted: bool,
    /// When the row was created
    pub created_at: DateTime,
}

/// Defines relationships between Student and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One student has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    /// One student has many cart entries
    #[sea_orm(has_many = "super::cart_entry::Entity")]
    CartEntries,
    /// One student leaves many feedback entries
    #[sea_orm(has_many = "super::feedback::Entity")]
    Feedback,
    /// One student bookmarks many items
    #[sea_orm(has_many = "super::favourite::Entity")]
    Favourites,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::cart_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartEntries.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl Related<super::favourite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favourites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
