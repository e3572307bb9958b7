//! Favourite entity - A student's bookmarked menu items.
//!
//! At most one row per (student, menu item) pair, enforced by a unique index.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Favourite database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "favourites")]
pub struct Model {
    /// Unique identifier for the favourite
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student who bookmarked the item
    pub student_id: i64,
    /// Bookmarked item
    pub menu_item_id: i64,
    /// When it was bookmarked
    pub created_at: DateTime,
}

/// Defines relationships between Favourite and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each favourite belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// Each favourite points at one menu item
    #[sea_orm(
        belongs_to = "super::menu_item::Entity",
        from = "Column::MenuItemId",
        to = "super::menu_item::Column::Id"
    )]
    MenuItem,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::menu_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
