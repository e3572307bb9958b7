//! Feedback entity - Free-text comments students leave for the canteen.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Feedback database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    /// Unique identifier for the feedback
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Author
    pub student_id: i64,
    /// Comment text
    pub message: String,
    /// Score from 1 to 5
    pub rating: i32,
    /// When it was submitted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Feedback and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each feedback row belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
