//! Identities, the minimal student/staff tables, and the staff-side student
//! directory.
//!
//! Authentication happens upstream; callers arrive here with an [`Identity`]
//! that already carries a verified id and role. Students are soft-deleted so
//! their orders keep an owner.

use crate::{
    core::{
        ledger::{self, OrderView},
        money,
    },
    entities::{
        CartEntry, Favourite, Order, Staff, Student, cart_entry, favourite, order, staff, student,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Role claim carried by an authenticated request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Places orders
    Student,
    /// Runs the canteen
    Staff,
}

/// A verified caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Row id in `students` or `staff`, depending on `role`
    pub id: i64,
    /// Which table `id` refers to
    pub role: Role,
}

impl Identity {
    /// Student identity
    #[must_use]
    pub const fn student(id: i64) -> Self {
        Self {
            id,
            role: Role::Student,
        }
    }

    /// Staff identity
    #[must_use]
    pub const fn staff(id: i64) -> Self {
        Self {
            id,
            role: Role::Staff,
        }
    }
}

fn validate_person(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Name cannot be empty"));
    }
    if !email.contains('@') {
        return Err(Error::validation(format!("Invalid email address: {email}")));
    }
    Ok(())
}

/// Inserts a student row.
pub async fn create_student(db: &DatabaseConnection, name: &str, email: &str) -> Result<student::Model> {
    validate_person(name, email)?;

    student::ActiveModel {
        name: Set(name.trim().to_string()),
        email: Set(email.trim().to_string()),
        is_deleted: Set(false),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a staff row.
pub async fn create_staff(db: &DatabaseConnection, name: &str, email: &str) -> Result<staff::Model> {
    validate_person(name, email)?;

    staff::ActiveModel {
        name: Set(name.trim().to_string()),
        email: Set(email.trim().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Looks up a student by id.
pub async fn get_student<C: ConnectionTrait>(db: &C, student_id: i64) -> Result<Option<student::Model>> {
    Student::find_by_id(student_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Ids of every staff member, used for broadcast notifications.
pub async fn list_staff_ids<C: ConnectionTrait>(db: &C) -> Result<Vec<i64>> {
    Staff::find()
        .select_only()
        .column(staff::Column::Id)
        .order_by_asc(staff::Column::Id)
        .into_tuple()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of staff rows; used to decide whether seeding is needed.
pub async fn count_staff(db: &DatabaseConnection) -> Result<u64> {
    Staff::find().count(db).await.map_err(Into::into)
}

/// A student row with their order totals, for the staff directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    /// Student id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Contact address
    pub email: String,
    /// When the student was registered
    pub created_at: chrono::NaiveDateTime,
    /// Orders ever placed, cancelled ones included
    pub total_orders: u64,
    /// Sum of every non-cancelled order
    pub total_spent: Decimal,
}

/// A student's name with their complete order history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentHistory {
    /// Display name
    pub student_name: String,
    /// Every order, newest first, including ones the student hid
    pub orders: Vec<OrderView>,
}

/// Every student that has not been deleted, newest first, with order totals.
pub async fn list_students(db: &DatabaseConnection) -> Result<Vec<StudentSummary>> {
    let students = Student::find()
        .filter(student::Column::IsDeleted.eq(false))
        .order_by_desc(student::Column::CreatedAt)
        .order_by_desc(student::Column::Id)
        .all(db)
        .await?;
    if students.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = students.iter().map(|s| s.id).collect();
    let mut totals: HashMap<i64, (u64, i64)> = HashMap::new();
    for order in Order::find()
        .filter(order::Column::StudentId.is_in(ids))
        .all(db)
        .await?
    {
        let entry = totals.entry(order.student_id).or_default();
        entry.0 += 1;
        if order.status.is_revenue() {
            entry.1 = entry.1.saturating_add(order.total_cents);
        }
    }

    Ok(students
        .into_iter()
        .map(|student| {
            let (total_orders, spent_cents) = totals.get(&student.id).copied().unwrap_or_default();
            StudentSummary {
                id: student.id,
                name: student.name,
                email: student.email,
                created_at: student.created_at,
                total_orders,
                total_spent: money::from_cents(spent_cents),
            }
        })
        .collect())
}

/// Full order history of one student, for staff.
///
/// Deleted students are still found so their history stays reviewable.
pub async fn get_student_history(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<StudentHistory> {
    let student = get_student(db, student_id)
        .await?
        .ok_or(Error::StudentNotFound { student_id })?;
    let orders = ledger::get_all_student_orders(db, student_id).await?;
    Ok(StudentHistory {
        student_name: student.name,
        orders,
    })
}

/// Soft-deletes a student.
///
/// The row stays so existing orders keep their owner. The email is suffixed
/// with `_deleted_<millis>` so the address can register again, and the
/// student's cart and favourites are cleared in the same transaction.
pub async fn delete_student(db: &DatabaseConnection, student_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let student = Student::find_by_id(student_id)
        .filter(student::Column::IsDeleted.eq(false))
        .one(&txn)
        .await?
        .ok_or(Error::StudentNotFound { student_id })?;

    let email = format!(
        "{}_deleted_{}",
        student.email,
        chrono::Utc::now().timestamp_millis()
    );
    let mut active: student::ActiveModel = student.into();
    active.is_deleted = Set(true);
    active.email = Set(email);
    active.update(&txn).await?;

    CartEntry::delete_many()
        .filter(cart_entry::Column::StudentId.eq(student_id))
        .exec(&txn)
        .await?;
    Favourite::delete_many()
        .filter(favourite::Column::StudentId.eq(student_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    info!(student_id, "student deleted");
    Ok(())
}
