//! Student feedback.
//!
//! Students submit a message with a 1-5 rating; every staff member is told
//! about it through a `FEEDBACK` notification written after the insert.
//! Staff read and delete feedback.

use crate::{
    core::notification,
    entities::{Feedback, NotificationKind, Student, feedback},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_RATING: i32 = 5;
const PREVIEW_CHARS: usize = 30;

/// What a student sends
#[derive(Debug, Clone, Deserialize)]
pub struct NewFeedback {
    /// Comment text, required
    pub message: String,
    /// 1-5, defaults to 5
    pub rating: Option<i32>,
}

/// Feedback joined with its author, for staff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackView {
    /// Feedback id
    pub id: i64,
    /// Author id
    pub student_id: i64,
    /// Author name, if the student row still exists
    pub student_name: Option<String>,
    /// Comment text
    pub message: String,
    /// Score from 1 to 5
    pub rating: i32,
    /// Submission time
    pub created_at: DateTime<Utc>,
}

/// First characters of a message, with an ellipsis when cut.
fn preview(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Stores a student's feedback and tells every staff member about it.
///
/// The staff broadcast happens after the insert; a failure there is logged
/// and the feedback is still kept.
///
/// # Errors
/// - [`Error::Validation`] for a blank message or a rating outside 1-5
/// - [`Error::Database`] for storage failures
pub async fn submit_feedback(
    db: &DatabaseConnection,
    student_id: i64,
    new_feedback: NewFeedback,
) -> Result<feedback::Model> {
    let message = new_feedback.message.trim().to_string();
    if message.is_empty() {
        return Err(Error::validation("Feedback message is required"));
    }
    let rating = new_feedback.rating.unwrap_or(DEFAULT_RATING);
    if !(1..=5).contains(&rating) {
        return Err(Error::validation(format!(
            "Rating must be between 1 and 5, got {rating}"
        )));
    }

    let saved = feedback::ActiveModel {
        student_id: Set(student_id),
        message: Set(message),
        rating: Set(rating),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(feedback_id = saved.id, student_id, rating, "feedback submitted");

    let author = match Student::find_by_id(student_id).one(db).await {
        Ok(Some(student)) => student.name,
        Ok(None) => format!("Student #{student_id}"),
        Err(e) => {
            warn!(feedback_id = saved.id, error = %e, "failed to look up feedback author");
            format!("Student #{student_id}")
        }
    };
    let staff_message = format!(
        "New feedback received from {author}: \"{}\"",
        preview(&saved.message)
    );
    if let Err(e) =
        notification::broadcast_to_staff(db, NotificationKind::Feedback, None, &staff_message).await
    {
        warn!(feedback_id = saved.id, error = %e, "failed to notify staff of feedback");
    }

    Ok(saved)
}

/// All feedback with author names, newest first.
pub async fn list_feedback(db: &DatabaseConnection) -> Result<Vec<FeedbackView>> {
    let rows = Feedback::find()
        .find_also_related(Student)
        .order_by_desc(feedback::Column::CreatedAt)
        .order_by_desc(feedback::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(entry, author)| FeedbackView {
            id: entry.id,
            student_id: entry.student_id,
            student_name: author.map(|s| s.name),
            message: entry.message,
            rating: entry.rating,
            created_at: entry.created_at,
        })
        .collect())
}

/// Removes one feedback entry.
pub async fn delete_feedback(db: &DatabaseConnection, feedback_id: i64) -> Result<()> {
    let result = Feedback::delete_by_id(feedback_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::FeedbackNotFound { feedback_id });
    }
    info!(feedback_id, "feedback deleted");
    Ok(())
}
