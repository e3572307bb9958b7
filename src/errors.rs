//! Unified error types for the canteen ordering service.
//!
//! Every core operation returns [`Result`]. The variants separate expected,
//! user-facing rejections (admission denial, validation, not found) from
//! storage failures so the HTTP layer can choose a status code and decide
//! what gets logged.

use crate::entities::time_slot;
use thiserror::Error;

/// Errors produced by the ordering core and its HTTP surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Any storage failure surfaced by `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Client supplied a malformed or out-of-range value
    #[error("{message}")]
    Validation {
        /// Human readable reason
        message: String,
    },

    /// Admission denied: the slot is full, inactive, or lost the race
    #[error("Time slot {slot_id} is full or inactive. Please choose another.")]
    SlotUnavailable {
        /// Slot that refused the reservation
        slot_id: i64,
    },

    /// No time slot with this id
    #[error("Time slot {slot_id} not found")]
    SlotNotFound {
        /// Requested slot
        slot_id: i64,
    },

    /// New slot intersects an existing active slot
    #[error("New slot overlaps with an existing active slot ({}-{})", conflicting.start_time, conflicting.end_time)]
    SlotOverlap {
        /// The first active slot found to intersect
        conflicting: Box<time_slot::Model>,
    },

    /// Slot cannot be deleted while orders reference it
    #[error("Cannot delete time slot {slot_id} because it has existing orders. Try deactivating it instead.")]
    SlotInUse {
        /// Slot that is still referenced
        slot_id: i64,
    },

    /// Capacity release had nothing to release
    #[error("Could not decrease order count for slot {slot_id} (already at zero or slot missing)")]
    NothingToRelease {
        /// Slot that was targeted
        slot_id: i64,
    },

    /// Start time is not strictly before end time
    #[error("Start time must be before end time")]
    InvalidTimeRange,

    /// Checkout attempted with no cart entries
    #[error("Cart is empty")]
    EmptyCart,

    /// Requested quantity exceeds current stock
    #[error("Insufficient stock for '{item}': available {available}, requested {requested}")]
    InsufficientStock {
        /// Menu item name
        item: String,
        /// Stock on hand when checked
        available: i32,
        /// Quantity asked for
        requested: i32,
    },

    /// Menu item exists but is not currently sold
    #[error("Item '{item}' is not available")]
    ItemUnavailable {
        /// Menu item name
        item: String,
    },

    /// No menu item with this id (or it was deleted)
    #[error("Menu item {item_id} not found")]
    MenuItemNotFound {
        /// Requested item
        item_id: i64,
    },

    /// No order with this id visible to the caller
    #[error("Order {order_id} not found")]
    OrderNotFound {
        /// Requested order
        order_id: i64,
    },

    /// No notification with this id for the caller
    #[error("Notification {notification_id} not found")]
    NotificationNotFound {
        /// Requested notification
        notification_id: i64,
    },

    /// No student with this id
    #[error("Student {student_id} not found")]
    StudentNotFound {
        /// Requested student
        student_id: i64,
    },

    /// No feedback entry with this id
    #[error("Feedback {feedback_id} not found")]
    FeedbackNotFound {
        /// Requested feedback
        feedback_id: i64,
    },

    /// Status string is not one of the known order states
    #[error("Invalid status: {status}")]
    InvalidStatus {
        /// The rejected input
        status: String,
    },

    /// Status change not permitted by the order state machine
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Missing or invalid bearer token
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated, but the role may not use this route
    #[error("Access denied")]
    Forbidden,

    /// I/O failure (config file, socket bind)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for expected rejections that callers should not log as failures.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Io(_) | Self::Config { .. })
    }
}
