//! Maps core errors onto HTTP responses.
//!
//! Bodies always have the shape `{"success": false, "message": ...}`. Storage
//! and configuration failures are logged here and reported generically.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// HTTP status for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::EmptyCart
            | Self::SlotUnavailable { .. }
            | Self::InvalidTimeRange
            | Self::InsufficientStock { .. }
            | Self::ItemUnavailable { .. }
            | Self::InvalidStatus { .. }
            | Self::InvalidTransition { .. }
            | Self::NothingToRelease { .. }
            | Self::SlotInUse { .. } => StatusCode::BAD_REQUEST,
            Self::SlotNotFound { .. }
            | Self::MenuItemNotFound { .. }
            | Self::OrderNotFound { .. }
            | Self::NotificationNotFound { .. }
            | Self::StudentNotFound { .. }
            | Self::FeedbackNotFound { .. } => StatusCode::NOT_FOUND,
            Self::SlotOverlap { .. } => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            Self::SlotOverlap { conflicting } => json!({
                "success": false,
                "message": self.to_string(),
                "conflictingSlot": conflicting,
            }),
            _ if status.is_server_error() => {
                error!(error = %self, "request failed");
                json!({ "success": false, "message": "Internal server error" })
            }
            _ => json!({ "success": false, "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::EmptyCart.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::SlotUnavailable { slot_id: 1 }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::OrderNotFound { order_id: 1 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::Database(sea_orm::DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
