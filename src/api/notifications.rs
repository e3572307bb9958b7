//! `/notifications` routes, scoped to the caller.

use super::{AppState, auth::CurrentUser};
use crate::{core::notification, entities::notification as notification_entity, errors::Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};
use serde_json::{Value, json};

/// Routes mounted under `/notifications`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
        .route("/{id}/read", patch(mark_read))
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<notification_entity::Model>>> {
    Ok(Json(notification::list_for(&state.db, &user.0).await?))
}

async fn unread_count(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Value>> {
    let count = notification::unread_count(&state.db, &user.0).await?;
    Ok(Json(json!({ "count": count })))
}

async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<Value>> {
    notification::mark_read(&state.db, &user.0, notification_id).await?;
    Ok(Json(json!({ "success": true, "message": "Notification marked as read" })))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::api::testing::TestApp;
    use crate::core::account::Identity;
    use crate::errors::Result;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_notification_routes() -> Result<()> {
        let (db, fixture) = setup_with_placed_order().await?;
        let app = TestApp::new(db);
        let staff = Some(Identity::staff(fixture.staff_id));
        let student = Some(Identity::student(fixture.student_id));

        let (status, body) = app.send(Method::GET, "/notifications", staff, None).await;
        assert_eq!(status, StatusCode::OK);
        let notes = body.as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["type"], "ORDER");
        assert!(notes[0]["message"].as_str().unwrap().contains("Asha"));
        let id = notes[0]["id"].as_i64().unwrap();

        let (_, body) = app.send(Method::GET, "/notifications/unread-count", staff, None).await;
        assert_eq!(body["count"], 1);

        let uri = format!("/notifications/{id}/read");
        let (status, _) = app.send(Method::PATCH, &uri, student, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.send(Method::PATCH, &uri, staff, None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = app.send(Method::GET, "/notifications/unread-count", staff, None).await;
        assert_eq!(body["count"], 0);
        Ok(())
    }
}
