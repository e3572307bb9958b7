//! HTTP surface built on axum.
//!
//! Handlers stay thin: extract the caller, parse the request, call into
//! [`crate::core`], and wrap the result in a JSON body.

pub mod auth;
pub mod cart;
mod error;
pub mod extract;
pub mod favourites;
pub mod feedback;
pub mod menu;
pub mod notifications;
pub mod orders;
pub mod students;
pub mod timeslots;

use auth::TokenVerifier;
use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Connection pool
    pub db: DatabaseConnection,
    /// Bearer-token verifier
    pub tokens: Arc<TokenVerifier>,
}

impl AppState {
    /// State for `db` verifying tokens signed with `jwt_secret`
    #[must_use]
    pub fn new(db: DatabaseConnection, jwt_secret: &str) -> Self {
        Self {
            db,
            tokens: Arc::new(TokenVerifier::new(jwt_secret)),
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/orders", orders::routes())
        .nest("/timeslots", timeslots::routes())
        .nest("/menu", menu::routes())
        .nest("/cart", cart::routes())
        .nest("/notifications", notifications::routes())
        .nest("/feedback", feedback::routes())
        .nest("/favourites", favourites::routes())
        .nest("/students", students::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing {
    #![allow(clippy::unwrap_used)]
    use super::{AppState, router};
    use crate::core::account::Identity;
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use sea_orm::DatabaseConnection;
    use serde_json::Value;
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-test-secret-test-secret";

    /// Router plus a way to mint tokens for it
    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
    }

    impl TestApp {
        pub fn new(db: DatabaseConnection) -> Self {
            let state = AppState::new(db, SECRET);
            Self {
                router: router(state.clone()),
                state,
            }
        }

        pub fn token(&self, identity: Identity) -> String {
            self.state
                .tokens
                .issue(identity, chrono::Duration::minutes(10))
                .unwrap()
        }

        /// Sends one request and returns the status with the parsed JSON body.
        pub async fn send(
            &self,
            method: Method,
            uri: &str,
            identity: Option<Identity>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(identity) = identity {
                request = request.header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", self.token(identity)),
                );
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => request.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, json)
        }
    }
}
