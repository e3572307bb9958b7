//! Bearer-token identity.
//!
//! Tokens are HS256 JWTs issued by the campus login service. The claims carry
//! the caller's row id and role; nothing else is trusted from the request.

use super::AppState;
use crate::{
    core::account::{Identity, Role},
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Row id in `students` or `staff`
    pub id: i64,
    /// Which table `id` refers to
    pub role: Role,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// Verifies (and, for tooling, issues) bearer tokens
#[derive(Clone)]
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenVerifier {
    /// Verifier for tokens signed with `secret`
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a token for `identity` valid for `ttl`.
    pub fn issue(&self, identity: Identity, ttl: chrono::Duration) -> Result<String> {
        let claims = Claims {
            id: identity.id,
            role: identity.role,
            exp: (chrono::Utc::now() + ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| Error::Config {
            message: format!("Failed to sign token: {e}"),
        })
    }

    /// Checks signature and expiry and returns the caller.
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!(error = %e, "rejected bearer token");
            Error::Unauthorized
        })?;

        Ok(Identity {
            id: data.claims.id,
            role: data.claims.role,
        })
    }
}

/// The authenticated caller of a request
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Identity);

impl CurrentUser {
    /// The student id, or [`Error::Forbidden`] for staff.
    pub fn require_student(&self) -> Result<i64> {
        match self.0.role {
            Role::Student => Ok(self.0.id),
            Role::Staff => Err(Error::Forbidden),
        }
    }

    /// The staff id, or [`Error::Forbidden`] for students.
    pub fn require_staff(&self) -> Result<i64> {
        match self.0.role {
            Role::Staff => Ok(self.0.id),
            Role::Student => Err(Error::Forbidden),
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(Error::Unauthorized)?;

        state.tokens.verify(token).map(Self)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_then_verify() {
        let verifier = TokenVerifier::new(SECRET);
        let token = verifier
            .issue(Identity::staff(7), chrono::Duration::minutes(5))
            .unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), Identity::staff(7));
    }

    #[test]
    fn test_rejects_foreign_and_expired_tokens() {
        let verifier = TokenVerifier::new(SECRET);
        let other = TokenVerifier::new("another-secret-another-secret-xx");

        let foreign = other
            .issue(Identity::student(1), chrono::Duration::minutes(5))
            .unwrap();
        assert!(matches!(verifier.verify(&foreign), Err(Error::Unauthorized)));

        let expired = verifier
            .issue(Identity::student(1), chrono::Duration::hours(-1))
            .unwrap();
        assert!(matches!(verifier.verify(&expired), Err(Error::Unauthorized)));
        assert!(matches!(verifier.verify("garbage"), Err(Error::Unauthorized)));
    }

    #[test]
    fn test_role_guards() {
        let student = CurrentUser(Identity::student(3));
        let staff = CurrentUser(Identity::staff(4));
        assert_eq!(student.require_student().unwrap(), 3);
        assert!(matches!(student.require_staff(), Err(Error::Forbidden)));
        assert_eq!(staff.require_staff().unwrap(), 4);
        assert!(matches!(staff.require_student(), Err(Error::Forbidden)));
    }
}
