//! Identity extraction from signed session tokens
//!
//! The identity provider signs an HS256 token whose claims carry the user id
//! and the public metadata set by admins (`isAdmin`, `isSubAdmin`, `role`).

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ApiError;
use crate::models::Candidate;

/// Public metadata attached to a user by the identity provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMetadata {
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    #[serde(rename = "isSubAdmin")]
    pub is_sub_admin: bool,
    pub role: Option<String>,
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, alias = "public_metadata")]
    pub metadata: UserMetadata,
}

/// Verification settings for session tokens
#[derive(Clone)]
pub struct AuthSettings {
    key: Option<DecodingKey>,
}

impl AuthSettings {
    /// Without a secret every token is rejected
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            key: secret
                .filter(|s| !s.is_empty())
                .map(|s| DecodingKey::from_secret(s.as_bytes())),
        }
    }

    /// Verifies a token and returns its claims
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| ApiError::Unauthorized("Authentication is not configured".to_string()))?;

        let mut validation = Validation::default();
        validation.validate_aud = false;

        decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected session token: {}", e);
                ApiError::Unauthorized("Invalid or expired session token".to_string())
            })
    }
}

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub is_sub_admin: bool,
    pub role: Option<String>,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            is_admin: claims.metadata.is_admin,
            is_sub_admin: claims.metadata.is_sub_admin,
            role: claims.metadata.role,
        }
    }
}

impl Identity {
    /// Admins and sub-admins
    pub fn is_staff(&self) -> bool {
        self.is_admin || self.is_sub_admin
    }

    pub fn owns(&self, candidate: &Candidate) -> bool {
        candidate.is_owned_by(&self.user_id)
    }

    /// Owner of the candidate, or staff
    pub fn can_manage(&self, candidate: &Candidate) -> bool {
        self.is_staff() || self.owns(candidate)
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.is_staff() { Ok(()) } else { Err(ApiError::Forbidden) }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin { Ok(()) } else { Err(ApiError::Forbidden) }
    }

    pub fn require_manager(&self, candidate: &Candidate) -> Result<(), ApiError> {
        if self.can_manage(candidate) { Ok(()) } else { Err(ApiError::Forbidden) }
    }
}

/// Reads the bearer token, if any
///
/// A header that is present but not a bearer token counts as invalid.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(ApiError::Unauthorized(
            "Authorization header must use the Bearer scheme".to_string(),
        )),
    }
}

impl<S> FromRequestParts<S> for Identity
where
    AuthSettings: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        let settings = AuthSettings::from_ref(state);
        settings.verify(token).map(Identity::from)
    }
}

/// The caller's identity on routes that also serve anonymous visitors
///
/// A missing header yields `None`; a header with a bad token is still a 401.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl MaybeIdentity {
    pub fn is_staff(&self) -> bool {
        self.0.as_ref().is_some_and(Identity::is_staff)
    }

    pub fn can_manage(&self, candidate: &Candidate) -> bool {
        self.0.as_ref().is_some_and(|identity| identity.can_manage(candidate))
    }

    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|identity| identity.user_id.as_str())
    }
}

impl<S> FromRequestParts<S> for MaybeIdentity
where
    AuthSettings: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            None => Ok(MaybeIdentity(None)),
            Some(token) => {
                let settings = AuthSettings::from_ref(state);
                settings.verify(token).map(|claims| MaybeIdentity(Some(claims.into())))
            }
        }
    }
}

/// Mints signed tokens for tests
#[cfg(test)]
pub mod testing {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub const TEST_SECRET: &str = "elevra-test-secret";

    /// Signs a token for `user_id` that expires in an hour
    pub fn token(user_id: &str, is_admin: bool, is_sub_admin: bool, role: Option<&str>) -> String {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
            email: Some(format!("{}@example.com", user_id)),
            metadata: UserMetadata {
                is_admin,
                is_sub_admin,
                role: role.map(str::to_string),
            },
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET.as_bytes()))
            .expect("Failed to sign test token")
    }

    pub fn user_token(user_id: &str) -> String {
        token(user_id, false, false, Some("voter"))
    }

    pub fn admin_token(user_id: &str) -> String {
        token(user_id, true, false, None)
    }

    pub fn sub_admin_token(user_id: &str) -> String {
        token(user_id, false, true, None)
    }
}

#[cfg(test)]
mod tests;
