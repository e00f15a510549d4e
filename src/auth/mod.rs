//! Bearer-token authentication.
//!
//! Identity lives outside this service; a token's subject is the actor id
//! stamped onto audit fields. There is no user table here, only HS256
//! validation against the configured secret.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ApiError, ServiceError};
use crate::AppState;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (actor id)
    pub sub: String,
    /// Display name, if the issuer provided one
    pub name: Option<String>,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Issues a token for the given actor. Used by operational tooling and
/// tests; production tokens come from the identity provider.
pub fn issue_token(
    user_id: Uuid,
    name: Option<String>,
    secret: &str,
    ttl_secs: u64,
) -> Result<String, ServiceError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        name,
        iat: now,
        exp: now + ttl_secs as i64,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ServiceError::AuthError(format!("Failed to issue token: {}", e)))
}

/// Validates a JWT and extracts the claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, ServiceError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            ServiceError::AuthError("Token expired".to_string())
        }
        _ => ServiceError::AuthError("Invalid token".to_string()),
    })
}

/// Authenticated actor extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub name: Option<String>,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let claims = validate_token(token, &state.config.jwt_secret)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;

        Ok(Self {
            user_id,
            name: claims.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-key-with-enough-length";

    #[test]
    fn token_round_trip() {
        let actor = Uuid::new_v4();
        let token = issue_token(actor, Some("Asha".to_string()), SECRET, 60).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, actor.to_string());
        assert_eq!(claims.name.as_deref(), Some("Asha"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), None, SECRET, 60).unwrap();
        let err = validate_token(&token, "a-completely-different-secret-key").unwrap_err();
        assert!(matches!(err, ServiceError::AuthError(_)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(validate_token("not-a-jwt", SECRET).is_err());
    }
}
