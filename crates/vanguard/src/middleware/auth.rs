//! JWT-bearer `AuthUser` extraction (SPEC_FULL §4.7).
//!
//! Token issuance, refresh, registration, and password hashing are the
//! external auth collaborator (spec §1) and are not implemented here — this
//! verifies a pre-issued token and extracts `(user_id, role)` so handlers can
//! make the owner-or-admin decision §6 requires.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use olympus_common::UserRole;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
struct AccessTokenClaims {
    /// Subject: the user id (spec §3 `User` identity is an integer id).
    sub: i64,
    role: UserRole,
    exp: i64,
}

/// Authenticated caller extracted from a verified bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Verifies `Authorization: Bearer <token>` and inserts an [`AuthUser`] into
/// the request extensions. Missing or invalid tokens are rejected with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let decoding_key = DecodingKey::from_secret(state.config.jwt_secret.as_bytes());
    let token_data = decode::<AccessTokenClaims>(token, &decoding_key, &Validation::default())
        .map_err(|e| ApiError::Token(e.to_string()))?;

    request.extensions_mut().insert(AuthUser {
        user_id: token_data.claims.sub,
        role: token_data.claims.role,
    });

    Ok(next.run(request).await)
}
