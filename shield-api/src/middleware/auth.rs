use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use shield_core::models::Personnel;

use crate::error::AppError;
use crate::state::AppState;

/// Audience Supabase stamps on signed-in user tokens.
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserClaims {
    pub sub: String,
    pub role: String,
    pub aud: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserClaims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthenticationError("Invalid subject in token".to_string()))
    }
}

pub async fn user_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let mut validation = Validation::default();
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

    let token_data = decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &validation,
    ).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}

/// The guard profile behind the signed-in user.
pub async fn current_personnel(state: &AppState, claims: &UserClaims) -> Result<Personnel, AppError> {
    let user_id = claims.user_id()?;
    state
        .store
        .get_personnel_by_user(user_id)
        .await?
        .ok_or_else(|| AppError::AuthorizationError("No personnel profile for this user".to_string()))
}
