use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    error::AppError,
};

/// Access-token claims. Tokens are issued by the identity service; this API
/// only verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub role: Role,
    pub exp: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn verify_token(token: &str, secret: &str) -> Result<CurrentUser, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::debug!("Rejected access token: {}", e);
        AppError::Unauthorized
    })?;

    Ok(CurrentUser {
        user_id: data.claims.sub,
        role: data.claims.role,
    })
}

fn authenticate(state: &AppState, request: &Request) -> Result<CurrentUser, AppError> {
    let token = bearer_token(request).ok_or(AppError::Unauthorized)?;
    verify_token(token, &state.settings.auth.jwt_secret)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, &request)?;

    // Insert current user into request extensions
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, &request)?;

    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, role: Role, exp: usize) -> (Uuid, String) {
        let sub = Uuid::new_v4();
        let claims = Claims { sub, role, exp };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();
        (sub, token)
    }

    fn in_an_hour() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_valid_token_yields_user() {
        let (sub, token) = token("secret", Role::Admin, in_an_hour());
        let user = verify_token(&token, "secret").unwrap();
        assert_eq!(user.user_id, sub);
        assert!(user.is_admin());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let (_, token) = token("secret", Role::User, in_an_hour());
        assert!(matches!(verify_token(&token, "other"), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let (_, token) = token("secret", Role::User, 1_000);
        assert!(matches!(verify_token(&token, "secret"), Err(AppError::Unauthorized)));
    }
}
