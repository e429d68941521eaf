use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenKind};
use crate::{
    db::{Role, User},
    error::AppError,
    state::AppState,
};

/// Verified access token whose session has not been signed out.
pub struct AuthUser {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_kind(token, TokenKind::Access).map_err(|e| {
            warn!(error = %e, "rejected access token");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

        if state.repo.is_session_revoked(claims.sid).await? {
            return Err(AppError::Unauthorized("Session has been signed out".into()));
        }

        Ok(AuthUser {
            user_id: claims.sub,
            session_id: claims.sid,
        })
    }
}

/// Resolved identity: a valid session whose user row still exists.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let user = state.repo.find_user(auth.user_id).await?.ok_or_else(|| {
            warn!(user_id = %auth.user_id, "token for unknown user");
            AppError::Unauthorized("User not found".into())
        })?;
        Ok(CurrentUser(user))
    }
}

fn require_role(user: &User, role: Role) -> Result<(), AppError> {
    if user.role == role {
        Ok(())
    } else {
        warn!(user_id = %user.id, role = user.role.as_str(), wanted = role.as_str(), "role mismatch");
        Err(AppError::Forbidden(format!("{} access required", role.as_str())))
    }
}

pub struct PensionerUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for PensionerUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(&user, Role::Pensioner)?;
        Ok(PensionerUser(user))
    }
}

pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(&user, Role::Admin)?;
        Ok(AdminUser(user))
    }
}
