use argon2::{
    password_hash::{self, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use time::{macros::format_description, Date};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{LoginRequest, RegisterRequest};
use super::jwt::{JwtKeys, TokenKind, TokenPair};
use crate::config::AdminBootstrap;
use crate::db::{NewUser, Role, User};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// PHC string stored in `users.password_hash`.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| anyhow::anyhow!("hash password: {e}"))
}

/// `Ok(false)` only for a wrong password. A stored hash that does not parse,
/// or names an algorithm other than argon2, is an error.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let phc = PasswordHash::new(stored)
        .map_err(|e| anyhow::anyhow!("stored password hash unreadable: {e}"))?;
    match Argon2::default().verify_password(plain.as_bytes(), &phc) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, algorithm = %phc.algorithm, "password check failed");
            Err(anyhow::anyhow!("verify password: {e}"))
        }
    }
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    Ok(email)
}

fn required(field: &str, value: String) -> AppResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(value)
}

fn parse_birth_date(raw: &str) -> AppResult<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::Validation("date_of_birth must be YYYY-MM-DD".into()))
}

/// Authenticated user together with a fresh session.
#[derive(Debug)]
pub struct SignedIn {
    pub user: User,
    pub tokens: TokenPair,
}

fn start_session(state: &AppState, user: User) -> AppResult<SignedIn> {
    let keys = JwtKeys::from(&state.config.jwt);
    let tokens = keys.sign_pair(user.id, Uuid::new_v4())?;
    Ok(SignedIn { user, tokens })
}

/// Registers a pensioner. The role is fixed; administrators come from configuration.
pub async fn register(state: &AppState, req: RegisterRequest) -> AppResult<SignedIn> {
    let email = normalize_email(&req.email)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let new = NewUser {
        full_name: required("full_name", req.full_name)?,
        pension_number: required("pension_number", req.pension_number)?,
        phone_number: required("phone_number", req.phone_number)?,
        address: required("address", req.address)?,
        date_of_birth: Some(parse_birth_date(&req.date_of_birth)?),
        password_hash: hash_password(&req.password)?,
        role: Role::Pensioner,
        email,
    };

    let user = state.repo.create_user(new).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    start_session(state, user)
}

pub async fn login(state: &AppState, req: LoginRequest) -> AppResult<SignedIn> {
    let email = normalize_email(&req.email)?;
    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let Some(record) = state.repo.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid());
    };

    if !verify_password(&req.password, &record.password_hash)? {
        warn!(email = %email, user_id = %record.user.id, "login invalid password");
        return Err(invalid());
    }

    info!(user_id = %record.user.id, "user logged in");
    start_session(state, record.user)
}

/// Issues a new pair on the same session.
pub async fn refresh(state: &AppState, refresh_token: &str) -> AppResult<SignedIn> {
    let keys = JwtKeys::from(&state.config.jwt);
    let claims = keys
        .verify_kind(refresh_token, TokenKind::Refresh)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    if state.repo.is_session_revoked(claims.sid).await? {
        return Err(AppError::Unauthorized("Session has been signed out".into()));
    }

    let user = state
        .repo
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    let tokens = keys.sign_pair(user.id, claims.sid)?;
    Ok(SignedIn { user, tokens })
}

pub async fn logout(state: &AppState, user_id: Uuid, session_id: Uuid) -> AppResult<()> {
    state.repo.revoke_session(session_id, user_id).await?;
    info!(%user_id, %session_id, "session revoked");
    Ok(())
}

/// Creates the configured administrator unless the email is already registered.
pub async fn ensure_admin(state: &AppState, admin: &AdminBootstrap) -> AppResult<()> {
    let email = normalize_email(&admin.email)?;
    if let Some(existing) = state.repo.find_user_by_email(&email).await? {
        if existing.user.role != Role::Admin {
            warn!(email = %email, "bootstrap admin email belongs to a pensioner; leaving as is");
        }
        return Ok(());
    }

    let user = state
        .repo
        .create_user(NewUser {
            email,
            password_hash: hash_password(&admin.password)?,
            full_name: admin.full_name.clone(),
            pension_number: String::new(),
            phone_number: String::new(),
            address: String::new(),
            date_of_birth: None,
            role: Role::Admin,
        })
        .await?;
    info!(user_id = %user.id, "bootstrap admin created");
    Ok(())
}
