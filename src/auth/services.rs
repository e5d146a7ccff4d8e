use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{CredentialsRequest, PublicUser},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    db::bounded,
    error::AppError,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Both fields present and non-blank, or a validation error.
fn required_credentials(req: CredentialsRequest) -> Result<(String, String), AppError> {
    match (req.email, req.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            Ok((email, password))
        }
        _ => Err(AppError::Validation(
            "Email and password are required".into(),
        )),
    }
}

pub async fn signup(st: &AppState, req: CredentialsRequest) -> Result<PublicUser, AppError> {
    let (email, password) = required_credentials(req)?;

    if !is_valid_email(&email) {
        warn!("signup rejected: malformed email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let limit = st.config.db_timeout;
    if bounded(limit, st.users.find_by_email(&email)).await?.is_some() {
        warn!("signup rejected: email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(password).await?;

    // The insert is conditional, so a concurrent signup that slipped past the
    // check above still ends up here instead of creating a second row.
    let user = bounded(limit, st.users.create(&email, &hash))
        .await?
        .ok_or_else(|| AppError::Conflict("Email already registered".into()))?;

    info!(user_id = %user.id, "user registered");
    Ok(PublicUser {
        id: user.id,
        email: user.email,
    })
}

pub async fn login(st: &AppState, req: CredentialsRequest) -> Result<String, AppError> {
    let (email, password) = required_credentials(req)?;

    let user = match bounded(st.config.db_timeout, st.users.find_by_email(&email)).await? {
        Some(u) => u,
        None => {
            warn!("login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    };

    if !verify_password(password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login rejected");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = JwtKeys::from_config(&st.config.jwt).sign(user.id, &user.email)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

/// Resolves the caller to their stored record.
pub async fn current_user(st: &AppState, caller: &AuthUser) -> Result<PublicUser, AppError> {
    let user = bounded(st.config.db_timeout, st.users.find_by_id(caller.id))
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    Ok(PublicUser {
        id: user.id,
        email: user.email,
    })
}
