//! Argon2id password hashing. Both directions run on the blocking pool:
//! a hash takes tens of milliseconds and must not stall a runtime worker.

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tokio::task;

use crate::error::AppError;

fn hash_blocking(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| anyhow::anyhow!("argon2 hash: {e}"))
}

fn verify_blocking(plain: &str, phc: &str) -> anyhow::Result<bool> {
    let stored = PasswordHash::new(phc).map_err(|e| anyhow::anyhow!("stored hash unreadable: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &stored)
        .is_ok())
}

/// Salted one-way hash in PHC string form.
pub async fn hash_password(plain: String) -> Result<String, AppError> {
    let phc = task::spawn_blocking(move || hash_blocking(&plain))
        .await
        .context("password hashing task")??;
    Ok(phc)
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
pub async fn verify_password(plain: String, phc: String) -> Result<bool, AppError> {
    let matches = task::spawn_blocking(move || verify_blocking(&plain, &phc))
        .await
        .context("password verification task")??;
    Ok(matches)
}
