use anyhow::Context as _;

use crate::domain::types::MIN_PASSWORD_LEN;
use crate::error::EntitlementError;

pub fn validate_password(plain: &str) -> Result<(), EntitlementError> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(EntitlementError::InvalidPassword);
    }
    Ok(())
}

/// bcrypt-hash a password at `cost` (`bcrypt::DEFAULT_COST` in production).
pub fn hash_password(plain: &str, cost: u32) -> Result<String, EntitlementError> {
    let hash = bcrypt::hash(plain, cost).context("hash password")?;
    Ok(hash)
}
