use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::{error, warn};

lazy_static! {
    /// Stand-in hash verified when a login names no stored account.
    static ref DUMMY_HASH: Option<String> = hash_password("no-such-account")
        .map_err(|e| warn!(error = %e, "dummy password hash unavailable"))
        .ok();
}

#[cfg(test)]
thread_local! {
    static VERIFICATIONS: std::cell::Cell<usize> = std::cell::Cell::new(0);
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hashed = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!("password hashing failed: {e}")
        })?;
    Ok(hashed.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash cannot be parsed.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow::anyhow!("stored password hash is malformed: {e}")
    })?;
    Ok(check(plain, &parsed))
}

/// Runs one discarded verification, so rejecting an unknown account costs
/// as much as rejecting a wrong password.
pub fn verify_dummy(plain: &str) {
    let Some(stored) = DUMMY_HASH.as_deref() else {
        return;
    };
    if let Ok(parsed) = PasswordHash::new(stored) {
        check(plain, &parsed);
    }
}

fn check(plain: &str, parsed: &PasswordHash<'_>) -> bool {
    #[cfg(test)]
    VERIFICATIONS.with(|n| n.set(n.get() + 1));
    Argon2::default()
        .verify_password(plain.as_bytes(), parsed)
        .is_ok()
}

#[cfg(test)]
pub(crate) fn verifications() -> usize {
    VERIFICATIONS.with(|n| n.get())
}
