use tracing::info;

use super::{
    is_valid_email, normalize_email,
    repo::{RepoError, UserRepository},
    NewUser, Role, User, MIN_PASSWORD_LEN,
};
use crate::{auth::password::hash_password, error::ApiError};

/// Email and password that passed the sign-up checks.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Checks presence, email shape and password length; the email comes back normalized.
pub fn validate_new_credentials(
    email: Option<&str>,
    password: Option<&str>,
) -> Result<Credentials, ApiError> {
    let email = email.map(normalize_email).unwrap_or_default();
    let password = password.unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required."));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Please enter a valid email."));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }

    Ok(Credentials {
        email,
        password: password.to_string(),
    })
}

/// Hashes the password and stores a new user.
pub async fn create_user(
    repo: &dyn UserRepository,
    creds: Credentials,
    name: Option<&str>,
    role: Role,
) -> Result<User, RepoError> {
    let password_hash = hash_password(&creds.password)?;
    let user = repo
        .create(NewUser {
            email: creds.email,
            password_hash,
            role,
            name: name.map(str::trim).unwrap_or_default().to_string(),
        })
        .await?;
    info!(user_id = %user.id, email = %user.email, role = %user.role, "user created");
    Ok(user)
}
