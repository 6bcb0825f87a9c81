//! Creates the default admin and regular accounts unless they already exist.

use std::sync::Arc;

use anyhow::Context;
use admin_dashboard::{
    state::{connect, migrate},
    telemetry,
    users::{
        postgres::PgUserRepository,
        repo::{RepoError, UserRepository},
        service::{create_user, validate_new_credentials},
        Role,
    },
};
use tracing::{info, warn};

struct SeedAccount {
    email: String,
    password: String,
    role: Role,
    name: &'static str,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn accounts() -> Vec<SeedAccount> {
    vec![
        SeedAccount {
            email: env_or("SEED_ADMIN_EMAIL", "admin@example.com"),
            password: env_or("SEED_ADMIN_PASSWORD", "Admin@123"),
            role: Role::Admin,
            name: "Admin User",
        },
        SeedAccount {
            email: env_or("SEED_USER_EMAIL", "user@example.com"),
            password: env_or("SEED_USER_PASSWORD", "User@123"),
            role: Role::User,
            name: "Regular User",
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let db = connect(&database_url).await?;
    migrate(&db).await?;
    let repo: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(db));

    for account in accounts() {
        let creds = validate_new_credentials(
            Some(account.email.as_str()),
            Some(account.password.as_str()),
        )
        .map_err(|e| anyhow::anyhow!("seed account {}: {e}", account.email))?;

        if repo.find_by_email(&creds.email).await?.is_some() {
            warn!(email = %creds.email, "user already exists, skipping");
            continue;
        }

        match create_user(repo.as_ref(), creds, Some(account.name), account.role).await {
            Ok(user) => info!(email = %user.email, role = %user.role, "seeded user"),
            Err(RepoError::DuplicateEmail) => {
                warn!(email = %account.email, "user created concurrently, skipping")
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("seeding complete");
    Ok(())
}
