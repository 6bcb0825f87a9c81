use std::time::Duration;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

const DEFAULT_EXPIRES_IN: &str = "7d";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:4200,http://127.0.0.1:4200";
const SECS_PER_YEAR: u64 = 31_557_600;
/// Longest accepted token lifetime, 100 years.
pub const MAX_EXPIRES_IN: Duration = Duration::from_secs(100 * SECS_PER_YEAR);

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expires_in: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let expires_raw = lookup("JWT_EXPIRES_IN").unwrap_or_else(|| DEFAULT_EXPIRES_IN.into());
        let expires_in = parse_expires_in(&expires_raw)
            .with_context(|| format!("invalid JWT_EXPIRES_IN: {expires_raw:?}"))?;

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "admin-dashboard".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "admin-dashboard-users".into()),
            expires_in,
        };

        let port = match lookup("PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid PORT: {v:?}"))?,
            None => DEFAULT_PORT,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            cors_origins,
            jwt,
        })
    }
}

/// Parses a token lifetime such as `3600`, `45m`, `12h` or `7d`.
///
/// A bare number is seconds. Supported units: `s`, `m`, `h`, `d`, `w`, `y`
/// (a year is 365.25 days). Lifetimes above [`MAX_EXPIRES_IN`] are rejected.
pub fn parse_expires_in(raw: &str) -> anyhow::Result<Duration> {
    lazy_static! {
        static ref EXPIRES_RE: Regex = Regex::new(r"^\s*(\d+)\s*([smhdwy])?\s*$").unwrap();
    }
    let caps = EXPIRES_RE
        .captures(raw)
        .ok_or_else(|| anyhow::anyhow!("expected <number>[s|m|h|d|w|y]"))?;
    let amount: u64 = caps[1].parse().context("lifetime out of range")?;
    let unit_secs: u64 = match caps.get(2).map(|m| m.as_str()) {
        None | Some("s") => 1,
        Some("m") => 60,
        Some("h") => 60 * 60,
        Some("d") => 24 * 60 * 60,
        Some("w") => 7 * 24 * 60 * 60,
        Some("y") => SECS_PER_YEAR,
        Some(other) => anyhow::bail!("unknown unit {other}"),
    };
    let secs = amount
        .checked_mul(unit_secs)
        .ok_or_else(|| anyhow::anyhow!("lifetime out of range"))?;
    anyhow::ensure!(secs > 0, "lifetime must be positive");
    anyhow::ensure!(
        secs <= MAX_EXPIRES_IN.as_secs(),
        "lifetime exceeds 100 years"
    );
    Ok(Duration::from_secs(secs))
}
