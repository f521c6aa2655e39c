//! Process-wide configuration, loaded once at startup from the
//! environment (with `.env` support).

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub database_echo: bool,
    pub port: u16,
    pub jwt_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub prune_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./authbox.db".to_string());

        let database_echo = std::env::var("DATABASE_ECHO")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(false);

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        // The signing secret is the one setting with no sane default
        let jwt_secret = std::env::var("JWT_SECRET_KEY")
            .context("JWT_SECRET_KEY environment variable is not set")?;

        let access_ttl_minutes = std::env::var("ACCESS_TOKEN_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(15);

        let refresh_ttl_days = std::env::var("REFRESH_TOKEN_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(30);

        let bcrypt_cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&v| (4..=31).contains(&v))
            .unwrap_or(bcrypt::DEFAULT_COST);

        let prune_interval_secs = std::env::var("REVOKED_TOKEN_PRUNE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(3600);

        Ok(Self {
            database_path,
            database_echo,
            port,
            jwt_secret,
            access_ttl_minutes,
            refresh_ttl_days,
            bcrypt_cost,
            prune_interval_secs,
        })
    }
}
