use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use herald_auth::token::DEFAULT_TOKEN_TTL_HOURS;

/// Placeholder JWT secret that ships in examples and must be replaced in production.
const PLACEHOLDER_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Config {
    /// Read configuration from `HERALD_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = lookup("HERALD_JWT_SECRET")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_SECRET.into());
        if jwt_secret == PLACEHOLDER_SECRET {
            warn!("HERALD_JWT_SECRET is unset or still the placeholder; tokens are forgeable");
        }

        let port = match lookup("HERALD_PORT") {
            Some(v) => v.parse().with_context(|| format!("invalid HERALD_PORT '{}'", v))?,
            None => 3000,
        };

        let token_ttl_hours = match lookup("HERALD_TOKEN_TTL_HOURS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("invalid HERALD_TOKEN_TTL_HOURS '{}'", v))?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };
        if token_ttl_hours <= 0 {
            anyhow::bail!("HERALD_TOKEN_TTL_HOURS must be positive, got {}", token_ttl_hours);
        }

        Ok(Self {
            host: lookup("HERALD_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: lookup("HERALD_DB_PATH")
                .unwrap_or_else(|| "herald.db".into())
                .into(),
            jwt_secret,
            token_ttl_hours,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .with_context(|| format!("invalid listen address '{}'", addr))
    }
}
