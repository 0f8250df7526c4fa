//! Process configuration, read from the environment at startup.

use std::net::SocketAddr;

use thiserror::Error;

use yamdb_auth::{Email, Username};
use yamdb_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("ADMIN_USERNAME and ADMIN_EMAIL must be set together")]
    PartialAdmin,
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

/// Superuser to create or promote at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: Username,
    pub email: Email,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub jwt_secret: String,
    /// Set when `JWT_SECRET` was missing and the dev default is in use.
    pub insecure_secret: bool,
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub token_ttl: chrono::Duration,
    pub bootstrap_admin: Option<BootstrapAdmin>,
    pub log_format: LogFormat,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let (jwt_secret, insecure_secret) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| invalid("BIND_ADDR", e))?;

        let ttl_secs = match get("TOKEN_TTL_SECS") {
            Some(raw) => raw.parse::<i64>().map_err(|e| invalid("TOKEN_TTL_SECS", e))?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };
        if ttl_secs <= 0 {
            return Err(invalid("TOKEN_TTL_SECS", "must be greater than zero"));
        }
        let token_ttl = chrono::Duration::try_seconds(ttl_secs)
            .ok_or_else(|| invalid("TOKEN_TTL_SECS", "out of range"))?;

        let bootstrap_admin = match (get("ADMIN_USERNAME"), get("ADMIN_EMAIL")) {
            (Some(username), Some(email)) => Some(BootstrapAdmin {
                username: Username::parse(&username).map_err(|e| invalid("ADMIN_USERNAME", e))?,
                email: Email::parse(&email).map_err(|e| invalid("ADMIN_EMAIL", e))?,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialAdmin),
        };

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|e| invalid("LOG_FORMAT", e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            jwt_secret,
            insecure_secret,
            bind_addr,
            database_url: get("DATABASE_URL"),
            token_ttl,
            bootstrap_admin,
            log_format,
        })
    }
}
