// This project was developed with assistance from GitHub Copilot
// Runtime configuration loaded from the environment

use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// Server and key-seeding settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Lifetime of the seeded active key, in seconds
    pub active_key_ttl_secs: i64,
    /// How long ago the seeded expired key expired, in seconds
    pub expired_key_age_secs: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            active_key_ttl_secs: 60 * 60,
            expired_key_age_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from `JWKS_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = match lookup("JWKS_HOST") {
            None => defaults.host,
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::InvalidValue {
                    name: "JWKS_HOST",
                    value: raw,
                    reason: "must not be empty".to_string(),
                });
            }
            Some(raw) => raw.trim().to_string(),
        };
        let port = parse_var(&lookup, "JWKS_PORT", defaults.port)?;
        let active_key_ttl_secs =
            parse_positive(&lookup, "JWKS_ACTIVE_KEY_TTL_SECS", defaults.active_key_ttl_secs)?;
        let expired_key_age_secs =
            parse_positive(&lookup, "JWKS_EXPIRED_KEY_AGE_SECS", defaults.expired_key_age_secs)?;

        Ok(Self {
            host,
            port,
            active_key_ttl_secs,
            expired_key_age_secs,
        })
    }

    /// Host and port to listen on; the host may be an IP literal or a hostname
    pub fn bind_target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_positive<F>(lookup: &F, name: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_var(lookup, name, default)?;
    if value <= 0 {
        return Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
