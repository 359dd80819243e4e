/// Configuration management for the API server
///
/// Configuration is read from environment variables, with a `.env` file
/// loaded first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: bind host (default `0.0.0.0`)
/// - `API_PORT`: bind port (default `3000`)
/// - `CORS_ORIGINS`: comma separated allowed origins (default `*`)
/// - `STORAGE`: `postgres` (default) or `memory`
/// - `DATABASE_URL`: PostgreSQL connection string, required for `postgres`
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `JWT_SECRET`: HS256 signing secret, at least 32 characters
/// - `JWT_EXPIRATION_HOURS`: token lifetime (default 24)

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use taskhub_shared::auth::jwt::DEFAULT_EXPIRATION_HOURS;

/// Shortest accepted `JWT_SECRET`
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Where records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process-local maps, lost on restart
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("STORAGE must be 'postgres' or 'memory', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Empty when running on the memory backend
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} is invalid: {}", key, e)),
        None => Ok(default),
    }
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self> {
        // Missing .env is fine
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let storage = match lookup("STORAGE") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Postgres,
        };

        let url = lookup("DATABASE_URL").unwrap_or_default();
        if storage == StorageBackend::Postgres && url.trim().is_empty() {
            bail!("DATABASE_URL must be set when STORAGE=postgres");
        }

        let secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.len() < MIN_JWT_SECRET_LEN {
            bail!("JWT_SECRET must be at least {} characters", MIN_JWT_SECRET_LEN);
        }

        let expiration_hours = parse_or(&lookup, "JWT_EXPIRATION_HOURS", DEFAULT_EXPIRATION_HOURS)?;
        if expiration_hours <= 0 {
            bail!("JWT_EXPIRATION_HOURS must be positive");
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        Ok(Config {
            api: ApiConfig {
                host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "API_PORT", 3000)?,
                cors_origins,
            },
            storage,
            database: DatabaseConfig {
                url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig {
                secret,
                expiration_hours,
            },
        })
    }

    /// Socket address to bind, e.g. `0.0.0.0:3000`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// True when any origin may call the API
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "a-very-long-secret-for-configuration-tests";

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "postgresql://localhost/taskhub"),
            ("JWT_SECRET", SECRET),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.expiration_hours, 24);
        assert!(config.allows_any_origin());
    }

    #[test]
    fn test_memory_storage_needs_no_database_url() {
        let config = config_from(&[("STORAGE", "memory"), ("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.database.url.is_empty());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert!(config_from(&[("JWT_SECRET", SECRET)]).is_err());
    }

    #[test]
    fn test_rejects_short_secret() {
        let result = config_from(&[("STORAGE", "memory"), ("JWT_SECRET", "short")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_numbers() {
        let result = config_from(&[
            ("STORAGE", "memory"),
            ("JWT_SECRET", SECRET),
            ("API_PORT", "eighty"),
        ]);
        assert!(result.is_err());

        let result = config_from(&[
            ("STORAGE", "memory"),
            ("JWT_SECRET", SECRET),
            ("JWT_EXPIRATION_HOURS", "0"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cors_origins_list() {
        let config = config_from(&[
            ("STORAGE", "memory"),
            ("JWT_SECRET", SECRET),
            ("CORS_ORIGINS", "http://localhost:5173, https://app.example.com ,"),
        ])
        .unwrap();

        assert_eq!(
            config.api.cors_origins,
            vec!["http://localhost:5173", "https://app.example.com"]
        );
        assert!(!config.allows_any_origin());
    }
}
