//! Environment-driven configuration.
//!
//! Every setting is read from a key/value source. Binaries call
//! [`load_dotenv`] and then the `from_env` constructors; tests pass a map
//! through the `from_lookup` constructors instead of mutating the process
//! environment.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::traits::Validatable;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn opt<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    opt(lookup, key).unwrap_or_else(|| default.to_string())
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    opt(lookup, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    opt(lookup, key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

// ── Database ──────────────────────────────────────────────────

/// Connection settings for the introspected database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
    /// Maximum pool size (`DB_MAX`)
    pub max_connections: u32,
    /// Idle timeout for pooled connections (`DB_IDLE_MILLIS`)
    pub idle_millis: u64,
    /// Require TLS (`DB_USE_SSL`)
    pub use_ssl: bool,
    /// Log every catalog statement (`DB_DEBUG`)
    pub debug: bool,
    /// Full connection string; overrides the discrete fields when set
    pub url: Option<String>,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            user: or(&lookup, "DB_USER", "postgres"),
            password: or(&lookup, "DB_PASSWORD", ""),
            database: or(&lookup, "DB_NAME", ""),
            host: or(&lookup, "DB_HOST", "localhost"),
            port: parsed(&lookup, "DB_PORT", 5432),
            max_connections: parsed(&lookup, "DB_MAX", 10),
            idle_millis: parsed(&lookup, "DB_IDLE_MILLIS", 10_000),
            use_ssl: flag(&lookup, "DB_USE_SSL"),
            debug: flag(&lookup, "DB_DEBUG"),
            url: opt(&lookup, "DATABASE_URL"),
        }
    }

    /// Connection target with the password masked, for logs.
    pub fn redacted_target(&self) -> String {
        match &self.url {
            Some(url) => match url.split_once('@') {
                Some((_, rest)) => format!("postgres://***@{rest}"),
                None => url.clone(),
            },
            None => format!(
                "postgres://{}:***@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
        }
    }
}

impl Validatable for DatabaseConfig {
    fn validate(&self) -> EngineResult<()> {
        if self.url.is_none() && self.database.is_empty() {
            return Err(EngineError::MissingConfig(
                "DB_NAME (or DATABASE_URL)".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(EngineError::InvalidConfig(
                "DB_MAX must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Server ────────────────────────────────────────────────────

/// Bind address of the build-trigger server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: or(&lookup, "HOST", "0.0.0.0"),
            port: parsed(&lookup, "PORT", 9000),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Generator ─────────────────────────────────────────────────

/// Settings that shape the generated API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSettings {
    pub output_dir: PathBuf,
    /// Mount prefix written to `servers[0].url`
    pub api_prefix: String,
    /// Table every listed row must be reachable from
    pub restriction_table: String,
    /// Column of the restriction table holding bearer tokens
    pub token_column: String,
    /// Table-name suffixes that mark lookup tables
    pub lookup_suffixes: Vec<String>,
    pub api_name: String,
    pub api_version: String,
}

impl GeneratorSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup_suffixes = or(&lookup, "CATALYST_LOOKUP_SUFFIXES", "_status")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            output_dir: PathBuf::from(or(&lookup, "CATALYST_OUTPUT_DIR", "./generated")),
            api_prefix: or(&lookup, "CATALYST_API_PREFIX", "/api/v1"),
            restriction_table: or(&lookup, "CATALYST_RESTRICTION_TABLE", "user"),
            token_column: or(&lookup, "CATALYST_TOKEN_COLUMN", "bearer_token"),
            lookup_suffixes,
            api_name: or(&lookup, "CATALYST_API_NAME", "catalyst"),
            api_version: or(&lookup, "CATALYST_API_VERSION", "1.0.0"),
        }
    }
}

impl Validatable for GeneratorSettings {
    fn validate(&self) -> EngineResult<()> {
        if !self.api_prefix.starts_with('/') {
            return Err(EngineError::InvalidConfig(format!(
                "API prefix '{}' must start with '/'",
                self.api_prefix
            )));
        }
        if self.restriction_table.is_empty() {
            return Err(EngineError::MissingConfig(
                "CATALYST_RESTRICTION_TABLE".to_string(),
            ));
        }
        if self.token_column.is_empty() {
            return Err(EngineError::MissingConfig("CATALYST_TOKEN_COLUMN".to_string()));
        }
        Ok(())
    }
}

/// Print a redacted summary for startup logs.
pub fn log_summary(db: &DatabaseConfig, generator: &GeneratorSettings) {
    tracing::info!("Config loaded:");
    tracing::info!("  database:    {}", db.redacted_target());
    tracing::info!(
        "  pool:        max={}, idle_ms={}, ssl={}",
        db.max_connections,
        db.idle_millis,
        db.use_ssl
    );
    tracing::info!("  output:      {}", generator.output_dir.display());
    tracing::info!(
        "  api:         prefix={}, restriction={}.{}",
        generator.api_prefix,
        generator.restriction_table,
        generator.token_column
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_database_defaults() {
        let db = DatabaseConfig::from_lookup(source(&[("DB_NAME", "books")]));
        assert_eq!(db.port, 5432);
        assert_eq!(db.max_connections, 10);
        assert_eq!(db.idle_millis, 10_000);
        assert!(!db.use_ssl);
        assert!(!db.debug);
        assert!(db.is_valid());
    }

    #[test]
    fn test_database_flags_and_overrides() {
        let db = DatabaseConfig::from_lookup(source(&[
            ("DB_NAME", "books"),
            ("DB_PORT", "6543"),
            ("DB_DEBUG", "true"),
            ("DB_USE_SSL", "1"),
            ("DB_MAX", "not-a-number"),
        ]));
        assert_eq!(db.port, 6543);
        assert!(db.debug);
        assert!(db.use_ssl);
        assert_eq!(db.max_connections, 10);
    }

    #[test]
    fn test_database_requires_a_target() {
        let db = DatabaseConfig::from_lookup(source(&[]));
        assert!(db.validate().unwrap_err().is_config());

        let db = DatabaseConfig::from_lookup(source(&[(
            "DATABASE_URL",
            "postgres://app:secret@db:5432/books",
        )]));
        assert!(db.is_valid());
        assert_eq!(db.redacted_target(), "postgres://***@db:5432/books");
    }

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::from_lookup(source(&[]));
        assert_eq!(server.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_generator_settings() {
        let settings = GeneratorSettings::from_lookup(source(&[(
            "CATALYST_LOOKUP_SUFFIXES",
            "_status, _kind,",
        )]));
        assert_eq!(settings.api_prefix, "/api/v1");
        assert_eq!(settings.restriction_table, "user");
        assert_eq!(settings.token_column, "bearer_token");
        assert_eq!(settings.lookup_suffixes, vec!["_status", "_kind"]);
        assert!(settings.is_valid());
    }

    #[test]
    fn test_generator_prefix_must_be_absolute() {
        let settings =
            GeneratorSettings::from_lookup(source(&[("CATALYST_API_PREFIX", "api/v2")]));
        assert!(!settings.is_valid());
    }
}
