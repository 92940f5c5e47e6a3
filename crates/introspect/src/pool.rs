//! Connection pool for the introspected database.

use std::str::FromStr;
use std::time::Duration;

use catalyst_core::{DatabaseConfig, EngineError, EngineResult, Validatable};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

/// Connect options for `config`.
///
/// `DATABASE_URL` wins over the discrete fields. `DB_USE_SSL` forces
/// `sslmode=require` in both cases.
pub fn connect_options(config: &DatabaseConfig) -> EngineResult<PgConnectOptions> {
    let options = match &config.url {
        Some(url) => PgConnectOptions::from_str(url)
            .map_err(|e| EngineError::InvalidConfig(format!("DATABASE_URL: {e}")))?,
        None => PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(PgSslMode::Prefer),
    };

    Ok(if config.use_ssl {
        options.ssl_mode(PgSslMode::Require)
    } else {
        options
    })
}

/// Open a pool sized by `DB_MAX` with the `DB_IDLE_MILLIS` idle timeout.
pub async fn connect(config: &DatabaseConfig) -> EngineResult<PgPool> {
    config.validate()?;
    let options = connect_options(config)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .idle_timeout(Duration::from_millis(config.idle_millis))
        .connect_with(options)
        .await
        .map_err(|e| EngineError::Connection(e.to_string()))?;

    tracing::info!(
        target_db = %config.redacted_target(),
        max = config.max_connections,
        "PostgreSQL connected"
    );
    Ok(pool)
}
