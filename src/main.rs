//! Catalyst build-trigger server
//!
//! Connects to the configured database and regenerates the API on
//! `GET /api/generator/build`.

mod server;

use anyhow::Context;
use catalyst_core::config::{load_dotenv, log_summary};
use catalyst_core::{DatabaseConfig, GeneratorSettings, ServerConfig, Validatable};
use catalyst_introspect::connect;
use tracing_subscriber::EnvFilter;

use crate::server::{AppState, BUILD_ROUTE, PgBuildRunner, docs_route, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!();
    println!("╔═══════════════════════════════════════════════════════════╗");
    println!("║   Catalyst {:<47}║", catalyst_core::VERSION);
    println!("║   {:<56}║", "REST API generator for PostgreSQL");
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();

    let db = DatabaseConfig::from_env();
    let server = ServerConfig::from_env();
    let settings = GeneratorSettings::from_env();
    log_summary(&db, &settings);
    settings.validate()?;

    let pool = connect(&db).await?;
    let state = AppState::new(PgBuildRunner::new(pool, settings.clone(), db.debug), &settings);
    let app = router(state, &settings.api_prefix);

    let address = server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(address = %address, trigger = BUILD_ROUTE, docs = %docs_route(&settings.api_prefix), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
