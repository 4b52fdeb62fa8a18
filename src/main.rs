use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ticket_desk_api::auth::{PasswordHasher, TokenService};
use ticket_desk_api::config::AppConfig;
use ticket_desk_api::database::{open_store, seed::seed_demo_data};
use ticket_desk_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "Starting Ticket Desk API in {:?} mode with {:?} backend",
        config.environment, config.database.backend
    );

    let store = open_store(&config.database).await.context("failed to open store")?;
    let passwords = PasswordHasher::default();

    if config.database.seed_demo_data {
        let report = seed_demo_data(store.as_ref(), &passwords)
            .await
            .context("failed to seed demo data")?;
        info!(employees = report.employees, customers = report.customers, "Demo data seeded");
    }

    let tokens = TokenService::from_config(&config.security).context("failed to build token service")?;
    let bind_addr = config.bind_addr();
    let app = router(AppState::new(config, store, tokens, passwords));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Ticket Desk API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
