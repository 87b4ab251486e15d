//! ClinicSync server entry point

use anyhow::Context as _;
use clinicsync_api::{router, AppContext};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = clinicsync_infra::load_config().context("loading configuration")?;
    let bind_address = config.bind_address.clone();
    let context = AppContext::initialize(config).context("initialising application context")?;

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {bind_address}"))?;
    info!(address = %bind_address, "clinicsync listening");

    axum::serve(listener, router(context))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    // Errors installing the handler leave the server running until killed.
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
