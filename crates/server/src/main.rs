//! handoffd - one-shot ephemeral file exchange daemon.

use anyhow::Context;
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use handoff_core::config::AppConfig;
use handoff_server::{AppState, create_router};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "handoffd", about = "One-shot ephemeral file exchange server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "HANDOFF_CONFIG", default_value = "config/server.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config: AppConfig = Figment::new()
        .merge(Toml::file(&args.config))
        .merge(Env::prefixed("HANDOFF_").split("__"))
        .extract()
        .with_context(|| {
            format!(
                "failed to load configuration from {} (see config/server.example.toml)",
                args.config
            )
        })?;

    let blobs = handoff_storage::from_config(&config.storage).await?;
    let metadata = handoff_metadata::from_config(&config.metadata).await?;

    blobs
        .health_check()
        .await
        .context("blob storage health check failed")?;
    metadata
        .health_check()
        .await
        .context("metadata store health check failed")?;

    let bind = config.server.bind.clone();
    let state = AppState::new(config, blobs, metadata);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(addr = %bind, "handoffd listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
