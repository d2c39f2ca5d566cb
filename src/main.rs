use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tower::make::Shared;
use tracing_subscriber::EnvFilter;

use dispute_backend::config::AppConfig;
use dispute_backend::notify::Notifier;
use dispute_backend::routes;
use dispute_backend::s3::build_client;
use dispute_backend::state::AppState;
use dispute_backend::storage::S3Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "api",
        server_host = %config.server_host,
        server_port = config.server_port,
        storage_endpoint = %config.storage.endpoint_url,
        storage_bucket = %config.storage.bucket,
        email_provider = config.email.provider.as_ref().map(|p| p.name()).unwrap_or("none"),
        email_enabled = config.email.is_enabled(),
        "loaded backend configuration"
    );
    if !config.email.is_enabled() {
        tracing::warn!("email notifications disabled: provider or EMAIL_RECIPIENT missing");
    }

    let s3_client = build_client(&config.storage).await?;
    let storage = Arc::new(S3Storage::new(
        s3_client,
        config.storage.bucket.clone(),
        config.storage.public_base(),
    ));
    let notifier = Notifier::from_config(&config.email)?;

    let state = AppState::new(config, storage, notifier);
    let listen_addr: SocketAddr = {
        let config = state.config.clone();
        format!("{}:{}", config.server_host, config.server_port).parse()?
    };
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, Shared::new(router))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        tracing::info!("received shutdown signal");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
