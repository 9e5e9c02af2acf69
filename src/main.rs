use tokio::signal;
use tracing_subscriber::EnvFilter;

use azdo_serviceendpoints::config;
use azdo_serviceendpoints::{AzdoProvider, PROVIDER_NAME};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // stdout belongs to the plugin handshake
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config::log_level())),
        )
        .init();

    tracing::info!("Starting {PROVIDER_NAME} service endpoints provider");

    tokio::select! {
        served = tf_provider::serve(PROVIDER_NAME, AzdoProvider::new()) => served?,
        _ = shutdown_signal() => {}
    }

    tracing::info!("Provider stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
