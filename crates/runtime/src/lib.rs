use std::sync::Arc;

use anyhow::{Context, Result};
use distributed_config::AppConfig;
use distributed_gateway::AppState;
use distributed_micro::MicroClient;
use tracing::info;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::TRACE)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything the gateway needs to serve requests.
#[derive(Clone)]
pub struct BackendServices {
    pub client: Arc<MicroClient>,
    pub state: AppState,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let client = Arc::new(
            MicroClient::new(&config.services).context("failed to build the microservice client")?,
        );
        let state = AppState::from_client(client.clone());

        info!(
            base_url = %client.base_url(),
            timeout_seconds = config.services.request_timeout_seconds,
            "microservice client ready"
        );

        Ok(Self { client, state })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
