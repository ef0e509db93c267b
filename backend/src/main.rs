//! Backend entry point: configuration, tracing, and server startup.

mod server;

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::domain::ProviderRegistry;
use server::{AppConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    // Missing store configuration is fatal; there is no degraded mode.
    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr;

    // External identity providers are registered here at wiring time; the
    // handlers only ever see the registry.
    let providers = ProviderRegistry::new();

    let server = create_server(config, providers).await?;
    info!(%bind_addr, "listening");
    server.await
}
