use clap::Parser;
use tracing_subscriber::EnvFilter;

use journal_backend::api;
use journal_backend::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    tracing::info!(database_url = %config.database_url, "starting journal backend");

    api::server::start_server(config).await
}
