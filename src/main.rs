use rootcause::Report;
use rootcause::prelude::ResultExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    error::ErrorKind,
    ip::HttpIpSource,
    provider::cloudflare::CloudflareProvider,
    reconcile::Outcome,
    types::{Config, REQUEST_TIMEOUT},
};

mod error;
mod ip;
mod provider;
mod reconcile;
mod types;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run().await {
        Ok(outcome) => info!(%outcome, "Reconciliation finished"),
        Err(e) => {
            error!(err = %e, "Reconciliation failed");
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<Outcome, Report<ErrorKind>> {
    let config = Config::from_env()?;
    info!(
        zone = %config.zone_name,
        record = %config.record_name,
        "Starting reconciliation"
    );

    let client = types::http_client(REQUEST_TIMEOUT)?;
    let ip_source = HttpIpSource::new(client.clone(), &config.ip_echo_url);
    let provider = CloudflareProvider::new(client, &config.api_base_url, &config.api_token);

    reconcile::reconcile(&ip_source, &provider, &config)
        .await
        .attach(format!("Record: {}", config.record_name))
}
