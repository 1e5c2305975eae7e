use derive_more::Display;
use rootcause::Report;
use rootcause::prelude::ResultExt;
use tracing::info;

use crate::error::ErrorKind;
use crate::ip::IpSource;
use crate::provider::DnsProvider;
use crate::types::Config;

/// Where a reconciliation run ended up.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Outcome {
    #[display("created ({ip})")]
    Created { ip: String },
    #[display("updated ({previous} -> {ip})")]
    Updated { previous: String, ip: String },
    #[display("unchanged ({ip})")]
    Unchanged { ip: String },
}

/// Converges the configured A record onto the current public IP.
///
/// Runs strictly in order: discover IP, resolve zone, look up record, then at
/// most one mutating call. The first error aborts the run.
pub async fn reconcile(
    ip_source: &(dyn IpSource + Send + Sync),
    provider: &(dyn DnsProvider + Send + Sync),
    config: &Config,
) -> Result<Outcome, Report<ErrorKind>> {
    let ip = ip_source.public_ipv4().await?;

    let zone_id = provider
        .resolve_zone(&config.zone_name)
        .await
        .attach(format!("For zone '{}'", config.zone_name))?;

    let record = provider
        .resolve_record(&zone_id, &config.record_name)
        .await
        .attach(format!("For record '{}'", config.record_name))?;

    let Some(record) = record else {
        info!(record = %config.record_name, ip = %ip, "Record does not exist, creating");
        provider
            .create_record(&zone_id, &config.record_name, &ip)
            .await?;
        return Ok(Outcome::Created { ip });
    };

    if record.content == ip {
        info!(ip = %ip, "IP not changed");
        return Ok(Outcome::Unchanged { ip });
    }

    info!(previous = %record.content, ip = %ip, "IP changed, updating");
    provider
        .update_record(&zone_id, &config.record_name, &record.id, &ip)
        .await?;

    Ok(Outcome::Updated {
        previous: record.content,
        ip,
    })
}
