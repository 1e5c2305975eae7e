use async_trait::async_trait;
use derive_more::Display;
use rootcause::Report;
use serde::Deserialize;

use crate::error::ErrorKind;

pub mod cloudflare;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deserialize)]
pub struct ZoneId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deserialize)]
pub struct RecordId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsRecord {
    pub id: RecordId,
    pub name: String,
    pub content: String,
    pub r#type: String,
}

/// The four calls a reconciliation run needs from a DNS host.
///
/// Lookups return the first match only. A missing record is `Ok(None)`, a
/// missing zone is an [`ErrorKind::NotFound`] error.
#[async_trait]
pub trait DnsProvider {
    async fn resolve_zone(&self, zone_name: &str) -> Result<ZoneId, Report<ErrorKind>>;
    async fn resolve_record(
        &self,
        zone_id: &ZoneId,
        record_name: &str,
    ) -> Result<Option<DnsRecord>, Report<ErrorKind>>;
    async fn create_record(
        &self,
        zone_id: &ZoneId,
        record_name: &str,
        ip: &str,
    ) -> Result<(), Report<ErrorKind>>;
    async fn update_record(
        &self,
        zone_id: &ZoneId,
        record_name: &str,
        record_id: &RecordId,
        ip: &str,
    ) -> Result<(), Report<ErrorKind>>;
}
