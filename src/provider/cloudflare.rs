use async_trait::async_trait;
use reqwest::{Method, Response};
use rootcause::Report;
use rootcause::prelude::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::{DnsProvider, DnsRecord, RecordId, Zone, ZoneId};
use crate::error::ErrorKind;

pub struct CloudflareProvider {
    api_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl CloudflareProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Sends one authenticated request and hands back the response if its
    /// status is 2xx. Any other status is consumed into [`ErrorKind::Upstream`].
    async fn perform(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        token: &str,
        body: Option<&DnsRecordPayload>,
    ) -> Result<Response, Report<ErrorKind>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Sending Cloudflare request");

        let mut request = self.client.request(method.clone(), &url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .context(ErrorKind::Network)
            .attach(format!("request: {method} {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or("<Response reading failed>".to_string());
            return Err(Report::new(ErrorKind::Upstream {
                status: status.as_u16(),
                body,
            })
            .attach(format!("request: {method} {url}")));
        }

        Ok(response)
    }

    async fn write_record(
        &self,
        method: Method,
        path: &str,
        record_name: &str,
        ip: &str,
    ) -> Result<(), Report<ErrorKind>> {
        let payload = DnsRecordPayload::a_record(record_name, ip);
        self.perform(method, path, &[], &self.api_token, Some(&payload))
            .await?
            .bytes()
            .await
            .context(ErrorKind::Network)
            .attach("Reading Cloudflare write response")?;
        Ok(())
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn resolve_zone(&self, zone_name: &str) -> Result<ZoneId, Report<ErrorKind>> {
        let response = self
            .perform(Method::GET, "/zones", &[("name", zone_name)], &self.api_token, None)
            .await
            .attach(format!("zone: '{zone_name}'"))?;
        let envelope = decode_envelope::<Zone>(response)
            .await
            .attach(format!("zone: '{zone_name}'"))?;

        warn_on_ambiguity("zone", zone_name, envelope.result.len());
        let Some(zone) = envelope.result.into_iter().next() else {
            return Err(Report::new(ErrorKind::NotFound {
                zone: zone_name.to_string(),
            }));
        };

        info!(zone_id = %zone.id, zone = %zone.name, "Resolved zone");
        Ok(zone.id)
    }

    async fn resolve_record(
        &self,
        zone_id: &ZoneId,
        record_name: &str,
    ) -> Result<Option<DnsRecord>, Report<ErrorKind>> {
        let response = self
            .perform(
                Method::GET,
                &format!("/zones/{zone_id}/dns_records"),
                &[("name", record_name)],
                &self.api_token,
                None,
            )
            .await
            .attach(format!("record: '{record_name}'"))?;
        let envelope = decode_envelope::<DnsRecord>(response)
            .await
            .attach(format!("record: '{record_name}'"))?;

        warn_on_ambiguity("record", record_name, envelope.result.len());
        let record = envelope.result.into_iter().next();
        match &record {
            Some(record) => info!(
                record_id = %record.id,
                name = %record.name,
                record_type = %record.r#type,
                content = %record.content,
                "Record found"
            ),
            None => info!(record = %record_name, "Record does not exist"),
        }
        Ok(record)
    }

    async fn create_record(
        &self,
        zone_id: &ZoneId,
        record_name: &str,
        ip: &str,
    ) -> Result<(), Report<ErrorKind>> {
        self.write_record(
            Method::POST,
            &format!("/zones/{zone_id}/dns_records"),
            record_name,
            ip,
        )
        .await
        .attach(format!("creating record '{record_name}'"))?;

        info!(record = %record_name, ip = %ip, "DNS record created");
        Ok(())
    }

    async fn update_record(
        &self,
        zone_id: &ZoneId,
        record_name: &str,
        record_id: &RecordId,
        ip: &str,
    ) -> Result<(), Report<ErrorKind>> {
        self.write_record(
            Method::PUT,
            &format!("/zones/{zone_id}/dns_records/{record_id}"),
            record_name,
            ip,
        )
        .await
        .attach(format!("updating record '{record_name}' ({record_id})"))?;

        info!(record = %record_name, ip = %ip, "DNS record updated");
        Ok(())
    }
}

/// Reads the whole body and decodes it as a Cloudflare envelope of `T`.
async fn decode_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<CloudflareResponse<T>, Report<ErrorKind>> {
    let body = response
        .bytes()
        .await
        .context(ErrorKind::Network)
        .attach("Reading Cloudflare response body")?;

    let envelope = serde_json::from_slice::<CloudflareResponse<T>>(&body)
        .context(ErrorKind::Decode)
        .attach(format!("body: {:?}", String::from_utf8_lossy(&body)))?;

    if !envelope.success {
        warn!(errors = ?envelope.errors, "Cloudflare reported success=false on a 2xx response");
    }
    Ok(envelope)
}

// Only the first match is used; more than one is worth a note in the logs.
fn warn_on_ambiguity(kind: &str, name: &str, matches: usize) {
    if matches > 1 {
        warn!(kind, name, matches, "Multiple matches, using the first one");
    }
}

#[derive(serde::Deserialize, Debug)]
struct CloudflareResponse<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
struct DnsRecordPayload {
    r#type: &'static str,
    name: String,
    content: String,
    proxied: bool,
}

impl DnsRecordPayload {
    fn a_record(name: &str, content: &str) -> Self {
        Self {
            r#type: "A",
            name: name.to_string(),
            content: content.to_string(),
            proxied: false,
        }
    }
}
