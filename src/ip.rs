use async_trait::async_trait;
use rootcause::Report;
use rootcause::prelude::ResultExt;
use tracing::{debug, info};

use crate::error::ErrorKind;

#[async_trait]
pub trait IpSource {
    /// The caller's current public IPv4 address, exactly as reported.
    async fn public_ipv4(&self) -> Result<String, Report<ErrorKind>>;
}

/// Asks a plain-text IP echo service (ipify and friends) for our address.
pub struct HttpIpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpIpSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn public_ipv4(&self) -> Result<String, Report<ErrorKind>> {
        debug!(url = %self.url, "Fetching public IP");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context(ErrorKind::Network)
            .attach(format!("Fetching public IP from '{}'", self.url))?;

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
            .attach(format!("Fetching public IP from '{}'", self.url)));
        }

        let body = response
            .text()
            .await
            .context(ErrorKind::Network)
            .attach("Reading public IP response body")?;

        // Not validated, the value is only ever compared as a string.
        let ip = body.trim().to_string();
        info!(ip = %ip, "Public IP address");
        Ok(ip)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn returns_trimmed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(" 1.2.3.4\n"))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpIpSource::new(reqwest::Client::new(), server.uri());

        assert_eq!(source.public_ipv4().await.unwrap(), "1.2.3.4");
    }

    #[tokio::test]
    async fn body_is_not_validated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not-an-ip"))
            .mount(&server)
            .await;

        let source = HttpIpSource::new(reqwest::Client::new(), format!("{}/ip", server.uri()));

        assert_eq!(source.public_ipv4().await.unwrap(), "not-an-ip");
    }

    #[tokio::test]
    async fn error_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
            .mount(&server)
            .await;

        let source = HttpIpSource::new(reqwest::Client::new(), server.uri());
        let err = source.public_ipv4().await.unwrap_err();

        assert_eq!(
            err.current_context(),
            &ErrorKind::Upstream {
                status: 503,
                body: "try later".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_network_error() {
        let source = HttpIpSource::new(reqwest::Client::new(), "http://127.0.0.1:9");
        let err = source.public_ipv4().await.unwrap_err();

        assert_eq!(err.current_context(), &ErrorKind::Network);
    }
}
