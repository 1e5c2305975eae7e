use std::env::VarError;
use std::fmt;
use std::time::Duration;

use rootcause::Report;
use rootcause::prelude::ResultExt;

use crate::error::ErrorKind;

pub const DEFAULT_IP_ECHO_URL: &str = "https://api.ipify.org";
pub const DEFAULT_CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub zone_name: String,
    pub record_name: String,
    pub api_token: String,
    pub ip_echo_url: String,
    pub api_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Report<ErrorKind>> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// Builds the config from an arbitrary variable lookup.
    ///
    /// Unset, empty and non-unicode values all count as missing. Every missing
    /// required key is collected before failing, so a single error names them all.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Result<String, VarError>,
    ) -> Result<Self, Report<ErrorKind>> {
        let read = |key: &str| match lookup(key) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => None,
        };

        let zone_name = read("ZONE_NAME");
        let record_name = read("RECORD_NAME");
        let api_token = read("API_TOKEN");

        let (Some(zone_name), Some(record_name), Some(api_token)) =
            (&zone_name, &record_name, &api_token)
        else {
            let missing = [
                ("ZONE_NAME", &zone_name),
                ("RECORD_NAME", &record_name),
                ("API_TOKEN", &api_token),
            ]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| key.to_string())
            .collect();
            return Err(Report::new(ErrorKind::Config { missing }));
        };

        Ok(Self {
            zone_name: zone_name.clone(),
            record_name: record_name.clone(),
            api_token: api_token.clone(),
            ip_echo_url: read("IP_ECHO_URL").unwrap_or(DEFAULT_IP_ECHO_URL.to_string()),
            api_base_url: read("CLOUDFLARE_API_URL")
                .unwrap_or(DEFAULT_CLOUDFLARE_API_URL.to_string()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("zone_name", &self.zone_name)
            .field("record_name", &self.record_name)
            .field("api_token", &"<redacted>")
            .field("ip_echo_url", &self.ip_echo_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// The one HTTP client shared by every outbound call of a run.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, Report<ErrorKind>> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context(ErrorKind::Network)
        .attach("Building HTTP client")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn loads_required_and_defaults() {
        let config = Config::from_lookup(lookup_in(&[
            ("ZONE_NAME", "example.com"),
            ("RECORD_NAME", "home.example.com"),
            ("API_TOKEN", "T"),
        ]))
        .unwrap();

        assert_eq!(config.zone_name, "example.com");
        assert_eq!(config.record_name, "home.example.com");
        assert_eq!(config.api_token, "T");
        assert_eq!(config.ip_echo_url, DEFAULT_IP_ECHO_URL);
        assert_eq!(config.api_base_url, DEFAULT_CLOUDFLARE_API_URL);
    }

    #[test]
    fn optional_endpoints_can_be_overridden() {
        let config = Config::from_lookup(lookup_in(&[
            ("ZONE_NAME", "example.com"),
            ("RECORD_NAME", "home.example.com"),
            ("API_TOKEN", "T"),
            ("IP_ECHO_URL", "http://127.0.0.1:9000/ip"),
            ("CLOUDFLARE_API_URL", "http://127.0.0.1:9001"),
        ]))
        .unwrap();

        assert_eq!(config.ip_echo_url, "http://127.0.0.1:9000/ip");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9001");
    }

    #[test]
    fn names_every_missing_key() {
        let err = Config::from_lookup(lookup_in(&[("RECORD_NAME", "home.example.com")]))
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &ErrorKind::Config {
                missing: vec!["ZONE_NAME".to_string(), "API_TOKEN".to_string()]
            }
        );
        assert_eq!(
            err.current_context().to_string(),
            "missing environment variables: ZONE_NAME, API_TOKEN"
        );
    }

    #[test]
    fn empty_and_non_unicode_values_count_as_missing() {
        let err = Config::from_lookup(|key| match key {
            "ZONE_NAME" => Ok(String::new()),
            "RECORD_NAME" => Err(VarError::NotUnicode("\u{fffd}".into())),
            "API_TOKEN" => Ok("T".to_string()),
            _ => Err(VarError::NotPresent),
        })
        .unwrap_err();

        assert_eq!(
            err.current_context(),
            &ErrorKind::Config {
                missing: vec!["ZONE_NAME".to_string(), "RECORD_NAME".to_string()]
            }
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let config = Config::from_lookup(lookup_in(&[
            ("ZONE_NAME", "example.com"),
            ("RECORD_NAME", "home.example.com"),
            ("API_TOKEN", "super-secret"),
        ]))
        .unwrap();

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
