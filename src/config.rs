use std::path::PathBuf;

use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::{error, info};

use crate::paginate::DEFAULT_PAGE_LIMIT;
use crate::spotify::auth::Credentials;
use crate::spotify::ApiOptions;

const CONFIG_FILE: &str = "spotify_etl";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_category_id")]
    pub category_id: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub fields: Option<String>,
    #[serde(default)]
    pub additional_types: Option<String>,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    // No published limit for these endpoints; 100 calls per 30s stays clear of 429s.
    #[serde(default = "default_rate_limit_calls")]
    pub rate_limit_calls: u32,
    #[serde(default = "default_rate_limit_period_secs")]
    pub rate_limit_period_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_category_id() -> String {
    "latin".to_string()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/spotify.sqlite")
}
fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}
fn default_rate_limit_calls() -> u32 {
    100
}
fn default_rate_limit_period_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    8
}
fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_max_backoff_ms() -> u64 {
    60_000
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Settings {
    /// `spotify_etl.toml` (optional), then `SPOTIFY_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix("SPOTIFY").try_parsing(true))
                .build()?,
        )
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some(Credentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
            }),
            _ => None,
        }
    }

    /// Log whether credentials are present. A missing pair does not stop the
    /// run here; the token request fails later instead.
    pub fn check_credentials(&self) -> bool {
        if self.credentials().is_some() {
            info!("Loaded client_id and client_secret");
            true
        } else {
            error!("Client ID or client secret not set");
            false
        }
    }

    pub fn api_options(&self) -> ApiOptions {
        ApiOptions {
            country: self.country.clone(),
            market: self.market.clone(),
            fields: self.fields.clone(),
            additional_types: self.additional_types.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Settings {
        let mut builder = Config::builder();
        for (k, v) in pairs {
            builder = builder.set_override(*k, *v).unwrap();
        }
        Settings::from_config(builder.build().unwrap()).unwrap()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let s = from_pairs(&[]);
        assert_eq!(s.category_id, "latin");
        assert_eq!(s.page_limit, 50);
        assert_eq!(s.rate_limit_calls, 100);
        assert_eq!(s.rate_limit_period_secs, 30);
        assert_eq!(s.db_path, PathBuf::from("data/spotify.sqlite"));
        assert!(s.credentials().is_none());
        assert!(!s.check_credentials());
    }

    #[test]
    fn credentials_need_both_halves() {
        let s = from_pairs(&[("client_id", "abc")]);
        assert!(s.credentials().is_none());

        let s = from_pairs(&[("client_id", "abc"), ("client_secret", "xyz")]);
        let c = s.credentials().unwrap();
        assert_eq!(c.client_id, "abc");
        assert_eq!(c.client_secret, "xyz");
    }

    #[test]
    fn numeric_overrides_parse() {
        let s = from_pairs(&[("page_limit", "20"), ("max_retries", "3"), ("market", "MX")]);
        assert_eq!(s.page_limit, 20);
        assert_eq!(s.max_retries, 3);
        assert_eq!(s.api_options().market.as_deref(), Some("MX"));
    }
}
