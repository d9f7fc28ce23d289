use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, info, warn};

use super::auth::{self, Credentials};
use super::rate_limit::{Backoff, RateLimiter};
use super::{ApiResponse, CatalogApi};
use crate::config::Settings;
use crate::error::{EtlError, Result};
use crate::paginate::PageRequest;

const API_BASE: &str = "https://api.spotify.com/v1";

/// Blocking Spotify client. One request in flight at a time.
pub struct SpotifyClient {
    http: Client,
    credentials: Option<Credentials>,
    access_token: Option<String>,
    limiter: RateLimiter,
    backoff: Backoff,
}

impl SpotifyClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            credentials: settings.credentials(),
            access_token: None,
            limiter: RateLimiter::new(
                settings.rate_limit_calls,
                Duration::from_secs(settings.rate_limit_period_secs),
            ),
            backoff: Backoff {
                initial: Duration::from_millis(settings.initial_backoff_ms),
                max_delay: Duration::from_millis(settings.max_backoff_ms),
                max_retries: settings.max_retries,
            },
        })
    }

    /// Fetch a fresh app token. Can be called again once the token expires.
    pub fn authenticate(&mut self) -> Result<()> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| EtlError::Auth("client id or client secret not set".into()))?;
        self.access_token = Some(auth::request_app_token(&self.http, credentials)?);
        Ok(())
    }

    fn get(&mut self, path: &str, query: &[(&str, Option<String>)]) -> Result<ApiResponse> {
        let url = format!("{}{}", API_BASE, path);
        let query: Vec<(&str, String)> = query
            .iter()
            .filter_map(|(k, v)| v.clone().map(|v| (*k, v)))
            .collect();

        let mut attempt = 0;
        loop {
            if let Err(wait) = self.limiter.try_acquire() {
                self.back_off(&mut attempt, Some(wait), path)?;
                continue;
            }

            let mut request = self.http.get(&url).query(&query);
            match &self.access_token {
                Some(token) => request = request.bearer_auth(token),
                None => warn!("Spotify access token has not been set"),
            }

            let response = request.send()?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let hint = retry_after(response.headers());
                self.back_off(&mut attempt, hint, path)?;
                continue;
            }

            let text = response.text()?;
            return read_body(status, &text, path);
        }
    }

    fn back_off(&self, attempt: &mut u32, hint: Option<Duration>, path: &str) -> Result<()> {
        let delay = self.backoff.next_delay(*attempt, hint)?;
        warn!(
            "Rate limited on {} (attempt {}/{}), backing off {:.1}s",
            path,
            *attempt + 1,
            self.backoff.max_retries,
            delay.as_secs_f64()
        );
        std::thread::sleep(delay);
        *attempt += 1;
        Ok(())
    }
}

/// `Retry-After` in whole seconds.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Turn a finished response into an [`ApiResponse`].
///
/// A non-success status is logged and its body handed on; a body that is not
/// JSON becomes `null` there. Only a success status with a non-JSON body is an
/// error here.
fn read_body(status: StatusCode, text: &str, path: &str) -> Result<ApiResponse> {
    let parsed = serde_json::from_str::<Value>(text);

    if status.is_success() {
        let body = parsed.map_err(|e| EtlError::payload(path, e))?;
        return Ok(ApiResponse {
            status: status.as_u16(),
            body,
        });
    }

    let body = parsed.unwrap_or(Value::Null);
    let response = ApiResponse {
        status: status.as_u16(),
        body,
    };
    error!(
        status = status.as_u16(),
        reason = status.canonical_reason().unwrap_or(""),
        message = response.error_message().unwrap_or(""),
        path,
        "Spotify API request failed"
    );
    Ok(response)
}

impl CatalogApi for SpotifyClient {
    fn list_category_playlists(
        &mut self,
        category_id: &str,
        country: Option<&str>,
        page: PageRequest,
    ) -> Result<ApiResponse> {
        info!(
            "Making \"Get Category Playlists\" request for category_id {} (offset={})",
            category_id, page.offset
        );
        self.get(
            &format!("/browse/categories/{}/playlists", category_id),
            &[
                ("country", country.map(str::to_string)),
                ("limit", Some(page.limit.to_string())),
                ("offset", Some(page.offset.to_string())),
            ],
        )
    }

    fn get_playlist(
        &mut self,
        playlist_id: &str,
        market: Option<&str>,
        fields: Option<&str>,
        additional_types: Option<&str>,
    ) -> Result<ApiResponse> {
        self.get(
            &format!("/playlists/{}", playlist_id),
            &[
                ("market", market.map(str::to_string)),
                ("fields", fields.map(str::to_string)),
                ("additional_types", additional_types.map(str::to_string)),
            ],
        )
    }

    fn get_playlist_tracks_page(
        &mut self,
        playlist_id: &str,
        market: Option<&str>,
        page: PageRequest,
        additional_types: Option<&str>,
    ) -> Result<ApiResponse> {
        info!(
            "Making \"Get Playlist Items\" request for playlist_id {} (offset={})",
            playlist_id, page.offset
        );
        self.get(
            &format!("/playlists/{}/tracks", playlist_id),
            &[
                ("market", market.map(str::to_string)),
                ("limit", Some(page.limit.to_string())),
                ("offset", Some(page.offset.to_string())),
                ("additional_types", additional_types.map(str::to_string)),
            ],
        )
    }
}
