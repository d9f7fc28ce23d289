//! Boundary to the Spotify Web API.
//!
//! Only the three endpoints the extractor needs are modelled. Implementations
//! own authentication and rate limiting; callers just see raw JSON payloads.

pub mod auth;
pub mod client;
pub mod rate_limit;

#[cfg(test)]
pub mod fake;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{EtlError, Result};
use crate::paginate::PageRequest;

pub use client::SpotifyClient;

/// A response body together with the HTTP status it arrived with.
///
/// Non-success responses are still handed back; the gateway has already logged
/// them and decoding the body is what fails downstream.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    #[cfg(test)]
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body into the payload shape the caller expects.
    pub fn decode<T: DeserializeOwned>(self, context: &str) -> Result<T> {
        serde_json::from_value(self.body).map_err(|e| EtlError::payload(context, e))
    }

    /// `error.message` from a Spotify error body, if present.
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error")?.get("message")?.as_str()
    }
}

/// Optional query parameters passed through to the API unchanged.
#[derive(Debug, Clone, Default)]
pub struct ApiOptions {
    pub country: Option<String>,
    pub market: Option<String>,
    pub fields: Option<String>,
    pub additional_types: Option<String>,
}

pub trait CatalogApi {
    /// `GET /browse/categories/{category_id}/playlists`
    fn list_category_playlists(
        &mut self,
        category_id: &str,
        country: Option<&str>,
        page: PageRequest,
    ) -> Result<ApiResponse>;

    /// `GET /playlists/{playlist_id}`
    fn get_playlist(
        &mut self,
        playlist_id: &str,
        market: Option<&str>,
        fields: Option<&str>,
        additional_types: Option<&str>,
    ) -> Result<ApiResponse>;

    /// `GET /playlists/{playlist_id}/tracks`
    fn get_playlist_tracks_page(
        &mut self,
        playlist_id: &str,
        market: Option<&str>,
        page: PageRequest,
        additional_types: Option<&str>,
    ) -> Result<ApiResponse>;
}
