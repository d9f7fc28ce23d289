//! Client credentials flow for app-only access tokens.

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{error, info};

use crate::error::{EtlError, Result};

pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Exchange app credentials for a bearer token.
pub fn request_app_token(http: &Client, credentials: &Credentials) -> Result<String> {
    let response = http
        .post(TOKEN_URL)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        error!(status = status.as_u16(), body = %body, "Token request rejected");
        return Err(EtlError::Auth(format!("token endpoint returned {}", status)));
    }

    let token: TokenResponse = response.json()?;
    info!(expires_in = ?token.expires_in, "Obtained app access token");
    Ok(token.access_token)
}
