//! Scripted `CatalogApi` for tests: serves canned bodies and records each call.

use std::collections::{HashMap, VecDeque};

use serde_json::Value;

use super::{ApiResponse, CatalogApi};
use crate::error::Result;
use crate::paginate::PageRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CategoryPlaylists { category_id: String, page: PageRequest },
    Playlist { playlist_id: String },
    TracksPage { playlist_id: String, page: PageRequest },
}

#[derive(Default)]
pub struct FakeApi {
    category_pages: VecDeque<ApiResponse>,
    playlists: HashMap<String, ApiResponse>,
    track_pages: HashMap<String, VecDeque<ApiResponse>>,
    pub calls: Vec<Call>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category_page(mut self, body: Value) -> Self {
        self.category_pages.push_back(ApiResponse::ok(body));
        self
    }

    pub fn with_playlist(mut self, id: &str, body: Value) -> Self {
        self.playlists.insert(id.to_string(), ApiResponse::ok(body));
        self
    }

    pub fn with_playlist_response(mut self, id: &str, response: ApiResponse) -> Self {
        self.playlists.insert(id.to_string(), response);
        self
    }

    pub fn with_track_page(mut self, playlist_id: &str, body: Value) -> Self {
        self.track_pages
            .entry(playlist_id.to_string())
            .or_default()
            .push_back(ApiResponse::ok(body));
        self
    }
}

impl CatalogApi for FakeApi {
    fn list_category_playlists(
        &mut self,
        category_id: &str,
        _country: Option<&str>,
        page: PageRequest,
    ) -> Result<ApiResponse> {
        self.calls.push(Call::CategoryPlaylists {
            category_id: category_id.to_string(),
            page,
        });
        Ok(self
            .category_pages
            .pop_front()
            .expect("unscripted category page request"))
    }

    fn get_playlist(
        &mut self,
        playlist_id: &str,
        _market: Option<&str>,
        _fields: Option<&str>,
        _additional_types: Option<&str>,
    ) -> Result<ApiResponse> {
        self.calls.push(Call::Playlist {
            playlist_id: playlist_id.to_string(),
        });
        Ok(self
            .playlists
            .get(playlist_id)
            .cloned()
            .expect("unscripted playlist request"))
    }

    fn get_playlist_tracks_page(
        &mut self,
        playlist_id: &str,
        _market: Option<&str>,
        page: PageRequest,
        _additional_types: Option<&str>,
    ) -> Result<ApiResponse> {
        self.calls.push(Call::TracksPage {
            playlist_id: playlist_id.to_string(),
            page,
        });
        Ok(self
            .track_pages
            .get_mut(playlist_id)
            .and_then(VecDeque::pop_front)
            .expect("unscripted track page request"))
    }
}
