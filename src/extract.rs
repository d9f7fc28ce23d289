//! Pulls a category's playlists and their complete track lists from the API.
//!
//! Three phases, strictly in sequence: paginate the category listing, fetch
//! each playlist's detail, then follow each playlist's track cursor until the
//! track list is complete.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::error::Result;
use crate::model::{CategoryPlaylistsPage, Paging, Playlist, SimplifiedPlaylist, TrackOccurrence};
use crate::paginate::{self, PageRequest};
use crate::spotify::{ApiOptions, CatalogApi};

/// Everything the normalizer needs from one run.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub simplified_playlists: Vec<SimplifiedPlaylist>,
    pub playlists: Vec<Playlist>,
}

pub struct Extractor<'a, A: CatalogApi> {
    api: &'a mut A,
    options: ApiOptions,
    page_limit: u32,
}

impl<'a, A: CatalogApi> Extractor<'a, A> {
    pub fn new(api: &'a mut A, options: ApiOptions, page_limit: u32) -> Self {
        Self {
            api,
            options,
            page_limit,
        }
    }

    pub fn extract(&mut self, category_id: &str) -> Result<Extracted> {
        let simplified_playlists = self.category_playlists(category_id)?;
        info!(
            "Got {} simplified playlists from category_id {}",
            simplified_playlists.len(),
            category_id
        );

        let fetched = self.playlists(&simplified_playlists)?;
        let playlists = fetched
            .into_iter()
            .map(|p| self.backfill_tracks(p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Extracted {
            simplified_playlists,
            playlists,
        })
    }

    /// Every playlist in the category, in page order then item order.
    pub fn category_playlists(&mut self, category_id: &str) -> Result<Vec<SimplifiedPlaylist>> {
        let api = &mut *self.api;
        let country = self.options.country.as_deref();
        let context = format!("category {} playlists", category_id);

        let pages: Vec<CategoryPlaylistsPage> =
            paginate::paginate(PageRequest::first(self.page_limit), |page| {
                api.list_category_playlists(category_id, country, page)?
                    .decode(&context)
            })?;

        Ok(pages
            .into_iter()
            .flat_map(|p| p.playlists.items)
            .collect())
    }

    /// Full detail for each listed playlist, one request each, in listing order.
    pub fn playlists(&mut self, simplified: &[SimplifiedPlaylist]) -> Result<Vec<Playlist>> {
        let total = simplified.len();
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );

        let mut playlists = Vec::with_capacity(total);
        for (i, sp) in simplified.iter().enumerate() {
            info!(
                "Making \"Get Playlist\" request for playlist_id {} ({}/{})",
                sp.id,
                i + 1,
                total
            );
            let playlist: Playlist = self
                .api
                .get_playlist(
                    &sp.id,
                    self.options.market.as_deref(),
                    self.options.fields.as_deref(),
                    self.options.additional_types.as_deref(),
                )?
                .decode(&format!("playlist {}", sp.id))?;
            playlists.push(playlist);
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(playlists)
    }

    /// Take a playlist as first fetched and return it with every track page
    /// appended, in page order, and `tracks.next` cleared.
    ///
    /// The playlist is consumed, so nothing else can observe it half-filled.
    pub fn backfill_tracks(&mut self, mut playlist: Playlist) -> Result<Playlist> {
        let api = &mut *self.api;
        let market = self.options.market.as_deref();
        let additional_types = self.options.additional_types.as_deref();
        let playlist_id = playlist.id.clone();
        let context = format!("playlist {} tracks", playlist_id);

        let pages: Vec<Paging<TrackOccurrence>> =
            paginate::follow_cursor(playlist.tracks.next.as_deref(), |page| {
                api.get_playlist_tracks_page(&playlist_id, market, page, additional_types)?
                    .decode(&context)
            })?;

        if !pages.is_empty() {
            let before = playlist.tracks.items.len();
            for page in pages {
                playlist.tracks.items.extend(page.items);
            }
            info!(
                "Backfilled playlist_id {} from {} to {} tracks",
                playlist_id,
                before,
                playlist.tracks.items.len()
            );
        }
        playlist.tracks.next = None;
        Ok(playlist)
    }
}
