//! Flattened intermediate views shared by the table builders.

use crate::model::{ArtistRef, Playlist};

/// One track occurrence in one playlist, with the track's fields flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub playlist_id: String,
    pub added_at: Option<String>,
    pub track_id: String,
    pub track_name: Option<String>,
    pub track_uri: Option<String>,
    pub track_popularity: Option<i64>,
    pub album_type: Option<String>,
    pub artists: Vec<ArtistRef>,
}

/// One contributing artist of one item row.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRow {
    pub id: String,
    pub name: Option<String>,
    pub track_id: String,
}

/// Both views, computed once per run and handed to every builder by reference.
#[derive(Debug, Clone, Default)]
pub struct Views {
    pub items: Vec<ItemRow>,
    pub artists: Vec<ArtistRow>,
}

impl Views {
    pub fn build(playlists: &[Playlist]) -> Self {
        let items = items_view(playlists);
        let artists = artists_view(&items);
        Self { items, artists }
    }
}

/// Unroll every playlist's track list into rows tagged with the playlist id.
///
/// Items without a track id (removed tracks, local files) have nothing to key
/// `tracks_records` on and are left out.
pub fn items_view(playlists: &[Playlist]) -> Vec<ItemRow> {
    playlists
        .iter()
        .flat_map(|playlist| {
            playlist.tracks.items.iter().filter_map(move |occ| {
                let track = occ.track.as_ref()?;
                Some(ItemRow {
                    playlist_id: playlist.id.clone(),
                    added_at: occ.added_at.clone(),
                    track_id: track.id.clone()?,
                    track_name: track.name.clone(),
                    track_uri: track.uri.clone(),
                    track_popularity: track.popularity,
                    album_type: track.album.as_ref().and_then(|a| a.album_type.clone()),
                    artists: track.artists.clone(),
                })
            })
        })
        .collect()
}

/// Unroll each item row's artists, one row per (occurrence, artist). Artists
/// without an id are skipped.
pub fn artists_view(items: &[ItemRow]) -> Vec<ArtistRow> {
    items
        .iter()
        .flat_map(|item| {
            item.artists.iter().filter_map(move |artist| {
                Some(ArtistRow {
                    id: artist.id.clone()?,
                    name: artist.name.clone(),
                    track_id: item.track_id.clone(),
                })
            })
        })
        .collect()
}
