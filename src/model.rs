//! Typed views of the Spotify Web API payloads the pipeline consumes.
//!
//! Only the fields the output tables need are modelled; everything else in the
//! response is ignored on deserialization.

use serde::Deserialize;

/// One page of a cursor-paginated collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Envelope returned by the category playlists endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryPlaylistsPage {
    pub playlists: Paging<SimplifiedPlaylist>,
}

/// Playlist as listed under a category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimplifiedPlaylist {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    pub name: String,
    pub snapshot_id: String,
    pub tracks: TracksRef,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TracksRef {
    pub href: String,
    pub total: i64,
}

/// Playlist as returned by the per-id endpoint, with its first page of tracks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub followers: Followers,
    pub tracks: Paging<TrackOccurrence>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Followers {
    pub total: i64,
}

/// A track's appearance in a playlist.
///
/// `track` is null for items removed from the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackOccurrence {
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(default)]
    pub track: Option<Track>,
}

/// A playlist item. Local files carry no `id`; episodes (requested through
/// `additional_types`) carry no `popularity` or `album`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub popularity: Option<i64>,
    #[serde(default)]
    pub album: Option<Album>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub album_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_page_fixture() {
        let raw = std::fs::read_to_string("tests/fixtures/category_latin.json").unwrap();
        let page: CategoryPlaylistsPage = serde_json::from_str(&raw).unwrap();
        assert_eq!(page.playlists.items.len(), 2);
        assert_eq!(page.playlists.items[0].id, "37i9dQZF1DX10zKzsJ2jva");
        assert_eq!(page.playlists.items[0].tracks.total, 3);
        assert!(page.playlists.next.is_none());
    }

    #[test]
    fn playlist_fixture_keeps_track_cursor() {
        let raw = std::fs::read_to_string("tests/fixtures/playlist_viva_latino.json").unwrap();
        let playlist: Playlist = serde_json::from_str(&raw).unwrap();
        assert_eq!(playlist.followers.total, 12_345_678);
        assert_eq!(playlist.tracks.items.len(), 2);
        assert!(playlist.tracks.next.as_deref().unwrap().contains("offset=2"));
        let artists = &playlist.tracks.items[1].track.as_ref().unwrap().artists;
        assert_eq!(artists.len(), 2);
        assert_eq!(artists[1].name.as_deref(), Some("Karol G"));
    }

    #[test]
    fn missing_description_is_none() {
        let p: SimplifiedPlaylist = serde_json::from_value(serde_json::json!({
            "id": "A",
            "name": "A list",
            "snapshot_id": "s1",
            "tracks": { "href": "https://api.spotify.com/v1/playlists/A/tracks", "total": 0 }
        }))
        .unwrap();
        assert_eq!(p.description, None);
    }

    #[test]
    fn removed_local_and_episode_items_deserialize() {
        let page: Paging<TrackOccurrence> = serde_json::from_value(serde_json::json!({
            "items": [
                { "added_at": "2024-01-01T00:00:00Z", "track": null },
                {
                    "added_at": "2024-01-02T00:00:00Z",
                    "track": {
                        "id": null,
                        "name": "demo.mp3",
                        "uri": "spotify:local:::demo:180",
                        "popularity": 0,
                        "album": { "album_type": null },
                        "artists": [{ "id": null, "name": "" }]
                    }
                },
                {
                    "added_at": "2024-01-03T00:00:00Z",
                    "track": { "id": "E1", "name": "Episode", "uri": "spotify:episode:E1", "type": "episode" }
                }
            ],
            "next": null
        }))
        .unwrap();

        assert!(page.items[0].track.is_none());
        let local = page.items[1].track.as_ref().unwrap();
        assert_eq!(local.id, None);
        assert_eq!(local.album.as_ref().unwrap().album_type, None);
        let episode = page.items[2].track.as_ref().unwrap();
        assert_eq!(episode.id.as_deref(), Some("E1"));
        assert_eq!(episode.popularity, None);
        assert!(episode.album.is_none());
        assert!(episode.artists.is_empty());
    }

    #[test]
    fn error_body_is_not_a_playlist() {
        let body = serde_json::json!({ "error": { "status": 404, "message": "Not found." } });
        assert!(serde_json::from_value::<Playlist>(body).is_err());
    }
}
