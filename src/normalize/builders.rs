//! The six output tables, each a pure function of [`Sources`].

use std::sync::LazyLock;

use regex::Regex;

use super::table::{integer, text, Cell, Table};
use super::views::Views;
use crate::error::Result;
use crate::model::{Playlist, SimplifiedPlaylist};

// Some descriptions come back with embedded newlines.
static NEWLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n").unwrap());

pub struct Sources<'a> {
    pub simplified_playlists: &'a [SimplifiedPlaylist],
    pub playlists: &'a [Playlist],
    pub views: &'a Views,
}

pub type TableBuilder = fn(&Sources<'_>) -> Result<Table>;

/// Output tables in build and load order.
pub const TABLE_BUILDERS: [(&str, TableBuilder); 6] = [
    ("category_playlist_records", category_playlist_records),
    ("playlist_records", playlist_records),
    ("tracks_records", tracks_records),
    ("playlist_track_id_records", playlist_track_id_records),
    ("track_artist_id_records", track_artist_id_records),
    ("artists_records", artists_records),
];

/// A playlist listed twice with identical fields keeps one row; differing
/// fields are a `DuplicateKey` error.
pub fn category_playlist_records(src: &Sources<'_>) -> Result<Table> {
    let mut table = Table::keyed(
        "category_playlist_records",
        text("id"),
        &[
            text("description"),
            text("name"),
            text("snapshot_id"),
            text("tracks_url"),
            integer("total_tracks"),
        ],
    );
    for p in src.simplified_playlists {
        table.push(vec![
            p.id.as_str().into(),
            p.description
                .as_deref()
                .map(|d| NEWLINE_RE.replace_all(d, "").into_owned())
                .into(),
            p.name.as_str().into(),
            p.snapshot_id.as_str().into(),
            p.tracks.href.as_str().into(),
            Cell::Int(p.tracks.total),
        ]);
    }
    table.dedup_rows().ensure_unique_key()
}

pub fn playlist_records(src: &Sources<'_>) -> Result<Table> {
    let mut table = Table::keyed("playlist_records", text("id"), &[integer("followers")]);
    for p in src.playlists {
        table.push(vec![p.id.as_str().into(), Cell::Int(p.followers.total)]);
    }
    table.dedup_rows().ensure_unique_key()
}

/// One row per distinct track. Occurrences of the same track must agree on
/// every column; a disagreement is a `DuplicateKey` error.
pub fn tracks_records(src: &Sources<'_>) -> Result<Table> {
    let mut table = Table::keyed(
        "tracks_records",
        text("id"),
        &[
            text("album_type"),
            text("name"),
            integer("popularity"),
            text("uri"),
        ],
    );
    for item in &src.views.items {
        table.push(vec![
            item.track_id.as_str().into(),
            item.album_type.as_deref().into(),
            item.track_name.as_deref().into(),
            item.track_popularity.into(),
            item.track_uri.as_deref().into(),
        ]);
    }
    table.dedup_rows().ensure_unique_key()
}

pub fn playlist_track_id_records(src: &Sources<'_>) -> Result<Table> {
    let mut table = Table::unkeyed(
        "playlist_track_id_records",
        &[text("playlist_id"), text("playlist_added_at"), text("track_id")],
    );
    for item in &src.views.items {
        table.push(vec![
            item.playlist_id.as_str().into(),
            item.added_at.as_deref().into(),
            item.track_id.as_str().into(),
        ]);
    }
    Ok(table)
}

pub fn track_artist_id_records(src: &Sources<'_>) -> Result<Table> {
    let mut table = Table::unkeyed("track_artist_id_records", &[text("artist_id"), text("track_id")]);
    for artist in &src.views.artists {
        table.push(vec![artist.id.as_str().into(), artist.track_id.as_str().into()]);
    }
    Ok(table)
}

/// Distinct `(id, name)` pairs. An artist whose name differs between
/// occurrences keeps one row per spelling.
pub fn artists_records(src: &Sources<'_>) -> Result<Table> {
    let mut table = Table::unkeyed("artists_records", &[text("id"), text("name")]);
    for artist in &src.views.artists {
        table.push(vec![artist.id.as_str().into(), artist.name.as_deref().into()]);
    }
    Ok(table.dedup_rows())
}
