//! Playlist payloads → six flat tables.
//!
//! Two-step pipeline: build the items and artists views once, then run each
//! table builder over them in a fixed order.

pub mod builders;
pub mod table;
pub mod views;

use tracing::{info, warn};

use crate::error::Result;
use crate::model::{Playlist, SimplifiedPlaylist};
use builders::{Sources, TABLE_BUILDERS};
use table::Table;
use views::Views;

/// Build every output table. Either all tables come back or none do.
pub fn transform(simplified_playlists: &[SimplifiedPlaylist], playlists: &[Playlist]) -> Result<Vec<Table>> {
    let views = Views::build(playlists);
    info!(
        items = views.items.len(),
        artists = views.artists.len(),
        "Built flattened views"
    );
    let occurrences: usize = playlists.iter().map(|p| p.tracks.items.len()).sum();
    if occurrences > views.items.len() {
        warn!(
            skipped = occurrences - views.items.len(),
            "Skipped playlist items without a track id"
        );
    }

    let sources = Sources {
        simplified_playlists,
        playlists,
        views: &views,
    };

    TABLE_BUILDERS
        .iter()
        .map(|(name, build)| {
            info!("Creating table {}", name);
            build(&sources)
        })
        .collect()
}
