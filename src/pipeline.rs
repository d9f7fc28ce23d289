//! Extract → transform → load for one category.

use tracing::info;

use crate::db::TableSink;
use crate::error::Result;
use crate::extract::Extractor;
use crate::normalize;
use crate::spotify::{ApiOptions, CatalogApi};

#[derive(Debug)]
pub struct RunSummary {
    pub playlists: usize,
    pub track_occurrences: usize,
    pub tables: Vec<(&'static str, usize)>,
}

impl RunSummary {
    pub fn print(&self) {
        let tables: Vec<String> = self
            .tables
            .iter()
            .map(|(name, rows)| format!("{} {}", rows, name))
            .collect();
        println!(
            "Extracted {} playlists ({} track occurrences). Saved {}.",
            self.playlists,
            self.track_occurrences,
            tables.join(", ")
        );
    }
}

/// Run the whole pipeline. Nothing reaches `sink` unless extraction and every
/// table build succeeded.
pub fn run<A, S>(
    api: &mut A,
    sink: &mut S,
    options: ApiOptions,
    page_limit: u32,
    category_id: &str,
) -> Result<RunSummary>
where
    A: CatalogApi,
    S: TableSink,
{
    let extracted = Extractor::new(api, options, page_limit).extract(category_id)?;
    info!("Finished extraction");

    let tables = normalize::transform(&extracted.simplified_playlists, &extracted.playlists)?;
    info!("Finished transformation");

    sink.store_tables(&tables)?;
    info!("Finished load");

    Ok(RunSummary {
        playlists: extracted.playlists.len(),
        track_occurrences: extracted
            .playlists
            .iter()
            .map(|p| p.tracks.items.len())
            .sum(),
        tables: tables.iter().map(|t| (t.name, t.len())).collect(),
    })
}
