mod config;
mod db;
mod error;
mod extract;
mod model;
mod normalize;
mod paginate;
mod pipeline;
mod spotify;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::Settings;
use crate::db::SqliteSink;
use crate::spotify::SpotifyClient;

#[derive(Parser)]
#[command(
    name = "spotify_category_etl",
    about = "Extract a Spotify category's playlists into relational tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, normalize and store every playlist in a category
    Run {
        /// Category id (e.g. "latin"); overrides SPOTIFY_CATEGORY_ID
        #[arg(short, long)]
        category: Option<String>,
        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
        /// ISO 3166-1 alpha-2 country for the category listing
        #[arg(long)]
        country: Option<String>,
        /// Market for playlist and track requests
        #[arg(long)]
        market: Option<String>,
    },
    /// Show the row counts of the most recent load
    Stats {
        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    let result = match cli.command {
        Commands::Run {
            category,
            db,
            country,
            market,
        } => {
            if let Some(c) = category {
                settings.category_id = c;
            }
            if let Some(p) = db {
                settings.db_path = p;
            }
            if country.is_some() {
                settings.country = country;
            }
            if market.is_some() {
                settings.market = market;
            }
            run(&settings)
        }
        Commands::Stats { db } => {
            if let Some(p) = db {
                settings.db_path = p;
            }
            stats(&settings)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn run(settings: &Settings) -> anyhow::Result<()> {
    settings.check_credentials();

    let mut client = SpotifyClient::from_settings(settings)?;
    client.authenticate()?;
    info!("Spotify client authenticated successfully");

    let conn = db::connect(&settings.db_path)?;
    let run_id = chrono::Utc::now().to_rfc3339();
    let mut sink = SqliteSink::new(conn, run_id, settings.category_id.as_str())?;

    println!(
        "Extracting category '{}' into {:?}...",
        settings.category_id, settings.db_path
    );
    let summary = pipeline::run(
        &mut client,
        &mut sink,
        settings.api_options(),
        settings.page_limit,
        &settings.category_id,
    )?;
    summary.print();
    info!("Finished successfully");
    Ok(())
}

fn stats(settings: &Settings) -> anyhow::Result<()> {
    let conn = db::connect(&settings.db_path)?;
    match db::latest_run(&conn)? {
        None => println!("No loads recorded in {:?}. Run 'run' first.", settings.db_path),
        Some(run) => {
            println!("Run:      {}", run.run_id);
            println!("Category: {}", run.category_id);
            println!("Loaded:   {}", run.loaded_at);
            for t in &run.tables {
                println!("  {:<28} {:>8}", t.table_name, t.row_count);
            }
        }
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
