mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use photoatlas_core::extract::FileExifSource;
use photoatlas_core::Atlas;

/// PhotoAtlas, a geotag index and map query engine for photo folders
#[derive(Parser)]
#[command(name = "patlas", version, about)]
struct Cli {
    /// Path to the index database
    #[arg(long, default_value_t = default_index_path())]
    index: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a directory and index every geotagged photo in it
    Ingest {
        /// Path to the photo directory
        dir: PathBuf,
        /// Use the built-in EXIF reader even when exiftool is installed
        #[arg(long)]
        builtin: bool,
    },
    /// Remove every indexed photo under a directory
    Rm {
        /// Path to the ingested directory
        dir: PathBuf,
    },
    /// List indexed photos
    Ls {
        /// Only photos from this album
        #[arg(long)]
        album: Option<String>,
    },
    /// List markers inside a bounding box
    Markers {
        /// Southern edge in decimal degrees
        south: f64,
        /// Western edge in decimal degrees
        west: f64,
        /// Northern edge in decimal degrees
        north: f64,
        /// Eastern edge in decimal degrees (smaller than west crosses the antimeridian)
        east: f64,
    },
    /// Show one photo's record and payload details
    Inspect {
        /// Photo identity, or a unique prefix of it
        id: String,
    },
    /// Show index status summary
    Status,
    /// Rebuild the spatial index from the stored records
    Reindex,
}

fn default_index_path() -> String {
    dirs_path().to_string_lossy().to_string()
}

fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".photoatlas").join("atlas.db")
}

/// Only a plain ingest run wants the best extractor on this machine; every
/// other command opens the index without probing for exiftool.
fn uses_detected_source(command: &Commands) -> bool {
    matches!(command, Commands::Ingest { builtin: false, .. })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let index_path = PathBuf::from(&cli.index);

    let mut atlas = if uses_detected_source(&cli.command) {
        Atlas::open(&index_path)?
    } else {
        Atlas::open_with_source(&index_path, Box::new(FileExifSource::new()))?
    };

    match cli.command {
        Commands::Ingest { dir, .. } => commands::ingest::run(&mut atlas, dir)?,
        Commands::Rm { dir } => commands::rm::run(&mut atlas, dir)?,
        Commands::Ls { album } => commands::ls::run(&atlas, album)?,
        Commands::Markers {
            south,
            west,
            north,
            east,
        } => commands::markers::run(&atlas, south, west, north, east)?,
        Commands::Inspect { id } => commands::inspect::run(&atlas, &id)?,
        Commands::Status => commands::status::run(&atlas)?,
        Commands::Reindex => commands::reindex::run(&mut atlas)?,
    }

    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
