use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use photoatlas_core::domain::BoundingBox;
use photoatlas_core::Atlas;

use super::ls::short_id;

pub fn run(atlas: &Atlas, south: f64, west: f64, north: f64, east: f64) -> Result<()> {
    let bbox = BoundingBox::new(south, west, north, east)?;
    let markers = atlas.markers(&bbox)?;

    if markers.is_empty() {
        println!("No photos inside the box.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Latitude"),
        Cell::new("Longitude"),
        Cell::new("File"),
        Cell::new("Album"),
        Cell::new("ID"),
    ]);

    for marker in &markers {
        let file = marker
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| marker.path.display().to_string());
        let album = match &marker.album {
            Some(album) => Cell::new(album),
            None => Cell::new("\u{2014}").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(format!("{:.6}", marker.lat)),
            Cell::new(format!("{:.6}", marker.lon)),
            Cell::new(file),
            album,
            Cell::new(short_id(&marker.id)),
        ]);
    }

    println!();
    println!("  Markers");
    println!("  -------");
    println!("{table}");
    println!();
    println!("  {} markers.", markers.len());
    println!();

    Ok(())
}
