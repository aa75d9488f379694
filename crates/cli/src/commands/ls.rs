use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use photoatlas_core::domain::PhotoRecord;
use photoatlas_core::Atlas;

pub fn run(atlas: &Atlas, album: Option<String>) -> Result<()> {
    let mut photos = atlas.photos()?;
    if let Some(filter) = &album {
        photos.retain(|record| record.album.as_deref() == Some(filter.as_str()));
    }

    if photos.is_empty() {
        match album {
            Some(filter) => println!("No photos in album '{filter}'."),
            None => println!("No photos indexed. Run `patlas ingest <dir>` first."),
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("File"),
        Cell::new("Album"),
        Cell::new("Latitude"),
        Cell::new("Longitude"),
        Cell::new("Taken"),
        Cell::new("ID"),
    ]);

    for record in &photos {
        add_photo_row(&mut table, record);
    }

    println!();
    println!("  Photos");
    println!("  ------");
    println!("{table}");
    println!();
    println!("  {} photos.", photos.len());
    println!();

    Ok(())
}

fn add_photo_row(table: &mut Table, record: &PhotoRecord) {
    let file = record
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| record.path.display().to_string());
    let album = match &record.album {
        Some(album) => Cell::new(album),
        None => Cell::new("\u{2014}").fg(Color::DarkGrey),
    };
    let taken = match &record.taken_at {
        Some(taken) => Cell::new(taken.format("%Y-%m-%d %H:%M:%S").to_string()),
        None => Cell::new("\u{2014}").fg(Color::DarkGrey),
    };
    table.add_row(vec![
        Cell::new(file),
        album,
        Cell::new(format!("{:.4}", record.lat)),
        Cell::new(format!("{:.4}", record.lon)),
        taken,
        Cell::new(short_id(&record.id)),
    ]);
}

/// First twelve hex digits, plenty to address a photo from the shell.
pub(crate) fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

// ── Tests ───────────────────────────────────────────────────────────────────
