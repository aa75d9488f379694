use anyhow::Result;
use photoatlas_core::domain::BoundingBox;
use photoatlas_core::Atlas;

pub fn run(atlas: &Atlas) -> Result<()> {
    let stats = atlas.status()?;

    println!();
    println!("  PhotoAtlas Status");
    println!("  =================");
    println!();
    println!("  Photos:    {:>8}", stats.total_photos);
    println!("  Albums:    {:>8}", stats.total_albums);
    println!("  Extent:    {}", format_extent(stats.extent.as_ref()));
    println!("  Centroid:  {}", format_centroid(stats.centroid));
    println!();
    println!("  Run 'patlas ls' to show the full photo table.");
    println!();

    Ok(())
}

// ── Formatting helpers ──────────────────────────────────────────────────────

pub(crate) fn format_coord(lat: f64, lon: f64) -> String {
    format!("({lat:.4}, {lon:.4})")
}

pub(crate) fn format_extent(extent: Option<&BoundingBox>) -> String {
    match extent {
        Some(bbox) => format!(
            "{} to {}",
            format_coord(bbox.south, bbox.west),
            format_coord(bbox.north, bbox.east)
        ),
        None => "empty".to_string(),
    }
}

pub(crate) fn format_centroid(centroid: Option<(f64, f64)>) -> String {
    match centroid {
        Some((lat, lon)) => format_coord(lat, lon),
        None => "empty".to_string(),
    }
}

pub(crate) fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.1} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
