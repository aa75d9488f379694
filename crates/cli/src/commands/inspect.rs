use anyhow::Result;
use photoatlas_core::error::Error;
use photoatlas_core::Atlas;

use super::status::format_size;

pub fn run(atlas: &Atlas, id: &str) -> Result<()> {
    let record = match atlas.get(id) {
        Ok(record) => record,
        Err(Error::PhotoNotFound(_)) => {
            // `ls` prints shortened ids, so fall back to a prefix match.
            let mut matches: Vec<_> = atlas
                .photos()?
                .into_iter()
                .filter(|record| record.id.starts_with(id))
                .collect();
            if matches.len() > 1 {
                anyhow::bail!("id '{id}' is ambiguous ({} matches)", matches.len());
            }
            match matches.pop() {
                Some(record) => record,
                None => anyhow::bail!("no photo matches id '{id}'"),
            }
        }
        Err(err) => return Err(err.into()),
    };

    println!();
    println!("  Path:       {}", record.path.display());
    println!("  Identity:   {}", record.id);
    println!("  Latitude:   {:.6}", record.lat);
    println!("  Longitude:  {:.6}", record.lon);
    match record.altitude {
        Some(altitude) => println!("  Altitude:   {altitude:.1} m"),
        None => println!("  Altitude:   unknown"),
    }
    match record.taken_at {
        Some(taken) => println!("  Taken:      {}", taken.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("  Taken:      unknown"),
    }
    match &record.album {
        Some(album) => println!("  Album:      {album}"),
        None => println!("  Album:      none"),
    }
    match atlas.photo_bytes(&record.id) {
        Ok((bytes, mime)) => println!(
            "  Payload:    {} ({mime})",
            format_size(bytes.len() as u64)
        ),
        Err(err) => println!("  Payload:    unavailable ({err})"),
    }
    println!();

    Ok(())
}
