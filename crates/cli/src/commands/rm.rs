use std::path::PathBuf;

use anyhow::Result;
use photoatlas_core::Atlas;

pub fn run(atlas: &mut Atlas, dir: PathBuf) -> Result<()> {
    let removed = atlas.remove_root(&dir)?;
    println!(
        "Removed {} ({} photos dropped from the index)",
        dir.display(),
        removed
    );
    Ok(())
}
