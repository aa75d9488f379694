use anyhow::Result;
use photoatlas_core::Atlas;

pub fn run(atlas: &mut Atlas) -> Result<()> {
    let rebuilt = atlas.rebuild_index()?;
    println!("Rebuilt spatial index: {rebuilt} entries.");
    Ok(())
}
