use std::path::Path;

use crate::engine::Engine;
use crate::error::Result;
use crate::export;

pub fn run(engine: &Engine, dir: &Path) -> Result<()> {
    let export_dir = export::export(engine, dir)?;
    println!("Exported to {}", export_dir.display());
    Ok(())
}
