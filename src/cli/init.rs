use std::path::{Path, PathBuf};

use crate::engine::Engine;
use crate::error::Result;
use crate::settings::Settings;

/// Create the book file, setting up the schema on first open. With
/// --data-dir the choice is remembered in settings for later runs.
pub fn run(file: Option<&Path>, data_dir: Option<PathBuf>) -> Result<()> {
    let mut settings = Settings::load()?;
    if let Some(data_dir) = data_dir {
        settings.data_dir = data_dir;
        settings.save()?;
    }
    let path = settings.resolve_book_path(file)?;
    Engine::open(&path)?;
    println!("Book file ready at {}", path.display());
    Ok(())
}
