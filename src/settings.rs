//! User settings: where book files live. Stored as JSON under the
//! platform config directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BooksError, Result};

pub const DATA_FILENAME: &str = "bricbooks.sqlite3";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: PathBuf,
}

fn config_file() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| BooksError::Settings("could not determine config directory".to_string()))?;
    Ok(config_dir.join("bricbooks").join("settings.json"))
}

fn default_data_dir() -> Result<PathBuf> {
    let base = dirs::document_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| BooksError::Settings("could not determine home directory".to_string()))?;
    Ok(base.join("bricbooks"))
}

impl Settings {
    pub fn load() -> Result<Self> {
        let path = config_file()?;
        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)
                .map_err(|e| BooksError::Settings(format!("could not parse {}: {e}", path.display())))
        } else {
            Ok(Settings {
                data_dir: default_data_dir()?,
            })
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = config_file()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| BooksError::Settings(e.to_string()))?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// The book file to operate on: an explicit --file path wins, otherwise
    /// the default file in the data directory (created on first use).
    pub fn resolve_book_path(&self, file: Option<&Path>) -> Result<PathBuf> {
        if let Some(file) = file {
            return Ok(file.to_path_buf());
        }
        fs::create_dir_all(&self.data_dir)?;
        Ok(self.data_dir.join(DATA_FILENAME))
    }
}
