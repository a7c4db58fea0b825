use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

use catalog_core::{CatalogError, PageCountMap};
use catalog_logging::{catalog_debug, catalog_info, catalog_warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable page counts. Loading never fails; saving reports every failure.
pub trait PageCountStore {
    fn load(&self) -> PageCountMap;
    fn save(&self, counts: &PageCountMap) -> Result<(), CacheError>;
    /// Where the counts live, for messages.
    fn location(&self) -> String;
}

/// Page counts stored as a flat JSON object, `{"section name": pages}`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PageCountStore for JsonFileStore {
    fn load(&self) -> PageCountMap {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                catalog_debug!("no page count cache at {:?}, starting empty", self.path);
                return PageCountMap::new();
            }
            Err(err) => {
                catalog_warn!("failed to read page count cache {:?}: {}", self.path, err);
                return PageCountMap::new();
            }
        };

        match serde_json::from_str::<PageCountMap>(&content) {
            Ok(counts) => {
                catalog_info!("loaded {} cached page counts from {:?}", counts.len(), self.path);
                counts
            }
            Err(err) => {
                catalog_warn!("failed to parse page count cache {:?}: {}", self.path, err);
                PageCountMap::new()
            }
        }
    }

    /// Writes a temp file next to the target and renames it over the target.
    fn save(&self, counts: &PageCountMap) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let content = serde_json::to_string_pretty(counts)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|err| CacheError::Io(err.error))?;

        catalog_info!("stored {} page counts in {:?}", counts.len(), self.path);
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Saves `counts`, turning a failure into the run-level error.
pub fn flush_page_counts(
    store: &dyn PageCountStore,
    counts: &PageCountMap,
) -> Result<(), CatalogError> {
    store.save(counts).map_err(|err| CatalogError::CacheWrite {
        path: store.location(),
        message: err.to_string(),
    })
}
