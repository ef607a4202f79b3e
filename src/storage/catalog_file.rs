use crate::catalog::Catalog;
use crate::storage::traits::{CatalogStore, StorageResult};
use crate::storage::write_atomic;
use std::path::{Path, PathBuf};

/// Catalog persisted as a single JSON document
#[derive(Debug, Clone)]
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogStore for JsonCatalogStore {
    fn load(&self) -> StorageResult<Catalog> {
        if !self.path.exists() {
            tracing::info!(
                "Catalog {} does not exist yet, starting empty",
                self.path.display()
            );
            return Ok(Catalog::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let catalog = Catalog::from_json_str(&content)?;
        tracing::info!(
            "Loaded {} entities from {}",
            catalog.len(),
            self.path.display()
        );
        Ok(catalog)
    }

    fn save(&self, catalog: &Catalog) -> StorageResult<()> {
        let content = catalog.to_json_string()?;
        write_atomic(&self.path, content.as_bytes())?;
        tracing::debug!(
            "Saved {} entities to {}",
            catalog.len(),
            self.path.display()
        );
        Ok(())
    }
}
