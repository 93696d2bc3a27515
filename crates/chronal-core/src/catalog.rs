//! Catalog boundary.
//!
//! The metadata catalog persists dataset and map registration records.
//! The engine only ever talks to this trait; the in-memory
//! implementation backs tests and the stand-alone binary.

use indexmap::IndexMap;
use thiserror::Error;

use crate::dataset::SpaceTimeDataset;

/// Catalog errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("space time dataset <{0}> already exists")]
    AlreadyExists(String),

    #[error("space time dataset <{0}> not found")]
    NotFound(String),
}

/// Persistent store of space-time dataset registration records.
pub trait Catalog {
    fn dataset(&self, name: &str) -> Option<&SpaceTimeDataset>;

    fn dataset_mut(&mut self, name: &str) -> Option<&mut SpaceTimeDataset>;

    fn create_dataset(&mut self, dataset: SpaceTimeDataset) -> Result<(), CatalogError>;

    fn contains(&self, name: &str) -> bool {
        self.dataset(name).is_some()
    }
}

/// In-memory catalog with deterministic iteration order.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    datasets: IndexMap<String, SpaceTimeDataset>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: SpaceTimeDataset) {
        self.datasets.insert(dataset.name.clone(), dataset);
    }

    pub fn datasets(&self) -> impl Iterator<Item = &SpaceTimeDataset> {
        self.datasets.values()
    }
}

impl Catalog for MemoryCatalog {
    fn dataset(&self, name: &str) -> Option<&SpaceTimeDataset> {
        self.datasets.get(name)
    }

    fn dataset_mut(&mut self, name: &str) -> Option<&mut SpaceTimeDataset> {
        self.datasets.get_mut(name)
    }

    fn create_dataset(&mut self, dataset: SpaceTimeDataset) -> Result<(), CatalogError> {
        if self.datasets.contains_key(&dataset.name) {
            return Err(CatalogError::AlreadyExists(dataset.name));
        }
        self.datasets.insert(dataset.name.clone(), dataset);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetKind;
    use crate::time::TemporalType;

    #[test]
    fn create_rejects_duplicates() {
        let mut catalog = MemoryCatalog::new();
        let ds = SpaceTimeDataset::new("out@test", DatasetKind::Raster2d, TemporalType::Relative);
        catalog.create_dataset(ds.clone()).unwrap();
        assert_eq!(
            catalog.create_dataset(ds),
            Err(CatalogError::AlreadyExists("out@test".to_string()))
        );
    }
}
