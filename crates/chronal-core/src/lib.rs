//! Core temporal data model for the chronal algebra engine.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//! timestamps, temporal extents and the Allen-style relations between
//! them, sampling granularities, map descriptors and space-time
//! datasets, plus the catalog boundary behind which map registration
//! records are persisted.

pub mod catalog;
pub mod dataset;
pub mod extent;
pub mod granularity;
pub mod map;
pub mod relation;
pub mod time;

pub use catalog::{Catalog, CatalogError, MemoryCatalog};
pub use dataset::{DatasetKind, DatasetMetadata, SpaceTimeDataset};
pub use extent::TemporalExtent;
pub use granularity::Granularity;
pub use map::{MapDescriptor, SpatialExtent};
pub use relation::TemporalRelation;
pub use time::{TemporalType, TimeStamp};
