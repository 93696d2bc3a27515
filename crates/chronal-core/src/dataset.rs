//! Space-time datasets.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::extent::TemporalExtent;
use crate::granularity::Granularity;
use crate::map::MapDescriptor;
use crate::time::TemporalType;

/// Kind of the map series a dataset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Raster2d,
    Raster3d,
    Vector,
}

/// Aggregate metadata recomputed from the registered maps.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub map_count: usize,
}

/// A named, time-ordered collection of maps sharing one temporal type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceTimeDataset {
    /// Fully qualified name, `name@mapset`.
    pub name: String,
    pub kind: DatasetKind,
    pub temporal_type: TemporalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
    #[serde(default = "default_semantic_type")]
    pub semantic_type: String,
    maps: Vec<MapDescriptor>,
    #[serde(default)]
    pub metadata: DatasetMetadata,
}

fn default_semantic_type() -> String {
    "mean".to_string()
}

/// Chronological order by start time, id as tie-break so sorting is
/// total even for equal stamps.
fn start_order(a: &MapDescriptor, b: &MapDescriptor) -> Ordering {
    a.extent
        .start
        .partial_cmp(&b.extent.start)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

impl SpaceTimeDataset {
    pub fn new(name: impl Into<String>, kind: DatasetKind, temporal_type: TemporalType) -> Self {
        Self {
            name: name.into(),
            kind,
            temporal_type,
            granularity: None,
            semantic_type: default_semantic_type(),
            maps: Vec::new(),
            metadata: DatasetMetadata::default(),
        }
    }

    /// Registered maps in chronological order.
    pub fn maps(&self) -> &[MapDescriptor] {
        &self.maps
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Register a map, keeping chronological order. Registration is
    /// idempotent on the map id; re-registering returns `false`.
    pub fn register_map(&mut self, map: MapDescriptor) -> bool {
        if self.maps.iter().any(|m| m.id == map.id) {
            return false;
        }
        let pos = self
            .maps
            .partition_point(|m| start_order(m, &map) != Ordering::Greater);
        self.maps.insert(pos, map);
        true
    }

    /// Remove a map registration by id. Returns `false` when no such
    /// map was registered.
    pub fn unregister_map(&mut self, id: &str) -> bool {
        let len = self.maps.len();
        self.maps.retain(|m| m.id != id);
        self.maps.len() != len
    }

    /// Recompute aggregate metadata and the observed granularity from
    /// the registered maps. The declared granularity is kept when the
    /// maps expose no measurable delta.
    pub fn update_from_registered_maps(&mut self) {
        let extents: Vec<TemporalExtent> = self.maps.iter().map(|m| m.extent).collect();
        if let Some(g) = Granularity::from_extents(&extents) {
            self.granularity = Some(g);
        }
        let mut min = None;
        let mut max = None;
        for map in &self.maps {
            min = match (min, map.min) {
                (None, v) => v,
                (v, None) => v,
                (Some(a), Some(b)) => Some(f64::min(a, b)),
            };
            max = match (max, map.max) {
                (None, v) => v,
                (v, None) => v,
                (Some(a), Some(b)) => Some(f64::max(a, b)),
            };
        }
        self.metadata = DatasetMetadata {
            min,
            max,
            map_count: self.maps.len(),
        };
    }
}
