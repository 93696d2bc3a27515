//! Concrete map records.

use serde::{Deserialize, Serialize};

use crate::extent::TemporalExtent;

/// Spatial bounding box of a map. `top`/`bottom` only carry meaning
/// for 3D raster maps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub top: f64,
    pub bottom: f64,
}

impl SpatialExtent {
    /// True when the two boxes share any area (2D test; the vertical
    /// axis is only compared when both boxes have height).
    pub fn overlaps(&self, other: &SpatialExtent) -> bool {
        let planar = self.west < other.east
            && self.east > other.west
            && self.south < other.north
            && self.north > other.south;
        let self_flat = self.top == self.bottom;
        let other_flat = other.top == other.bottom;
        if self_flat || other_flat {
            planar
        } else {
            planar && self.bottom < other.top && self.top > other.bottom
        }
    }
}

/// A registered map: backing raster id plus its temporal placement.
///
/// A descriptor is owned by exactly one space-time dataset; other
/// datasets refer to it by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDescriptor {
    /// Fully qualified id, `name@mapset`.
    pub id: String,
    pub extent: TemporalExtent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<SpatialExtent>,
    /// Minimum cell value, absent for all-null maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum cell value, absent for all-null maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl MapDescriptor {
    pub fn new(id: impl Into<String>, extent: TemporalExtent) -> Self {
        Self {
            id: id.into(),
            extent,
            spatial: None,
            min: None,
            max: None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_spatial(mut self, spatial: SpatialExtent) -> Self {
        self.spatial = Some(spatial);
        self
    }

    /// A map with no value range is entirely null.
    pub fn is_null(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}
