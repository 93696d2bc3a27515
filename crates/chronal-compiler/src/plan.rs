//! Compiled plans.

use serde::{Deserialize, Serialize};

use chronal_core::{DatasetKind, Granularity, TemporalExtent, TemporalType};

/// One map the engine must produce: a name, the calc expression that
/// computes it, and the temporal extent it is registered under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMapPlan {
    pub name: String,
    /// Expression handed to the map-calc executor. References concrete
    /// map ids and the names of planned intermediates.
    pub expression: String,
    pub extent: TemporalExtent,
    /// Concrete maps the expression reads.
    pub inputs: Vec<String>,
    /// Planned maps that must be computed before this one runs.
    pub deps: Vec<String>,
    /// Intermediates are computed and consumed inside the run, never
    /// registered in the output dataset.
    pub is_intermediate: bool,
}

/// Everything the execution engine needs for one assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledPlan {
    /// Output dataset name, from the assignment target.
    pub target: String,
    pub kind: DatasetKind,
    pub temporal_type: TemporalType,
    /// Common granularity of the inputs, when they declare one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
    /// Final maps in chronological order; suffix numbering follows
    /// this order.
    pub outputs: Vec<OutputMapPlan>,
    pub intermediates: Vec<OutputMapPlan>,
}

impl CompiledPlan {
    /// All planned maps, intermediates first.
    pub fn all_plans(&self) -> impl Iterator<Item = &OutputMapPlan> {
        self.intermediates.iter().chain(self.outputs.iter())
    }

    /// True when no relation matched and there is nothing to compute.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
