//! Run options shared by the compiler and the execution engine.

use serde::{Deserialize, Serialize};

use crate::names::SuffixMode;

/// How the run reacts to a failed map computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Register nothing unless every map succeeded.
    #[default]
    Atomic,
    /// Register whatever succeeded and report the rest.
    Partial,
}

/// Knobs for one algebra run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Basename the output map names are derived from.
    pub basename: String,
    pub suffix: SuffixMode,
    /// Worker count for map computation.
    pub nprocs: usize,
    /// Require spatial overlap in addition to the temporal relation
    /// when pairing maps.
    pub spatial_topology: bool,
    /// Register maps whose computation produced only nulls.
    pub register_null: bool,
    /// Snap operand and output extents to the common input granularity.
    pub granularity_sampling: bool,
    /// Compile and report the plan without computing anything.
    pub dry_run: bool,
    /// Replace output maps that are already registered.
    pub overwrite: bool,
    pub error_policy: ErrorPolicy,
}

impl Options {
    pub fn new(basename: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            suffix: SuffixMode::default(),
            nprocs: 1,
            spatial_topology: false,
            register_null: false,
            granularity_sampling: false,
            dry_run: false,
            overwrite: false,
            error_policy: ErrorPolicy::default(),
        }
    }
}
