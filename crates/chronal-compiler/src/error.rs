//! Plan-time errors.

use thiserror::Error;

use crate::names::InvalidSuffix;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("space time dataset <{0}> not found")]
    UnknownDataset(String),

    #[error("input datasets mix absolute and relative time")]
    MixedTemporalTypes,

    #[error("input datasets mix map kinds; all inputs must hold the same kind")]
    MixedDatasetKinds,

    #[error("neighbor offsets of <{dataset}> index depth, but the dataset is not 3D")]
    DepthOffsetOn2d { dataset: String },

    #[error("granularity sampling requested but no input dataset declares a granularity")]
    GranularityRequired,

    #[error("output map <{0}> is already registered; use overwrite to replace it")]
    OutputExists(String),

    #[error("expression reduces to a constant, not a map series")]
    ConstantExpression,

    #[error(transparent)]
    Suffix(#[from] InvalidSuffix),
}
