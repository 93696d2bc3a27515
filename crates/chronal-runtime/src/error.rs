//! Engine errors.
//!
//! Structural problems surface as `Err`: the statement does not parse,
//! the plan cannot be built, or the dependency graph is malformed.
//! Per-map computation failures are data, collected in the run report,
//! so a partial-policy run can keep going.

use thiserror::Error;

use crate::dag::CycleError;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] chronal_parser::ParseError),

    #[error(transparent)]
    Plan(#[from] chronal_compiler::PlanError),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error(transparent)]
    Catalog(#[from] chronal_core::CatalogError),

    #[error("target dataset <{0}> holds a different kind or temporal type")]
    TargetMismatch(String),

    #[error("worker pool: {0}")]
    ThreadPool(String),
}
