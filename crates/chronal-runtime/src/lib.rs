//! Execution engine for compiled algebra plans.
//!
//! Takes a [`chronal_compiler::CompiledPlan`], computes its maps
//! through a [`MapCalcExecutor`] on a bounded worker pool, and
//! registers the results in the catalog. Map computation is the only
//! side-effecting stage; everything before it is pure planning, which
//! is what makes dry runs exact.

pub mod dag;
mod engine;
mod error;
pub mod executor;
mod report;

pub use engine::{run, run_plan};
pub use error::{EngineError, Result};
pub use executor::{ExecutionError, MapCalcExecutor, MapProduct, MockExecutor, ProcessExecutor};
pub use report::{FailedMap, RunReport};
