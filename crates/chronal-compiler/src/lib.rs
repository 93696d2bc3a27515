//! Plan compilation for the chronal algebra engine.
//!
//! Turns a parsed assignment plus a catalog of registered datasets
//! into a [`CompiledPlan`]: the list of output maps to compute, the
//! intermediate maps nested operators require, and the calc
//! expressions and dependency edges between them. The plan is pure
//! data; nothing is computed until the execution engine picks it up.

mod compile;
mod context;
mod error;
pub mod names;
mod options;
pub mod plan;
pub mod resolve;

pub use compile::compile;
pub use error::PlanError;
pub use names::SuffixMode;
pub use options::{ErrorPolicy, Options};
pub use plan::{CompiledPlan, OutputMapPlan};
