//! Run reporting.

use serde::Serialize;

/// Outcome of one algebra run.
///
/// Per-map computation failures land here rather than in an error so
/// partial-policy runs can finish and report everything at once.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Final output names the plan calls for, in chronological order.
    /// Filled on dry runs too.
    pub outputs: Vec<String>,
    /// Maps actually computed, intermediates included.
    pub computed: Vec<String>,
    /// Maps registered in the target dataset.
    pub registered: Vec<String>,
    /// Outputs skipped because their result was entirely null.
    pub skipped_null: Vec<String>,
    pub failed: Vec<FailedMap>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedMap {
    pub name: String,
    pub error: String,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}
