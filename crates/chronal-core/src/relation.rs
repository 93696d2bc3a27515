//! Temporal relation names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An Allen-style relation between two temporal extents.
///
/// Used purely as a predicate during pair resolution; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalRelation {
    Equal,
    Follows,
    Precedes,
    Overlaps,
    Overlapped,
    During,
    Contains,
    Starts,
    Started,
    Finishes,
    Finished,
}

impl TemporalRelation {
    /// Every relation this engine knows, in canonical order.
    pub const ALL: [TemporalRelation; 11] = [
        TemporalRelation::Equal,
        TemporalRelation::Follows,
        TemporalRelation::Precedes,
        TemporalRelation::Overlaps,
        TemporalRelation::Overlapped,
        TemporalRelation::During,
        TemporalRelation::Contains,
        TemporalRelation::Starts,
        TemporalRelation::Started,
        TemporalRelation::Finishes,
        TemporalRelation::Finished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemporalRelation::Equal => "equal",
            TemporalRelation::Follows => "follows",
            TemporalRelation::Precedes => "precedes",
            TemporalRelation::Overlaps => "overlaps",
            TemporalRelation::Overlapped => "overlapped",
            TemporalRelation::During => "during",
            TemporalRelation::Contains => "contains",
            TemporalRelation::Starts => "starts",
            TemporalRelation::Started => "started",
            TemporalRelation::Finishes => "finishes",
            TemporalRelation::Finished => "finished",
        }
    }
}

impl fmt::Display for TemporalRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized relation keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown temporal relation '{0}'")]
pub struct UnknownRelation(pub String);

impl FromStr for TemporalRelation {
    type Err = UnknownRelation;

    /// Case-insensitive; `equivalent` is accepted as an alias of `equal`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "equal" | "equivalent" => Ok(TemporalRelation::Equal),
            "follows" => Ok(TemporalRelation::Follows),
            "precedes" => Ok(TemporalRelation::Precedes),
            "overlaps" => Ok(TemporalRelation::Overlaps),
            "overlapped" => Ok(TemporalRelation::Overlapped),
            "during" => Ok(TemporalRelation::During),
            "contains" => Ok(TemporalRelation::Contains),
            "starts" => Ok(TemporalRelation::Starts),
            "started" => Ok(TemporalRelation::Started),
            "finishes" => Ok(TemporalRelation::Finishes),
            "finished" => Ok(TemporalRelation::Finished),
            _ => Err(UnknownRelation(s.to_string())),
        }
    }
}
