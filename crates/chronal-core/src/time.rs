//! Timestamps and temporal types.
//!
//! A space-time dataset is stamped either in absolute calendar time or
//! in relative numeric time. The two systems never mix within one
//! operation, so `TimeStamp` comparison across kinds yields `None`
//! rather than an arbitrary ordering.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Temporal type of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalType {
    /// Calendar time (`2001-01-01 00:00:00`).
    Absolute,
    /// Numeric time in a dataset-defined unit.
    Relative,
}

impl fmt::Display for TemporalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalType::Absolute => write!(f, "absolute"),
            TemporalType::Relative => write!(f, "relative"),
        }
    }
}

/// A single point in time, absolute or relative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimeStamp {
    Absolute(NaiveDateTime),
    Relative(i64),
}

impl TimeStamp {
    /// The temporal type this stamp belongs to.
    pub fn temporal_type(&self) -> TemporalType {
        match self {
            TimeStamp::Absolute(_) => TemporalType::Absolute,
            TimeStamp::Relative(_) => TemporalType::Relative,
        }
    }
}

impl PartialOrd for TimeStamp {
    /// Ordering is only defined within one temporal type.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (TimeStamp::Absolute(a), TimeStamp::Absolute(b)) => a.partial_cmp(b),
            (TimeStamp::Relative(a), TimeStamp::Relative(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeStamp::Absolute(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            TimeStamp::Relative(n) => write!(f, "{n}"),
        }
    }
}
