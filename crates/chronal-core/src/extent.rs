//! Temporal extents and the interval relations between them.
//!
//! Relations follow Allen and Ferguson's interval temporal logic. A
//! map either covers a half-open interval `[start, end)` or a single
//! instant (`end` absent). Instant edge cases mirror the reference
//! behavior of the temporal framework this engine replaces: an instant
//! can lie `during` an interval, two instants are `equal` when their
//! start times coincide, and the start/finish relations require two
//! real intervals.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::relation::TemporalRelation;
use crate::time::TimeStamp;

/// Temporal extent of a map: an instant or a half-open interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub start: TimeStamp,
    pub end: Option<TimeStamp>,
}

fn lt(a: TimeStamp, b: TimeStamp) -> bool {
    a.partial_cmp(&b) == Some(Ordering::Less)
}

fn gt(a: TimeStamp, b: TimeStamp) -> bool {
    a.partial_cmp(&b) == Some(Ordering::Greater)
}

fn eq(a: TimeStamp, b: TimeStamp) -> bool {
    a.partial_cmp(&b) == Some(Ordering::Equal)
}

fn ge(a: TimeStamp, b: TimeStamp) -> bool {
    matches!(
        a.partial_cmp(&b),
        Some(Ordering::Greater) | Some(Ordering::Equal)
    )
}

fn min_ts(a: TimeStamp, b: TimeStamp) -> TimeStamp {
    if lt(b, a) {
        b
    } else {
        a
    }
}

fn max_ts(a: TimeStamp, b: TimeStamp) -> TimeStamp {
    if gt(b, a) {
        b
    } else {
        a
    }
}

impl TemporalExtent {
    /// An extent covering `[start, end)`.
    pub fn interval(start: TimeStamp, end: TimeStamp) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// An extent covering a single instant.
    pub fn instant(start: TimeStamp) -> Self {
        Self { start, end: None }
    }

    /// True when this extent is a single instant.
    pub fn is_instant(&self) -> bool {
        self.end.is_none()
    }

    /// The end of the extent, falling back to the start for instants.
    pub fn end_or_start(&self) -> TimeStamp {
        self.end.unwrap_or(self.start)
    }

    /// Check a single named relation between `self` (A) and `other` (B).
    pub fn relates(&self, relation: TemporalRelation, other: &TemporalExtent) -> bool {
        use TemporalRelation::*;
        match relation {
            Equal => self.equal(other),
            Follows => self.follows(other),
            Precedes => self.precedes(other),
            During => self.during(other),
            Contains => self.contains(other),
            Overlaps => self.overlaps(other),
            Overlapped => self.overlapped(other),
            Starts => self.starts(other),
            Started => self.started(other),
            Finishes => self.finishes(other),
            Finished => self.finished(other),
        }
    }

    /// A and B cover exactly the same time.
    pub fn equal(&self, other: &TemporalExtent) -> bool {
        match (self.end, other.end) {
            (None, None) => eq(self.start, other.start),
            (Some(ea), Some(eb)) => eq(self.start, other.start) && eq(ea, eb),
            _ => false,
        }
    }

    /// A starts exactly where B ends.
    pub fn follows(&self, other: &TemporalExtent) -> bool {
        match other.end {
            Some(eb) => eq(self.start, eb),
            None => false,
        }
    }

    /// A ends exactly where B starts.
    pub fn precedes(&self, other: &TemporalExtent) -> bool {
        match self.end {
            Some(ea) => eq(ea, other.start),
            None => false,
        }
    }

    /// A lies strictly inside B. An instant A lies during B when it
    /// falls within `[B.start, B.end)`.
    pub fn during(&self, other: &TemporalExtent) -> bool {
        let eb = match other.end {
            Some(eb) => eb,
            None => return false,
        };
        match self.end {
            None => ge(self.start, other.start) && lt(self.start, eb),
            Some(ea) => gt(self.start, other.start) && lt(ea, eb),
        }
    }

    /// B lies strictly inside A.
    pub fn contains(&self, other: &TemporalExtent) -> bool {
        let ea = match self.end {
            Some(ea) => ea,
            None => return false,
        };
        match other.end {
            None => {
                matches!(
                    self.start.partial_cmp(&other.start),
                    Some(Ordering::Less) | Some(Ordering::Equal)
                ) && gt(ea, other.start)
            }
            Some(eb) => lt(self.start, other.start) && gt(ea, eb),
        }
    }

    /// A overlaps the beginning of B.
    pub fn overlaps(&self, other: &TemporalExtent) -> bool {
        match (self.end, other.end) {
            (Some(ea), Some(eb)) => {
                lt(self.start, other.start) && lt(ea, eb) && gt(ea, other.start)
            }
            _ => false,
        }
    }

    /// A overlaps the end of B.
    pub fn overlapped(&self, other: &TemporalExtent) -> bool {
        match (self.end, other.end) {
            (Some(ea), Some(eb)) => {
                gt(self.start, other.start) && gt(ea, eb) && lt(self.start, eb)
            }
            _ => false,
        }
    }

    /// A and B start together, A finishes first.
    pub fn starts(&self, other: &TemporalExtent) -> bool {
        match (self.end, other.end) {
            (Some(ea), Some(eb)) => eq(self.start, other.start) && lt(ea, eb),
            _ => false,
        }
    }

    /// A and B start together, A finishes last.
    pub fn started(&self, other: &TemporalExtent) -> bool {
        match (self.end, other.end) {
            (Some(ea), Some(eb)) => eq(self.start, other.start) && gt(ea, eb),
            _ => false,
        }
    }

    /// A and B finish together, A starts last.
    pub fn finishes(&self, other: &TemporalExtent) -> bool {
        match (self.end, other.end) {
            (Some(ea), Some(eb)) => eq(ea, eb) && gt(self.start, other.start),
            _ => false,
        }
    }

    /// A and B finish together, A starts first.
    pub fn finished(&self, other: &TemporalExtent) -> bool {
        match (self.end, other.end) {
            (Some(ea), Some(eb)) => eq(ea, eb) && lt(self.start, other.start),
            _ => false,
        }
    }

    /// Union of two extents: `[min(start), max(end))`.
    ///
    /// The union of two equal instants stays an instant.
    pub fn union(&self, other: &TemporalExtent) -> TemporalExtent {
        if self.is_instant() && other.is_instant() && eq(self.start, other.start) {
            return *self;
        }
        let start = min_ts(self.start, other.start);
        let end = max_ts(self.end_or_start(), other.end_or_start());
        TemporalExtent::interval(start, end)
    }

    /// Intersection of two extents, `None` when they share no time.
    pub fn intersection(&self, other: &TemporalExtent) -> Option<TemporalExtent> {
        let start = max_ts(self.start, other.start);
        let end = min_ts(self.end_or_start(), other.end_or_start());
        match start.partial_cmp(&end) {
            Some(Ordering::Less) => Some(TemporalExtent::interval(start, end)),
            Some(Ordering::Equal) => Some(TemporalExtent::instant(start)),
            _ => None,
        }
    }
}

impl fmt::Display for TemporalExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{} .. {})", self.start, end),
            None => write!(f, "[{}]", self.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: i64, end: i64) -> TemporalExtent {
        TemporalExtent::interval(TimeStamp::Relative(start), TimeStamp::Relative(end))
    }

    fn at(t: i64) -> TemporalExtent {
        TemporalExtent::instant(TimeStamp::Relative(t))
    }

    #[test]
    fn equal_relation() {
        assert!(iv(5, 6).equal(&iv(5, 6)));
        assert!(!iv(5, 6).equal(&iv(5, 7)));
        assert!(at(5).equal(&at(5)));
        assert!(!at(5).equal(&iv(5, 6)));
    }

    #[test]
    fn during_and_contains() {
        assert!(iv(5, 7).during(&iv(4, 9)));
        assert!(!iv(4, 9).during(&iv(5, 7)));
        assert!(iv(4, 9).contains(&iv(5, 8)));
        // Instant inside an interval, including the closed start.
        assert!(at(4).during(&iv(4, 9)));
        assert!(at(5).during(&iv(4, 9)));
        assert!(!at(9).during(&iv(4, 9)));
        assert!(iv(4, 9).contains(&at(5)));
    }

    #[test]
    fn shared_endpoints_are_starts_finishes_not_during() {
        assert!(iv(5, 6).starts(&iv(5, 7)));
        assert!(iv(5, 7).started(&iv(5, 6)));
        assert!(iv(6, 7).finishes(&iv(5, 7)));
        assert!(iv(5, 7).finished(&iv(6, 7)));
        assert!(!iv(5, 6).during(&iv(5, 7)));
    }

    #[test]
    fn overlap_relations() {
        assert!(iv(5, 7).overlaps(&iv(6, 8)));
        assert!(!iv(5, 6).overlaps(&iv(6, 8)));
        assert!(iv(6, 8).overlapped(&iv(5, 7)));
        assert!(!iv(6, 8).overlapped(&iv(5, 6)));
    }

    #[test]
    fn meets_relations() {
        assert!(iv(5, 7).precedes(&iv(7, 9)));
        assert!(iv(7, 9).follows(&iv(5, 7)));
        assert!(!iv(5, 7).precedes(&iv(8, 9)));
    }

    #[test]
    fn union_and_intersection() {
        assert_eq!(iv(1, 3).union(&iv(2, 5)), iv(1, 5));
        assert_eq!(iv(1, 3).intersection(&iv(2, 5)), Some(iv(2, 3)));
        assert_eq!(iv(1, 2).intersection(&iv(3, 5)), None);
        assert_eq!(iv(1, 2).intersection(&iv(2, 5)), Some(at(2)));
        assert_eq!(at(4).union(&at(4)), at(4));
    }
}
