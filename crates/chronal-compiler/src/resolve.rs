//! Temporal relation resolution: pairing two map series.
//!
//! Both operand series arrive sorted by start time, so resolution is a
//! merge scan rather than a full cross product: for every left item the
//! scan keeps a moving lower bound over the right series and stops as
//! soon as right starts pass the left end.

use std::cmp::Ordering;

use chronal_core::{SpatialExtent, TemporalExtent, TemporalRelation, TimeStamp};
use chronal_parser::ast::ExtentPolicy;

/// One operand map inside the compiler: the calc fragment that
/// computes it plus bookkeeping for the plan it will end up in.
#[derive(Debug, Clone)]
pub struct SeriesItem {
    /// Fragment to splice into enclosing expressions: a bare map id
    /// for leaves, a parenthesized expression for compound items.
    pub fragment: String,
    pub extent: TemporalExtent,
    pub spatial: Option<SpatialExtent>,
    /// Concrete maps the fragment reads.
    pub inputs: Vec<String>,
    /// Intermediate maps the fragment reads.
    pub deps: Vec<String>,
    /// Compound items came out of an operator and must be materialized
    /// as intermediate maps before another operator can consume them.
    pub compound: bool,
}

/// A left item paired with every right item it relates to. Each match
/// records which requested relation fired; when several hold, the
/// first one in the requested order wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPair {
    pub left: usize,
    pub matches: Vec<(usize, TemporalRelation)>,
}

fn ts_lt(a: TimeStamp, b: TimeStamp) -> bool {
    a.partial_cmp(&b) == Some(Ordering::Less)
}

fn ts_gt(a: TimeStamp, b: TimeStamp) -> bool {
    a.partial_cmp(&b) == Some(Ordering::Greater)
}

/// Footprints are only compared when both sides have one; a map
/// without spatial metadata passes the filter.
fn spatial_pass(l: &SeriesItem, r: &SeriesItem) -> bool {
    match (&l.spatial, &r.spatial) {
        (Some(a), Some(b)) => a.overlaps(b),
        _ => true,
    }
}

/// Pair every left item with the right items it relates to under any
/// of the requested relations.
pub fn resolve_pairs(
    left: &[SeriesItem],
    right: &[SeriesItem],
    relations: &[TemporalRelation],
    spatial: bool,
) -> Vec<ResolvedPair> {
    let mut pairs = Vec::with_capacity(left.len());
    let mut lo = 0usize;
    for (li, l) in left.iter().enumerate() {
        // Right maps that ended strictly before this left start can
        // never relate to it or to any later left. `follows` compares
        // against the right end, so equal ends stay in range.
        while lo < right.len() && ts_lt(right[lo].extent.end_or_start(), l.extent.start) {
            lo += 1;
        }
        let mut matches = Vec::new();
        for (off, r) in right[lo..].iter().enumerate() {
            if ts_gt(r.extent.start, l.extent.end_or_start()) {
                break;
            }
            if spatial && !spatial_pass(l, r) {
                continue;
            }
            if let Some(rel) = relations
                .iter()
                .copied()
                .find(|rel| l.extent.relates(*rel, &r.extent))
            {
                matches.push((lo + off, rel));
            }
        }
        pairs.push(ResolvedPair { left: li, matches });
    }
    pairs
}

/// Extent the combined map inherits.
///
/// By topology: `equal` keeps the shared extent, `during` keeps the
/// containing right side, `contains` the containing left side, and
/// everything else takes the union. A side marker from the relation
/// block overrides this. Returns `None` when an intersection policy
/// meets disjoint extents; such pairs drop out of the plan.
pub fn derive_extent(
    l: &TemporalExtent,
    relation: TemporalRelation,
    r: &TemporalExtent,
    policy: Option<ExtentPolicy>,
) -> Option<TemporalExtent> {
    match policy {
        Some(ExtentPolicy::Left) => Some(*l),
        Some(ExtentPolicy::Right) => Some(*r),
        Some(ExtentPolicy::Union) => Some(l.union(r)),
        Some(ExtentPolicy::Intersection) => l.intersection(r),
        None => Some(match relation {
            TemporalRelation::Equal => *l,
            TemporalRelation::During => *r,
            TemporalRelation::Contains => *l,
            _ => l.union(r),
        }),
    }
}
