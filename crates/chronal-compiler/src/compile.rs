//! Bottom-up plan compilation.
//!
//! An assignment compiles into a [`CompiledPlan`]: one map plan per
//! output, plus intermediate plans for nested operators. Leaves expand
//! a dataset into its map series, operators pair the operand series by
//! temporal relation and chain the matching maps into one calc
//! expression per output. A nested operator's outputs become
//! intermediate maps, and the operator above reads them by name like
//! any concrete map.

use std::cmp::Ordering;

use indexmap::IndexSet;
use tracing::debug;

use chronal_core::{Catalog, DatasetKind, Granularity, TemporalExtent};
use chronal_parser::ast::{ArithOp, Assignment, Expr, NeighborOffsets, RelationSpec};

use crate::context::CompileContext;
use crate::error::PlanError;
use crate::names;
use crate::options::Options;
use crate::plan::{CompiledPlan, OutputMapPlan};
use crate::resolve::{self, SeriesItem};

/// Compile an assignment into an executable plan.
pub fn compile(
    assignment: &Assignment,
    catalog: &dyn Catalog,
    options: &Options,
) -> Result<CompiledPlan, PlanError> {
    let source = format!("{} = {:?}", assignment.target, assignment.expr);
    let mut compiler = Compiler {
        catalog,
        options,
        ctx: CompileContext::new(&source),
        intermediates: Vec::new(),
        granularity: None,
    };
    compiler.run(assignment)
}

enum Operand {
    Series(Vec<SeriesItem>),
    Number(f64),
}

struct Compiler<'a> {
    catalog: &'a dyn Catalog,
    options: &'a Options,
    ctx: CompileContext,
    intermediates: Vec<OutputMapPlan>,
    granularity: Option<Granularity>,
}

impl Compiler<'_> {
    fn run(&mut self, assignment: &Assignment) -> Result<CompiledPlan, PlanError> {
        let names = assignment.expr.referenced_datasets();
        if names.is_empty() {
            return Err(PlanError::ConstantExpression);
        }

        let mut datasets = Vec::with_capacity(names.len());
        for name in &names {
            let ds = self
                .catalog
                .dataset(name)
                .ok_or_else(|| PlanError::UnknownDataset(name.to_string()))?;
            datasets.push(ds);
        }
        let temporal_type = datasets[0].temporal_type;
        if datasets.iter().any(|ds| ds.temporal_type != temporal_type) {
            return Err(PlanError::MixedTemporalTypes);
        }
        let kind = datasets[0].kind;
        if datasets.iter().any(|ds| ds.kind != kind) {
            return Err(PlanError::MixedDatasetKinds);
        }

        for ds in &datasets {
            if let Some(g) = ds.granularity {
                self.granularity = Some(match self.granularity {
                    None => g,
                    Some(cur) => cur.common(&g).ok_or(PlanError::MixedTemporalTypes)?,
                });
            }
        }
        if self.options.granularity_sampling && self.granularity.is_none() {
            return Err(PlanError::GranularityRequired);
        }

        let mut items = match self.compile_expr(&assignment.expr)? {
            Operand::Series(items) => items,
            Operand::Number(_) => return Err(PlanError::ConstantExpression),
        };

        // Suffix numbering follows chronological order, with the
        // fragment as tie-break so naming is total.
        items.sort_by(|a, b| {
            a.extent
                .start
                .partial_cmp(&b.extent.start)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.fragment.cmp(&b.fragment))
        });

        let existing = self.catalog.dataset(&assignment.target);
        let mut used: IndexSet<String> = IndexSet::new();
        let mut outputs = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let suffix = self
                .options
                .suffix
                .format(i + 1, &item.extent, self.granularity.as_ref());
            let mut name = names::output_name(&self.options.basename, &suffix);
            // Time suffixes can collide when outputs share a start.
            if !used.insert(name.clone()) {
                name = format!("{}_{}", name, i + 1);
                used.insert(name.clone());
            }
            if !self.options.overwrite {
                if let Some(ds) = existing {
                    let taken = ds
                        .maps()
                        .iter()
                        .any(|m| m.id.split('@').next() == Some(name.as_str()));
                    if taken {
                        return Err(PlanError::OutputExists(name));
                    }
                }
            }
            outputs.push(OutputMapPlan {
                name,
                expression: item.fragment,
                extent: item.extent,
                inputs: item.inputs,
                deps: item.deps,
                is_intermediate: false,
            });
        }

        debug!(
            target_dataset = %assignment.target,
            outputs = outputs.len(),
            intermediates = self.intermediates.len(),
            "compiled plan"
        );
        Ok(CompiledPlan {
            target: assignment.target.clone(),
            kind,
            temporal_type,
            granularity: self.granularity,
            outputs,
            intermediates: std::mem::take(&mut self.intermediates),
        })
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<Operand, PlanError> {
        match expr {
            Expr::Number(v) => Ok(Operand::Number(*v)),
            Expr::Identifier(name) => Ok(Operand::Series(self.leaf_series(name, None)?)),
            Expr::Neighbor { base, offsets } => {
                Ok(Operand::Series(self.leaf_series(base, Some(offsets))?))
            }
            Expr::Binary {
                op,
                relation,
                left,
                right,
            } => {
                let l = self.compile_expr(left)?;
                let r = self.compile_expr(right)?;
                self.combine(*op, relation.as_ref(), l, r)
            }
        }
    }

    /// Expand a dataset reference into a series, applying neighbor
    /// offsets. The item at chronological position `i` keeps the
    /// extent of the map at `i` but reads the map at `i + shift`;
    /// positions whose shifted index falls off either end of the
    /// series are skipped.
    fn leaf_series(
        &self,
        name: &str,
        offsets: Option<&NeighborOffsets>,
    ) -> Result<Vec<SeriesItem>, PlanError> {
        let ds = self
            .catalog
            .dataset(name)
            .ok_or_else(|| PlanError::UnknownDataset(name.to_string()))?;
        let (shift, space_index) = match offsets {
            None => (0, None),
            Some(NeighborOffsets::Time(t)) => (*t, None),
            Some(
                off @ NeighborOffsets::Space {
                    row,
                    col,
                    depth,
                    time,
                },
            ) => {
                if off.needs_depth() && ds.kind != DatasetKind::Raster3d {
                    return Err(PlanError::DepthOffsetOn2d {
                        dataset: name.to_string(),
                    });
                }
                let index = match depth {
                    Some(d) => format!("[{row},{col},{d}]"),
                    None => format!("[{row},{col}]"),
                };
                (time.unwrap_or(0), Some(index))
            }
        };

        let maps = ds.maps();
        let mut items = Vec::with_capacity(maps.len());
        for (i, here) in maps.iter().enumerate() {
            let j = i as i64 + shift;
            if j < 0 || j as usize >= maps.len() {
                continue;
            }
            let backing = &maps[j as usize];
            let fragment = match &space_index {
                Some(index) => format!("{}{}", backing.id, index),
                None => backing.id.clone(),
            };
            items.push(SeriesItem {
                fragment,
                extent: self.snapped(here.extent),
                spatial: backing.spatial,
                inputs: vec![backing.id.clone()],
                deps: Vec::new(),
                compound: false,
            });
        }
        Ok(items)
    }

    fn combine(
        &mut self,
        op: ArithOp,
        relation: Option<&RelationSpec>,
        left: Operand,
        right: Operand,
    ) -> Result<Operand, PlanError> {
        match (left, right) {
            (Operand::Number(a), Operand::Number(b)) => Ok(Operand::Number(fold(op, a, b))),
            (Operand::Series(items), Operand::Number(n)) => Ok(Operand::Series(
                items
                    .into_iter()
                    .map(|item| scale(item, op, n, false))
                    .collect(),
            )),
            (Operand::Number(n), Operand::Series(items)) => Ok(Operand::Series(
                items
                    .into_iter()
                    .map(|item| scale(item, op, n, true))
                    .collect(),
            )),
            (Operand::Series(left), Operand::Series(right)) => {
                let left = self.materialize(left);
                let right = self.materialize(right);
                let default = RelationSpec::default_equal();
                let spec = relation.unwrap_or(&default);
                let pairs = resolve::resolve_pairs(
                    &left,
                    &right,
                    &spec.relations,
                    self.options.spatial_topology,
                );

                let mut out = Vec::new();
                for pair in pairs {
                    if pair.matches.is_empty() {
                        continue;
                    }
                    let base = &left[pair.left];
                    let mut fragment = base.fragment.clone();
                    let mut extent = base.extent;
                    let mut inputs = base.inputs.clone();
                    let mut deps = base.deps.clone();
                    let mut dropped = false;
                    // Chain every matching right map into one
                    // expression: ((l op r1) op r2) ...
                    for (ri, rel) in &pair.matches {
                        let r = &right[*ri];
                        match resolve::derive_extent(&extent, *rel, &r.extent, spec.extent) {
                            Some(e) => extent = e,
                            None => {
                                dropped = true;
                                break;
                            }
                        }
                        fragment = format!("({} {} {})", fragment, op.as_str(), r.fragment);
                        merge_unique(&mut inputs, &r.inputs);
                        merge_unique(&mut deps, &r.deps);
                    }
                    if dropped {
                        continue;
                    }
                    out.push(SeriesItem {
                        fragment,
                        extent: self.snapped(extent),
                        spatial: base.spatial,
                        inputs,
                        deps,
                        compound: true,
                    });
                }
                // Inherited extents need not follow left-operand order
                // (`during` and the r/u/i markers take the right side),
                // and an enclosing operator's merge scan requires the
                // series sorted by start.
                out.sort_by(|a, b| {
                    a.extent
                        .start
                        .partial_cmp(&b.extent.start)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.fragment.cmp(&b.fragment))
                });
                Ok(Operand::Series(out))
            }
        }
    }

    /// Turn compound operand items into intermediate map plans. The
    /// operator above then reads each by name like any concrete map.
    fn materialize(&mut self, items: Vec<SeriesItem>) -> Vec<SeriesItem> {
        items
            .into_iter()
            .map(|item| {
                if !item.compound {
                    return item;
                }
                let name = self.ctx.next_virtual_name();
                debug!(map = %name, "planning intermediate map");
                self.intermediates.push(OutputMapPlan {
                    name: name.clone(),
                    expression: item.fragment,
                    extent: item.extent,
                    inputs: item.inputs,
                    deps: item.deps,
                    is_intermediate: true,
                });
                SeriesItem {
                    fragment: name.clone(),
                    extent: item.extent,
                    spatial: item.spatial,
                    inputs: Vec::new(),
                    deps: vec![name],
                    compound: false,
                }
            })
            .collect()
    }

    /// Snap an extent to the common granularity when sampling is on:
    /// starts floor to a boundary, ends round up.
    fn snapped(&self, extent: TemporalExtent) -> TemporalExtent {
        if !self.options.granularity_sampling {
            return extent;
        }
        let Some(gran) = &self.granularity else {
            return extent;
        };
        TemporalExtent {
            start: gran.snap_down(extent.start),
            end: extent.end.map(|e| gran.snap_up(e)),
        }
    }
}

fn fold(op: ArithOp, a: f64, b: f64) -> f64 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Mod => a % b,
    }
}

/// Fold a constant into every item of a series. The result is compound
/// so an enclosing operator materializes it before sampling.
fn scale(item: SeriesItem, op: ArithOp, n: f64, number_left: bool) -> SeriesItem {
    let fragment = if number_left {
        format!("({} {} {})", n, op.as_str(), item.fragment)
    } else {
        format!("({} {} {})", item.fragment, op.as_str(), n)
    };
    SeriesItem {
        fragment,
        compound: true,
        ..item
    }
}

fn merge_unique(into: &mut Vec<String>, from: &[String]) {
    for value in from {
        if !into.contains(value) {
            into.push(value.clone());
        }
    }
}
