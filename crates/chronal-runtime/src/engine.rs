//! The execution pipeline.
//!
//! A run moves through fixed stages: parse, compile, execute the
//! planned maps level by level on a bounded worker pool, then register
//! the surviving outputs. Dry runs stop after compilation. Within a
//! level jobs run in parallel; results are applied sequentially in
//! plan order, so reports and registration stay deterministic whatever
//! the completion order was.

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use chronal_compiler::{compile, CompiledPlan, ErrorPolicy, Options, OutputMapPlan};
use chronal_core::{Catalog, CatalogError, MapDescriptor, SpaceTimeDataset};
use chronal_parser::parse_expression;

use crate::dag;
use crate::error::EngineError;
use crate::executor::{ExecutionError, MapCalcExecutor, MapProduct};
use crate::report::{FailedMap, RunReport};

type ExecutionResults = IndexMap<String, Result<MapProduct, ExecutionError>>;

/// Parse, compile and run one algebra statement.
#[instrument(skip_all, fields(statement = %statement))]
pub fn run(
    statement: &str,
    catalog: &mut dyn Catalog,
    executor: &dyn MapCalcExecutor,
    options: &Options,
) -> crate::error::Result<RunReport> {
    let assignment = parse_expression(statement)?;
    let plan = compile(&assignment, catalog, options)?;
    run_plan(&plan, catalog, executor, options)
}

/// Run an already-compiled plan.
#[instrument(skip_all, fields(dataset = %plan.target))]
pub fn run_plan(
    plan: &CompiledPlan,
    catalog: &mut dyn Catalog,
    executor: &dyn MapCalcExecutor,
    options: &Options,
) -> crate::error::Result<RunReport> {
    let mut report = RunReport {
        outputs: plan.outputs.iter().map(|p| p.name.clone()).collect(),
        dry_run: options.dry_run,
        ..Default::default()
    };
    if plan.is_empty() {
        info!(dataset = %plan.target, "nothing to compute; no temporal relation matched");
        return Ok(report);
    }
    if options.dry_run {
        return Ok(report);
    }

    let results = execute(plan, executor, options)?;
    for (name, result) in &results {
        match result {
            Ok(_) => report.computed.push(name.clone()),
            Err(e) => report.failed.push(FailedMap {
                name: name.clone(),
                error: e.to_string(),
            }),
        }
    }

    if !report.success() && options.error_policy == ErrorPolicy::Atomic {
        warn!(
            failed = report.failed.len(),
            "aborting atomically; removing computed maps"
        );
        for name in &report.computed {
            remove_quietly(executor, name);
        }
        return Ok(report);
    }

    register(plan, &results, catalog, executor, options, &mut report)?;

    for tmp in &plan.intermediates {
        if matches!(results.get(&tmp.name), Some(Ok(_))) {
            remove_quietly(executor, &tmp.name);
        }
    }
    Ok(report)
}

/// Compute every planned map, level by level.
///
/// Maps whose dependency failed are marked failed without running.
/// Under the atomic policy no further level is submitted once one has
/// failed; maps never attempted stay out of the result set.
fn execute(
    plan: &CompiledPlan,
    executor: &dyn MapCalcExecutor,
    options: &Options,
) -> Result<ExecutionResults, EngineError> {
    let all: Vec<&OutputMapPlan> = plan.all_plans().collect();
    let levels = dag::dependency_levels(&all)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.nprocs.max(1))
        .build()
        .map_err(|e| EngineError::ThreadPool(e.to_string()))?;
    debug!(
        maps = all.len(),
        levels = levels.len(),
        nprocs = options.nprocs.max(1),
        "executing plan"
    );

    let mut results: ExecutionResults = IndexMap::new();
    for level in levels {
        let mut runnable = Vec::with_capacity(level.len());
        let mut blocked_any = false;
        for planned in level {
            let bad_dep = planned
                .deps
                .iter()
                .find(|d| matches!(results.get(d.as_str()), Some(Err(_))));
            if let Some(dep) = bad_dep {
                blocked_any = true;
                results.insert(
                    planned.name.clone(),
                    Err(ExecutionError {
                        message: format!("upstream map <{dep}> failed"),
                    }),
                );
            } else {
                runnable.push(planned);
            }
        }

        let computed: Vec<(String, Result<MapProduct, ExecutionError>)> = pool.install(|| {
            runnable
                .par_iter()
                .map(|planned| {
                    debug!(map = %planned.name, expr = %planned.expression, "computing");
                    (
                        planned.name.clone(),
                        executor.run(&planned.name, &planned.expression),
                    )
                })
                .collect()
        });

        let mut level_failed = blocked_any;
        for (name, result) in computed {
            level_failed |= result.is_err();
            results.insert(name, result);
        }
        if level_failed && options.error_policy == ErrorPolicy::Atomic {
            break;
        }
    }
    Ok(results)
}

/// Register surviving outputs in the target dataset, creating it on
/// first use. Outputs are visited in plan order and the dataset keeps
/// chronological order internally, so registration is independent of
/// completion order.
fn register(
    plan: &CompiledPlan,
    results: &ExecutionResults,
    catalog: &mut dyn Catalog,
    executor: &dyn MapCalcExecutor,
    options: &Options,
    report: &mut RunReport,
) -> Result<(), EngineError> {
    if catalog.dataset(&plan.target).is_none() {
        let mut ds = SpaceTimeDataset::new(plan.target.clone(), plan.kind, plan.temporal_type);
        ds.granularity = plan.granularity;
        catalog.create_dataset(ds)?;
    }
    let ds = catalog
        .dataset_mut(&plan.target)
        .ok_or_else(|| CatalogError::NotFound(plan.target.clone()))?;
    if ds.temporal_type != plan.temporal_type || ds.kind != plan.kind {
        return Err(EngineError::TargetMismatch(plan.target.clone()));
    }
    if ds.granularity.is_none() {
        ds.granularity = plan.granularity;
    }

    for out in &plan.outputs {
        let Some(Ok(product)) = results.get(&out.name) else {
            continue;
        };
        if product.is_null() && !options.register_null {
            debug!(map = %out.name, "skipping all-null result");
            report.skipped_null.push(out.name.clone());
            remove_quietly(executor, &out.name);
            continue;
        }
        if options.overwrite {
            ds.unregister_map(&out.name);
        }
        let mut map = MapDescriptor::new(out.name.clone(), out.extent);
        if let (Some(min), Some(max)) = (product.min, product.max) {
            map = map.with_range(min, max);
        }
        if let Some(spatial) = product.spatial {
            map = map.with_spatial(spatial);
        }
        if ds.register_map(map) {
            report.registered.push(out.name.clone());
        }
    }
    ds.update_from_registered_maps();
    info!(
        dataset = %plan.target,
        registered = report.registered.len(),
        skipped = report.skipped_null.len(),
        "registration complete"
    );
    Ok(())
}

fn remove_quietly(executor: &dyn MapCalcExecutor, name: &str) {
    if let Err(e) = executor.remove(name) {
        warn!(map = %name, error = %e, "failed to remove map");
    }
}
