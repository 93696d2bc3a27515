//! chronal-run - evaluates one temporal algebra statement.
//!
//! Loads a catalog of space-time datasets from a JSON file, compiles
//! and runs the statement, prints the run report as JSON, and
//! optionally writes the updated catalog back out.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chronal_compiler::{ErrorPolicy, Options, SuffixMode};
use chronal_core::{MemoryCatalog, SpaceTimeDataset};
use chronal_runtime::{MapCalcExecutor, MockExecutor, ProcessExecutor};

#[derive(Parser, Debug)]
#[command(name = "chronal-run")]
#[command(about = "Run a temporal algebra statement over registered space-time datasets")]
struct Cli {
    /// Statement to evaluate, e.g. 'D = A[-1] + A[1]'
    statement: String,

    /// Basename for the output maps
    basename: String,

    /// Catalog file holding the input datasets (JSON)
    #[arg(long)]
    inputs: PathBuf,

    /// Output map suffix: num, num%N, time or gran
    #[arg(long, default_value = "num%05")]
    suffix: String,

    /// Worker count for map computation
    #[arg(long, default_value = "1")]
    nprocs: usize,

    /// Require spatial overlap in addition to the temporal relation
    #[arg(short = 's', long)]
    spatial: bool,

    /// Register maps whose result is entirely null
    #[arg(short = 'n', long)]
    register_null: bool,

    /// Snap extents to the common input granularity
    #[arg(short = 'g', long)]
    granularity_sampling: bool,

    /// Compile and report the plan without computing anything
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Replace output maps that are already registered
    #[arg(long)]
    overwrite: bool,

    /// Reaction to a failed map computation
    #[arg(long, value_enum, default_value_t = OnError::Atomic)]
    on_error: OnError,

    /// External map calculator, invoked as `<cmd> <args..> <name> <expr>`.
    /// Without one, maps evaluate in memory over the catalog's value
    /// ranges.
    #[arg(long)]
    calc_cmd: Option<String>,

    /// Extra arguments passed to the calculator before name and expression
    #[arg(long = "calc-arg")]
    calc_args: Vec<String>,

    /// Write the updated catalog back to this file after the run
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OnError {
    Atomic,
    Partial,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Atomic => ErrorPolicy::Atomic,
            OnError::Partial => ErrorPolicy::Partial,
        }
    }
}

fn load_catalog(path: &PathBuf) -> Result<MemoryCatalog, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    let datasets: Vec<SpaceTimeDataset> =
        serde_json::from_str(&text).map_err(|e| format!("parse {}: {e}", path.display()))?;
    let mut catalog = MemoryCatalog::new();
    for ds in datasets {
        catalog.insert(ds);
    }
    Ok(catalog)
}

/// Seed the in-memory executor with one constant value per map, taken
/// from the registered range.
fn seeded_mock(catalog: &MemoryCatalog) -> MockExecutor {
    let mock = MockExecutor::new();
    for ds in catalog.datasets() {
        for map in ds.maps() {
            match map.min {
                Some(min) => mock.set_value(&map.id, min),
                None => mock.set_null(&map.id),
            }
        }
    }
    mock
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chronal_run=info,chronal_runtime=info,chronal_compiler=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let suffix = match SuffixMode::from_str(&cli.suffix) {
        Ok(s) => s,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    let mut options = Options::new(&cli.basename);
    options.suffix = suffix;
    options.nprocs = cli.nprocs;
    options.spatial_topology = cli.spatial;
    options.register_null = cli.register_null;
    options.granularity_sampling = cli.granularity_sampling;
    options.dry_run = cli.dry_run;
    options.overwrite = cli.overwrite;
    options.error_policy = cli.on_error.into();

    let mut catalog = match load_catalog(&cli.inputs) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let executor: Box<dyn MapCalcExecutor> = match &cli.calc_cmd {
        Some(program) => Box::new(ProcessExecutor::new(program, cli.calc_args.clone())),
        None => {
            info!("no calculator configured; evaluating in memory");
            Box::new(seeded_mock(&catalog))
        }
    };

    info!(statement = %cli.statement, "running");
    let report = match chronal_runtime::run(&cli.statement, &mut catalog, &*executor, &options) {
        Ok(report) => report,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("render report: {e}"),
    }

    if let Some(path) = &cli.save {
        if cli.dry_run {
            info!("dry run; catalog left untouched");
        } else {
            let datasets: Vec<&SpaceTimeDataset> = catalog.datasets().collect();
            match serde_json::to_string_pretty(&datasets)
                .map_err(|e| e.to_string())
                .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()))
            {
                Ok(()) => info!(path = %path.display(), "catalog saved"),
                Err(e) => {
                    error!("save catalog: {e}");
                    std::process::exit(1);
                }
            }
        }
    }

    if !report.success() {
        std::process::exit(1);
    }
}
