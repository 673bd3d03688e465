use super::CliError;
use super::helpers::load_instrument_config;
use clap::Args;
use raygrid_core::domain::ExecutionMode;
use raygrid_core::modules::serialization::read_photon_run;
use raygrid_core::modules::{
    CentroidWidthEstimator, aggregate_grid_directory, check_energy_uniform, expand_column_to_csv,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub(super) struct AggregateArgs {
    /// Directory holding one photon-list file per energy
    #[arg(value_name = "INPATH")]
    inpath: PathBuf,
    /// Instrument description (apertures, channels, orders)
    #[arg(long)]
    config: PathBuf,
    /// Calibration table to write; an existing file is replaced
    #[arg(long, short)]
    output: PathBuf,
    /// File-name glob overriding the pattern from the config
    #[arg(long)]
    pattern: Option<String>,
    /// Analyse runs on the rayon thread pool
    #[arg(long)]
    parallel: bool,
}

#[derive(Debug, Args)]
pub(super) struct ExpandArgs {
    #[arg(value_name = "INFILE")]
    infile: PathBuf,
    /// Per-order vector column to expand
    #[arg(long, default_value = "Aeff4")]
    column: String,
    #[arg(long, short)]
    output: PathBuf,
}

#[derive(Debug, Args)]
pub(super) struct InspectArgs {
    #[arg(value_name = "RUNFILE")]
    runfile: PathBuf,
}

pub(super) fn run_aggregate_command(args: AggregateArgs) -> Result<i32, CliError> {
    let mut config = load_instrument_config(&args.config)?;
    if let Some(pattern) = args.pattern {
        config.pattern = pattern;
    }
    let mode = if args.parallel {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::Serial
    };

    let estimator = CentroidWidthEstimator::default();
    let table = aggregate_grid_directory(&args.inpath, &config, &estimator, mode, &args.output)?;

    let missing = table
        .weighted_resolving_power
        .iter()
        .filter(|value| value.is_nan())
        .count();
    info!(
        energies = table.rows(),
        apertures = table.apertures.len(),
        orders = table.orders.len(),
        missing_weighted_cells = missing,
        "aggregate finished"
    );
    println!("{}", args.output.display());
    Ok(0)
}

pub(super) fn run_expand_command(args: ExpandArgs) -> Result<i32, CliError> {
    let expanded = expand_column_to_csv(&args.infile, &args.column, &args.output)?;
    info!(
        rows = expanded.rows.len(),
        columns = expanded.header.len(),
        "expand finished"
    );
    println!("{}", args.output.display());
    Ok(0)
}

#[derive(Debug, Serialize)]
struct RunSummary {
    energy: Option<f64>,
    photons: usize,
    detected: usize,
    apertures: BTreeMap<u32, usize>,
    orders: BTreeMap<String, usize>,
}

pub(super) fn run_inspect_command(args: InspectArgs) -> Result<i32, CliError> {
    let run = read_photon_run(&args.runfile)?;
    check_energy_uniform(&run)?;

    let mut summary = RunSummary {
        energy: run.energy(),
        photons: run.len(),
        detected: 0,
        apertures: BTreeMap::new(),
        orders: BTreeMap::new(),
    };
    for photon in &run.photons {
        if photon.is_detected() {
            summary.detected += 1;
        }
        *summary.apertures.entry(photon.aperture).or_default() += 1;
        let order = photon
            .order
            .map_or_else(|| "none".to_string(), |order| order.to_string());
        *summary.orders.entry(order).or_default() += 1;
    }

    let rendered = serde_json::to_string_pretty(&summary)
        .map_err(|source| CliError::Internal(source.into()))?;
    println!("{}", rendered);
    Ok(0)
}
