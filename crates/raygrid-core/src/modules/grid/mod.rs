//! Aggregation of a grid of monoenergetic runs into a calibration table.

mod source;
mod table;

pub use source::FileGrid;
pub use table::{
    CalibrationTable, EFFECTIVE_AREA_COLUMN, ENERGY_COLUMN, RESOLVING_POWER_COLUMN,
    TOTAL_EFFECTIVE_AREA_COLUMN, WAVELENGTH_COLUMN, WEIGHTED_RESOLVING_POWER_COLUMN,
    aperture_meta_key, order_meta_key,
};

use super::single_run::{RunAnalysisRequest, analyse_run};
use super::traits::{ResolvingPowerEstimator, RunSource};
use crate::common::config::InstrumentConfig;
use crate::domain::{AnalysisMatrix, ExecutionMode, GridError, GridResult, SimulationRun};
use crate::numerics::{energy_to_wavelength, masked_weighted_average};
use ndarray::{Array2, Array3, Axis, s};
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

pub struct GridAggregator<'a, E: ?Sized> {
    config: &'a InstrumentConfig,
    estimator: &'a E,
    mode: ExecutionMode,
}

impl<'a, E> GridAggregator<'a, E>
where
    E: ResolvingPowerEstimator + ?Sized,
{
    pub fn new(config: &'a InstrumentConfig, estimator: &'a E) -> Self {
        Self {
            config,
            estimator,
            mode: ExecutionMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Analyses every run of `source` and assembles the calibration table.
    ///
    /// The first run in grid order provides the reference metadata. Any
    /// run-level failure aborts the whole aggregation; with several failing
    /// runs the one earliest in grid order is reported.
    pub fn aggregate<S>(&self, source: &S) -> GridResult<CalibrationTable>
    where
        S: RunSource + ?Sized,
    {
        if source.is_empty() {
            return Err(GridError::input_shape(
                "INPUT.GRID_EMPTY",
                "grid contains no simulation runs",
            ));
        }
        self.config.validate()?;

        info!(runs = source.len(), mode = %self.mode, "analysing grid");
        let reference = source
            .load(0)
            .map_err(|error| with_run_label(error, &source.label(0)))?;
        let matrices = self.analyse_all(source, &reference)?;
        let table = self.assemble(&reference, matrices)?;

        let missing = table
            .weighted_resolving_power
            .iter()
            .filter(|value| value.is_nan())
            .count();
        info!(
            rows = table.rows(),
            orders = table.orders.len(),
            missing_weighted_cells = missing,
            "grid aggregated"
        );
        Ok(table)
    }

    /// [`Self::aggregate`] followed by an overwriting write to `outfile`.
    /// Nothing is written when the aggregation fails.
    pub fn aggregate_to_file<S>(
        &self,
        source: &S,
        outfile: impl AsRef<Path>,
    ) -> GridResult<CalibrationTable>
    where
        S: RunSource + ?Sized,
    {
        let table = self.aggregate(source)?;
        table.write(outfile.as_ref())?;
        info!(path = %outfile.as_ref().display(), "calibration table written");
        Ok(table)
    }

    fn analyse_all<S>(
        &self,
        source: &S,
        reference: &SimulationRun,
    ) -> GridResult<Vec<AnalysisMatrix>>
    where
        S: RunSource + ?Sized,
    {
        let apertures = self.config.aperture_ids();
        let request = RunAnalysisRequest {
            orders: &self.config.orders,
            apertures: Some(apertures.as_slice()),
            reference_meta: Some(&reference.meta),
            config: self.config,
        };

        let analyse = |index: usize| -> GridResult<AnalysisMatrix> {
            let label = source.label(index);
            let result = if index == 0 {
                analyse_run(reference, request, self.estimator)
            } else {
                source
                    .load(index)
                    .and_then(|run| analyse_run(&run, request, self.estimator))
            };
            let matrix = result.map_err(|error| with_run_label(error, &label))?;
            debug!(
                run = %label,
                energy = matrix.energy,
                missing = matrix.missing.len(),
                "run analysed"
            );
            Ok(matrix)
        };

        match self.mode {
            ExecutionMode::Serial => (0..source.len()).map(analyse).collect(),
            ExecutionMode::Parallel => (0..source.len())
                .into_par_iter()
                .map(analyse)
                .collect::<Vec<_>>()
                .into_iter()
                .collect(),
        }
    }

    fn assemble(
        &self,
        reference: &SimulationRun,
        matrices: Vec<AnalysisMatrix>,
    ) -> GridResult<CalibrationTable> {
        let order_of_rows = energy_sorted_indices(&matrices)?;
        if order_of_rows.iter().enumerate().any(|(row, index)| row != *index) {
            warn!("grid file order does not follow energy; rows were sorted by run energy");
        }

        let orders = self.config.orders.clone();
        let apertures = self.config.aperture_ids();
        let shape = (matrices.len(), apertures.len(), orders.len());
        let mut resolving_power = Array3::from_elem(shape, f64::NAN);
        let mut relative_area = Array3::<f64>::zeros(shape);
        let mut energy = Vec::with_capacity(matrices.len());

        for (row, &index) in order_of_rows.iter().enumerate() {
            let matrix = &matrices[index];
            if matrix.shape() != (shape.1, shape.2) {
                return Err(GridError::internal(
                    "RUN.MATRIX_SHAPE",
                    format!(
                        "analysis matrix of shape {:?} does not match ({}, {})",
                        matrix.shape(),
                        shape.1,
                        shape.2
                    ),
                ));
            }
            resolving_power
                .index_axis_mut(Axis(0), row)
                .assign(&matrix.resolving_power);
            relative_area
                .index_axis_mut(Axis(0), row)
                .assign(&matrix.relative_area);
            energy.push(matrix.energy);
        }

        let geometric_areas =
            Array3::from_shape_vec((1, shape.1, 1), self.config.geometric_areas()).map_err(
                |source| {
                    GridError::internal(
                        "RUN.APERTURE_AREAS",
                        format!("aperture areas do not match aperture count: {}", source),
                    )
                },
            )?;
        let effective_area = &relative_area * &geometric_areas;
        let total_effective_area = effective_area.sum_axis(Axis(1));
        let weighted_resolving_power = Array2::from_shape_fn((shape.0, shape.2), |(row, order)| {
            let values = resolving_power.slice(s![row, .., order]).to_vec();
            let weights = effective_area.slice(s![row, .., order]).to_vec();
            masked_weighted_average(&values, &weights)
        });
        let wavelength = energy.iter().copied().map(energy_to_wavelength).collect();

        let mut meta = reference.meta.clone();
        for (index, order) in orders.values().iter().enumerate() {
            meta.insert(order_meta_key(index), *order);
        }
        for (index, aperture) in apertures.iter().enumerate() {
            meta.insert(aperture_meta_key(index), *aperture);
        }

        Ok(CalibrationTable {
            orders,
            apertures,
            energy,
            wavelength,
            resolving_power,
            effective_area,
            total_effective_area,
            weighted_resolving_power,
            meta,
        })
    }
}

/// Discovers the grid files under `inpath`, aggregates them and writes the
/// calibration table to `outfile`.
pub fn aggregate_grid_directory<E>(
    inpath: impl AsRef<Path>,
    config: &InstrumentConfig,
    estimator: &E,
    mode: ExecutionMode,
    outfile: impl AsRef<Path>,
) -> GridResult<CalibrationTable>
where
    E: ResolvingPowerEstimator + ?Sized,
{
    let grid = FileGrid::discover(inpath.as_ref(), &config.pattern)?;
    info!(
        directory = %inpath.as_ref().display(),
        pattern = %config.pattern,
        files = grid.paths().len(),
        "grid discovered"
    );
    GridAggregator::new(config, estimator)
        .with_mode(mode)
        .aggregate_to_file(&grid, outfile)
}

/// Row order by ascending run energy, stable for equal energies.
fn energy_sorted_indices(matrices: &[AnalysisMatrix]) -> GridResult<Vec<usize>> {
    if let Some(matrix) = matrices
        .iter()
        .find(|matrix| !matrix.energy.is_finite() || matrix.energy <= 0.0)
    {
        return Err(GridError::input_shape(
            "INPUT.RUN_ENERGY",
            format!("run energy {} keV is not a positive number", matrix.energy),
        ));
    }
    let mut indices = (0..matrices.len()).collect::<Vec<_>>();
    indices.sort_by(|a, b| matrices[*a].energy.total_cmp(&matrices[*b].energy));
    Ok(indices)
}

fn with_run_label(error: GridError, label: &str) -> GridError {
    GridError::new(
        error.category(),
        error.placeholder(),
        format!("{}: {}", label, error.message()),
    )
}
