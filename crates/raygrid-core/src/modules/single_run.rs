//! Resolving power and relative effective area for one monoenergetic run.

use super::area::relative_area_per_order;
use super::consistency::{check_energy_uniform, check_runs_consistent};
use super::traits::ResolvingPowerEstimator;
use crate::common::config::InstrumentConfig;
use crate::domain::{
    AnalysisMatrix, AnalysisResult, GridError, OrderList, RunMetadata, SimulationRun,
};
use ndarray::Array2;
use tracing::{debug, warn};

#[derive(Clone, Copy)]
pub struct RunAnalysisRequest<'a> {
    pub orders: &'a OrderList,
    /// `None` analyses every aperture present in the run.
    pub apertures: Option<&'a [u32]>,
    pub reference_meta: Option<&'a RunMetadata>,
    pub config: &'a InstrumentConfig,
}

pub fn analyse_run<E>(
    run: &SimulationRun,
    request: RunAnalysisRequest<'_>,
    estimator: &E,
) -> AnalysisResult<AnalysisMatrix>
where
    E: ResolvingPowerEstimator + ?Sized,
{
    if let Some(reference) = request.reference_meta {
        check_runs_consistent(&run.meta, reference)?;
    }
    check_energy_uniform(run)?;

    let energy = run.energy().ok_or_else(|| {
        GridError::input_shape(
            "INPUT.RUN_EMPTY",
            "run contains no photons, so its energy is undefined",
        )
    })?;

    let apertures = match request.apertures {
        Some(apertures) => apertures.to_vec(),
        None => run.apertures(),
    };
    let orders = request.orders;
    let shape = (apertures.len(), orders.len());
    let mut resolving_power = Array2::from_elem(shape, f64::NAN);
    let mut relative_area = Array2::zeros(shape);
    let mut missing = Vec::new();

    for (aperture_index, &aperture) in apertures.iter().enumerate() {
        let zero_position = request.config.zero_order_position(aperture)?;
        let aperture_photons = run.photons_for_aperture(aperture);
        let detected = aperture_photons
            .iter()
            .filter(|photon| photon.is_detected() && photon.probability > 0.0)
            .copied()
            .collect::<Vec<_>>();

        let estimates = estimator.estimate(&detected, orders, zero_position);
        if estimates.len() != orders.len() {
            return Err(GridError::input_shape(
                "INPUT.ESTIMATE_SHAPE",
                format!(
                    "estimator returned {} values for {} declared orders (aperture {})",
                    estimates.len(),
                    orders.len(),
                    aperture
                ),
            ));
        }

        for (order_index, estimate) in estimates.iter().enumerate() {
            if estimate.is_missing() {
                let diagnostic = GridError::missing_estimate(
                    "ESTIMATE.MISSING",
                    format!(
                        "no resolving power for order {} of aperture {} at {} keV",
                        orders.values()[order_index],
                        aperture,
                        energy
                    ),
                );
                debug!("{}", diagnostic.diagnostic_line());
                missing.push(diagnostic);
            } else {
                resolving_power[[aperture_index, order_index]] = estimate.resolving_power;
            }
        }

        let area = relative_area_per_order(&aperture_photons, orders.values());
        for (order_index, value) in area.into_iter().enumerate() {
            relative_area[[aperture_index, order_index]] = value;
        }

        debug!(
            aperture,
            generated = aperture_photons.len(),
            detected = detected.len(),
            "analysed aperture"
        );
    }

    if !missing.is_empty() {
        warn!(
            energy,
            missing = missing.len(),
            cells = apertures.len() * orders.len(),
            "run has aperture/order cells without a resolving-power estimate"
        );
    }

    Ok(AnalysisMatrix {
        energy,
        apertures,
        resolving_power,
        relative_area,
        missing,
    })
}
