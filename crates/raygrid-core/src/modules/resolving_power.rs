//! Default resolving-power estimator: a sigma-clipped centroid and width of
//! the dispersion coordinate per order.

use super::traits::{OrderEstimate, ResolvingPowerEstimator};
use crate::common::constants::{
    GAUSSIAN_FWHM_FACTOR, MIN_PHOTONS_FOR_FIT, SIGMA_CLIP_MAX_ITERATIONS, SIGMA_CLIP_THRESHOLD,
};
use crate::domain::{OrderList, PhotonRecord};
use crate::numerics::weighted_mean_std;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentroidWidthEstimator {
    pub min_photons: usize,
    pub clip_sigma: f64,
    pub clip_iterations: usize,
}

impl Default for CentroidWidthEstimator {
    fn default() -> Self {
        Self {
            min_photons: MIN_PHOTONS_FOR_FIT,
            clip_sigma: SIGMA_CLIP_THRESHOLD,
            clip_iterations: SIGMA_CLIP_MAX_ITERATIONS,
        }
    }
}

impl CentroidWidthEstimator {
    fn estimate_order(
        &self,
        photons: &[PhotonRecord],
        order: i32,
        zero_position: f64,
    ) -> OrderEstimate {
        let (positions, weights): (Vec<f64>, Vec<f64>) = photons
            .iter()
            .filter(|photon| photon.order == Some(order) && photon.det_x.is_finite())
            .map(|photon| (photon.det_x, photon.probability))
            .unzip();

        if positions.len() <= self.min_photons {
            return OrderEstimate::MISSING;
        }

        let Some((centroid, spread)) = self.clipped_stats(&positions, &weights) else {
            return OrderEstimate::MISSING;
        };
        if spread.is_nan() || spread <= 0.0 {
            return OrderEstimate::MISSING;
        }

        OrderEstimate {
            resolving_power: (centroid - zero_position).abs() / (GAUSSIAN_FWHM_FACTOR * spread),
            centroid,
            spread,
        }
    }

    fn clipped_stats(&self, positions: &[f64], weights: &[f64]) -> Option<(f64, f64)> {
        let mut keep = vec![true; positions.len()];
        let mut stats = weighted_mean_std(positions, weights)?;

        for _ in 0..self.clip_iterations {
            let (mean, std) = stats;
            let mut changed = false;
            for (flag, position) in keep.iter_mut().zip(positions) {
                let inside = (position - mean).abs() <= self.clip_sigma * std;
                if *flag && !inside {
                    *flag = false;
                    changed = true;
                }
            }
            if !changed {
                break;
            }

            let (kept_positions, kept_weights): (Vec<f64>, Vec<f64>) = positions
                .iter()
                .zip(weights)
                .zip(&keep)
                .filter(|(_, flag)| **flag)
                .map(|((position, weight), _)| (*position, *weight))
                .unzip();
            stats = weighted_mean_std(&kept_positions, &kept_weights)?;
        }

        Some(stats)
    }
}

impl ResolvingPowerEstimator for CentroidWidthEstimator {
    fn estimate(
        &self,
        photons: &[PhotonRecord],
        orders: &OrderList,
        zero_position: f64,
    ) -> Vec<OrderEstimate> {
        orders
            .values()
            .iter()
            .map(|order| self.estimate_order(photons, *order, zero_position))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::CentroidWidthEstimator;
    use crate::common::constants::GAUSSIAN_FWHM_FACTOR;
    use crate::domain::{OrderList, PhotonRecord};
    use crate::modules::ResolvingPowerEstimator;

    fn photon(order: i32, det_x: f64) -> PhotonRecord {
        PhotonRecord {
            energy: 1.0,
            probability: 1.0,
            aperture: 0,
            order: Some(order),
            ccd: 0,
            det_x,
            det_y: 0.0,
        }
    }

    #[test]
    fn symmetric_line_gives_expected_resolving_power() {
        let mut photons = Vec::new();
        for _ in 0..15 {
            photons.push(photon(-1, 99.0));
            photons.push(photon(-1, 101.0));
        }
        let orders = OrderList::new(vec![-1]).expect("orders should build");

        let estimates = CentroidWidthEstimator::default().estimate(&photons, &orders, 0.0);
        let estimate = estimates[0];
        assert!((estimate.centroid - 100.0).abs() < 1.0e-12);
        assert!((estimate.spread - 1.0).abs() < 1.0e-12);
        let expected = 100.0 / GAUSSIAN_FWHM_FACTOR;
        assert!((estimate.resolving_power - expected).abs() < 1.0e-9);
    }

    #[test]
    fn sparse_orders_are_missing() {
        let photons = (0..20).map(|i| photon(-2, f64::from(i))).collect::<Vec<_>>();
        let orders = OrderList::new(vec![-2, 0]).expect("orders should build");

        let estimates = CentroidWidthEstimator::default().estimate(&photons, &orders, 0.0);
        assert_eq!(estimates.len(), 2);
        assert!(estimates.iter().all(|estimate| estimate.is_missing()));
        assert!(estimates[0].centroid.is_nan());
    }

    #[test]
    fn zero_width_line_is_missing_instead_of_infinite() {
        let photons = vec![photon(0, 5.0); 40];
        let orders = OrderList::new(vec![0]).expect("orders should build");
        let estimates = CentroidWidthEstimator::default().estimate(&photons, &orders, 0.0);
        assert!(estimates[0].is_missing());
    }

    #[test]
    fn outliers_are_clipped_from_the_width() {
        let mut photons = Vec::new();
        for _ in 0..50 {
            photons.push(photon(-1, 49.0));
            photons.push(photon(-1, 51.0));
        }
        photons.push(photon(-1, 5000.0));
        let orders = OrderList::new(vec![-1]).expect("orders should build");

        let estimate = CentroidWidthEstimator::default().estimate(&photons, &orders, 0.0)[0];
        assert!((estimate.centroid - 50.0).abs() < 1.0e-9);
        assert!((estimate.spread - 1.0).abs() < 1.0e-9);
    }
}
