use crate::domain::{GridResult, OrderList, PhotonRecord, SimulationRun};

/// Per-order outcome of a resolving-power fit. Every field is NaN when the
/// order could not be fitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderEstimate {
    pub resolving_power: f64,
    pub centroid: f64,
    pub spread: f64,
}

impl OrderEstimate {
    pub const MISSING: Self = Self {
        resolving_power: f64::NAN,
        centroid: f64::NAN,
        spread: f64::NAN,
    };

    pub fn is_missing(&self) -> bool {
        !self.resolving_power.is_finite()
    }
}

/// Estimates resolving power per order from the detected photons of one
/// aperture. Must return exactly one estimate per declared order.
pub trait ResolvingPowerEstimator: Sync {
    fn estimate(
        &self,
        photons: &[PhotonRecord],
        orders: &OrderList,
        zero_position: f64,
    ) -> Vec<OrderEstimate>;
}

impl<T> ResolvingPowerEstimator for &T
where
    T: ResolvingPowerEstimator + ?Sized,
{
    fn estimate(
        &self,
        photons: &[PhotonRecord],
        orders: &OrderList,
        zero_position: f64,
    ) -> Vec<OrderEstimate> {
        (**self).estimate(photons, orders, zero_position)
    }
}

/// An ordered, random-access collection of simulation runs.
pub trait RunSource: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable label used in diagnostics (e.g. a file name).
    fn label(&self, index: usize) -> String;

    fn load(&self, index: usize) -> GridResult<SimulationRun>;
}

impl RunSource for [SimulationRun] {
    fn len(&self) -> usize {
        <[SimulationRun]>::len(self)
    }

    fn label(&self, index: usize) -> String {
        format!("run #{}", index)
    }

    fn load(&self, index: usize) -> GridResult<SimulationRun> {
        self.get(index).cloned().ok_or_else(|| {
            crate::domain::GridError::internal(
                "RUN.SOURCE_INDEX",
                format!("run index {} is out of range", index),
            )
        })
    }
}

impl RunSource for Vec<SimulationRun> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn label(&self, index: usize) -> String {
        RunSource::label(self.as_slice(), index)
    }

    fn load(&self, index: usize) -> GridResult<SimulationRun> {
        RunSource::load(self.as_slice(), index)
    }
}

#[cfg(test)]
mod tests {
    use super::{OrderEstimate, ResolvingPowerEstimator, RunSource};
    use crate::domain::{GridErrorCategory, OrderList, PhotonRecord, RunMetadata, SimulationRun};

    struct ConstantEstimator(f64);

    impl ResolvingPowerEstimator for ConstantEstimator {
        fn estimate(
            &self,
            _photons: &[PhotonRecord],
            orders: &OrderList,
            zero_position: f64,
        ) -> Vec<OrderEstimate> {
            orders
                .values()
                .iter()
                .map(|_| OrderEstimate {
                    resolving_power: self.0,
                    centroid: zero_position,
                    spread: 1.0,
                })
                .collect()
        }
    }

    fn estimate_with<E: ResolvingPowerEstimator>(
        estimator: E,
        orders: &OrderList,
    ) -> Vec<OrderEstimate> {
        estimator.estimate(&[], orders, 2.5)
    }

    #[test]
    fn estimator_is_usable_through_references_and_trait_objects() {
        let orders = OrderList::new(vec![-1, 0]).expect("orders should build");
        let estimator = ConstantEstimator(3000.0);
        let by_ref: &dyn ResolvingPowerEstimator = &estimator;

        let estimates = estimate_with(by_ref, &orders);
        assert_eq!(estimates.len(), 2);
        assert_eq!(estimates[1].centroid, 2.5);
        assert!(!estimates[0].is_missing());
        assert!(OrderEstimate::MISSING.is_missing());
    }

    #[test]
    fn in_memory_runs_act_as_run_source() {
        let runs = vec![SimulationRun::new(RunMetadata::new(), Vec::new())];
        assert_eq!(RunSource::len(&runs), 1);
        assert_eq!(runs.label(0), "run #0");
        assert!(runs.load(0).is_ok());
        let error = runs.load(3).expect_err("out-of-range index should fail");
        assert_eq!(error.category(), GridErrorCategory::InternalError);
    }
}
