pub mod errors;

pub use errors::{AnalysisResult, ExitMapping, GridError, GridErrorCategory, GridResult};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Metadata values are kept as loosely typed JSON scalars, mirroring the
/// header cards of the photon tables the simulator writes.
pub type MetaValue = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    #[default]
    Serial,
    Parallel,
}

impl ExecutionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Parallel => "parallel",
        }
    }
}

impl Display for ExecutionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// One simulated photon. `order` is `None` when the photon was not diffracted
/// into any order; `ccd` is negative when no active detector recorded it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotonRecord {
    pub energy: f64,
    pub probability: f64,
    pub aperture: u32,
    pub order: Option<i32>,
    pub ccd: i32,
    pub det_x: f64,
    pub det_y: f64,
}

impl PhotonRecord {
    pub const fn is_detected(&self) -> bool {
        self.ccd >= 0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunMetadata {
    entries: BTreeMap<String, MetaValue>,
}

impl RunMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetaValue)> {
        self.entries.iter()
    }
}

/// All photons generated for one nominal energy, including the ones that were
/// never detected.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationRun {
    pub meta: RunMetadata,
    pub photons: Vec<PhotonRecord>,
}

impl SimulationRun {
    pub fn new(meta: RunMetadata, photons: Vec<PhotonRecord>) -> Self {
        Self { meta, photons }
    }

    pub fn len(&self) -> usize {
        self.photons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photons.is_empty()
    }

    /// Nominal energy, taken from the first record.
    pub fn energy(&self) -> Option<f64> {
        self.photons.first().map(|photon| photon.energy)
    }

    /// Distinct aperture ids present in the run, ascending.
    pub fn apertures(&self) -> Vec<u32> {
        let mut apertures = self
            .photons
            .iter()
            .map(|photon| photon.aperture)
            .collect::<Vec<_>>();
        apertures.sort_unstable();
        apertures.dedup();
        apertures
    }

    pub fn photons_for_aperture(&self, aperture: u32) -> Vec<PhotonRecord> {
        self.photons
            .iter()
            .filter(|photon| photon.aperture == aperture)
            .copied()
            .collect()
    }
}

/// Fixed, declared sequence of diffraction orders shared by every run of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i32>", into = "Vec<i32>")]
pub struct OrderList {
    values: Vec<i32>,
}

impl OrderList {
    pub fn new(values: Vec<i32>) -> GridResult<Self> {
        if values.is_empty() {
            return Err(GridError::input_shape(
                "INPUT.ORDERS_EMPTY",
                "order list must declare at least one order",
            ));
        }
        for (index, value) in values.iter().enumerate() {
            if values[..index].contains(value) {
                return Err(GridError::input_shape(
                    "INPUT.ORDERS_DUPLICATE",
                    format!("order {} is declared more than once", value),
                ));
            }
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index_of(&self, order: i32) -> Option<usize> {
        self.values.iter().position(|value| *value == order)
    }
}

impl Default for OrderList {
    fn default() -> Self {
        Self {
            values: (-12..=0).collect(),
        }
    }
}

impl TryFrom<Vec<i32>> for OrderList {
    type Error = GridError;

    fn try_from(values: Vec<i32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<OrderList> for Vec<i32> {
    fn from(orders: OrderList) -> Self {
        orders.values
    }
}

/// Per-run analysis result, indexed by (aperture index, order index).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisMatrix {
    pub energy: f64,
    pub apertures: Vec<u32>,
    pub resolving_power: Array2<f64>,
    pub relative_area: Array2<f64>,
    /// Non-fatal diagnostics, one per (aperture, order) without a usable estimate.
    pub missing: Vec<GridError>,
}

impl AnalysisMatrix {
    pub fn shape(&self) -> (usize, usize) {
        self.resolving_power.dim()
    }
}
