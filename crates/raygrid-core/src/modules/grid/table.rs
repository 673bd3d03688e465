use crate::domain::{GridResult, OrderList, RunMetadata};
use crate::modules::serialization::{
    ColumnValues, TableColumn, TableDocument, to_cell, write_table,
};
use ndarray::{Array2, Array3, ArrayView1, Axis};
use std::path::Path;

pub const ENERGY_COLUMN: &str = "energy";
pub const WAVELENGTH_COLUMN: &str = "wave";
pub const RESOLVING_POWER_COLUMN: &str = "R";
pub const EFFECTIVE_AREA_COLUMN: &str = "Aeff";
pub const TOTAL_EFFECTIVE_AREA_COLUMN: &str = "Aeff4";
pub const WEIGHTED_RESOLVING_POWER_COLUMN: &str = "R4";

pub fn order_meta_key(index: usize) -> String {
    format!("ORDER_{}", index)
}

pub fn aperture_meta_key(index: usize) -> String {
    format!("APERTURE_{}", index)
}

/// Resolving power and effective area per energy, aperture and order.
///
/// Rows are energies. `resolving_power` and `effective_area` are shaped
/// (energy, aperture, order); the aperture-combined columns are (energy, order).
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    pub orders: OrderList,
    pub apertures: Vec<u32>,
    pub energy: Vec<f64>,
    pub wavelength: Vec<f64>,
    pub resolving_power: Array3<f64>,
    pub effective_area: Array3<f64>,
    pub total_effective_area: Array2<f64>,
    pub weighted_resolving_power: Array2<f64>,
    pub meta: RunMetadata,
}

impl CalibrationTable {
    pub fn rows(&self) -> usize {
        self.energy.len()
    }

    pub fn to_document(&self) -> TableDocument {
        TableDocument {
            meta: self.meta.clone(),
            columns: vec![
                TableColumn::new(ENERGY_COLUMN, Some("keV"), scalar_column(&self.energy)),
                TableColumn::new(
                    WAVELENGTH_COLUMN,
                    Some("Angstrom"),
                    scalar_column(&self.wavelength),
                ),
                TableColumn::new(
                    RESOLVING_POWER_COLUMN,
                    None,
                    matrix_column(&self.resolving_power),
                ),
                TableColumn::new(
                    EFFECTIVE_AREA_COLUMN,
                    Some("cm2"),
                    matrix_column(&self.effective_area),
                ),
                TableColumn::new(
                    TOTAL_EFFECTIVE_AREA_COLUMN,
                    Some("cm2"),
                    vector_column(&self.total_effective_area),
                ),
                TableColumn::new(
                    WEIGHTED_RESOLVING_POWER_COLUMN,
                    None,
                    vector_column(&self.weighted_resolving_power),
                ),
            ],
        }
    }

    /// Writes the table, replacing any existing file at `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> GridResult<()> {
        write_table(path, &self.to_document())
    }
}

fn scalar_column(values: &[f64]) -> ColumnValues {
    ColumnValues::Scalar(values.iter().copied().map(to_cell).collect())
}

fn cells(row: ArrayView1<'_, f64>) -> Vec<Option<f64>> {
    row.iter().copied().map(to_cell).collect()
}

fn vector_column(values: &Array2<f64>) -> ColumnValues {
    ColumnValues::Vector(values.outer_iter().map(cells).collect())
}

fn matrix_column(values: &Array3<f64>) -> ColumnValues {
    ColumnValues::Matrix(
        values
            .axis_iter(Axis(0))
            .map(|row| row.outer_iter().map(cells).collect())
            .collect(),
    )
}
