//! Reshape one per-order vector column of a calibration table into one
//! scalar column per order, for tools that cannot read vector cells.

use super::grid::{WAVELENGTH_COLUMN, order_meta_key};
use super::serialization::{Cell, ColumnValues, TableDocument, read_table, write_csv_atomic};
use crate::domain::{GridError, GridResult, MetaValue};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedTable {
    /// `wave` followed by `order_<value>` for every order.
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ExpandedTable {
    pub fn write_csv(&self, path: impl AsRef<Path>) -> GridResult<()> {
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| render_cell(*cell)).collect())
            .collect::<Vec<Vec<String>>>();
        write_csv_atomic(path, &self.header, &rows)
    }
}

pub fn expand_column(table: &TableDocument, column: &str) -> GridResult<ExpandedTable> {
    let values = vector_column(table, column)?;
    let wavelength = match table.column(WAVELENGTH_COLUMN).map(|c| &c.values) {
        Some(ColumnValues::Scalar(values)) => values,
        Some(other) => {
            return Err(GridError::input_shape(
                "INPUT.COLUMN_KIND",
                format!(
                    "column '{}' must be scalar but is {}",
                    WAVELENGTH_COLUMN,
                    other.kind()
                ),
            ));
        }
        None => return Err(missing_column(WAVELENGTH_COLUMN)),
    };
    if wavelength.len() != values.len() {
        return Err(GridError::input_shape(
            "INPUT.COLUMN_ROWS",
            format!(
                "column '{}' has {} rows but '{}' has {}",
                column,
                values.len(),
                WAVELENGTH_COLUMN,
                wavelength.len()
            ),
        ));
    }

    let width = values.first().map_or(0, Vec::len);
    if let Some(row) = values.iter().position(|row| row.len() != width) {
        return Err(GridError::input_shape(
            "INPUT.COLUMN_ROWS",
            format!(
                "row {} of column '{}' has {} entries, expected {}",
                row,
                column,
                values[row].len(),
                width
            ),
        ));
    }

    let mut header = Vec::with_capacity(width + 1);
    header.push(WAVELENGTH_COLUMN.to_string());
    for index in 0..width {
        let key = order_meta_key(index);
        let order = table.meta.get(&key).ok_or_else(|| {
            GridError::input_shape(
                "INPUT.ORDER_META",
                format!("table metadata has no '{}' entry for column '{}'", key, column),
            )
        })?;
        header.push(format!("order_{}", render_meta(order)));
    }

    let rows = wavelength
        .iter()
        .zip(values)
        .map(|(wave, row)| std::iter::once(*wave).chain(row.iter().copied()).collect())
        .collect();

    Ok(ExpandedTable { header, rows })
}

/// Reads `infile`, expands `column` and writes the result as CSV to `outfile`.
pub fn expand_column_to_csv(
    infile: impl AsRef<Path>,
    column: &str,
    outfile: impl AsRef<Path>,
) -> GridResult<ExpandedTable> {
    let table = read_table(infile.as_ref())?;
    let expanded = expand_column(&table, column)?;
    expanded.write_csv(outfile.as_ref())?;
    info!(
        column,
        rows = expanded.rows.len(),
        path = %outfile.as_ref().display(),
        "column expanded"
    );
    Ok(expanded)
}

fn vector_column<'t>(table: &'t TableDocument, column: &str) -> GridResult<&'t Vec<Vec<Cell>>> {
    match table.column(column).map(|c| &c.values) {
        Some(ColumnValues::Vector(values)) => Ok(values),
        Some(other) => Err(GridError::input_shape(
            "INPUT.COLUMN_KIND",
            format!(
                "column '{}' is {} valued; only per-order vector columns can be expanded",
                column,
                other.kind()
            ),
        )),
        None => Err(missing_column(column)),
    }
}

fn missing_column(column: &str) -> GridError {
    GridError::input_shape(
        "INPUT.COLUMN_MISSING",
        format!("table has no column named '{}'", column),
    )
}

fn render_meta(value: &MetaValue) -> String {
    match value {
        MetaValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn render_cell(cell: Cell) -> String {
    cell.map(|value| value.to_string()).unwrap_or_default()
}
