//! On-disk forms of photon runs and calibration tables.
//!
//! Both are columnar JSON documents. Missing numeric values are written as
//! `null` and come back as NaN. Every write goes through a temporary file in
//! the destination directory that is then persisted over the target, so a
//! failed write never leaves a half-written or modified output behind.

use crate::domain::{GridError, GridResult, PhotonRecord, RunMetadata, SimulationRun};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Cell = Option<f64>;

pub fn to_cell(value: f64) -> Cell {
    (!value.is_nan()).then_some(value)
}

pub fn from_cell(cell: Cell) -> f64 {
    cell.unwrap_or(f64::NAN)
}

#[derive(Debug, Error)]
pub enum TableCodecError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize document for '{}': {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode csv for '{}': {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TableCodecError {
    const fn placeholder(&self) -> &'static str {
        match self {
            Self::Read { .. } => "IO.TABLE_READ",
            Self::Parse { .. } => "IO.TABLE_PARSE",
            Self::Serialize { .. } => "IO.TABLE_SERIALIZE",
            Self::Csv { .. } => "IO.CSV_ENCODE",
            Self::Write { .. } => "IO.TABLE_WRITE",
        }
    }
}

impl From<TableCodecError> for GridError {
    fn from(error: TableCodecError) -> Self {
        GridError::io_system(error.placeholder(), error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhotonColumns {
    pub energy: Vec<f64>,
    pub probability: Vec<f64>,
    pub aperture: Vec<u32>,
    pub order: Vec<Option<i32>>,
    #[serde(rename = "CCD")]
    pub ccd: Vec<i32>,
    #[serde(default)]
    pub det_x: Vec<Cell>,
    #[serde(default)]
    pub det_y: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhotonTableDocument {
    #[serde(default)]
    pub meta: RunMetadata,
    pub photons: PhotonColumns,
}

impl PhotonTableDocument {
    pub fn from_run(run: &SimulationRun) -> Self {
        let photons = &run.photons;
        Self {
            meta: run.meta.clone(),
            photons: PhotonColumns {
                energy: photons.iter().map(|p| p.energy).collect(),
                probability: photons.iter().map(|p| p.probability).collect(),
                aperture: photons.iter().map(|p| p.aperture).collect(),
                order: photons.iter().map(|p| p.order).collect(),
                ccd: photons.iter().map(|p| p.ccd).collect(),
                det_x: photons.iter().map(|p| to_cell(p.det_x)).collect(),
                det_y: photons.iter().map(|p| to_cell(p.det_y)).collect(),
            },
        }
    }

    pub fn into_run(self) -> GridResult<SimulationRun> {
        let columns = self.photons;
        let rows = columns.energy.len();
        let required = [
            ("probability", columns.probability.len()),
            ("aperture", columns.aperture.len()),
            ("order", columns.order.len()),
            ("CCD", columns.ccd.len()),
        ];
        let optional = [("det_x", columns.det_x.len()), ("det_y", columns.det_y.len())];
        for (name, len) in required
            .into_iter()
            .chain(optional.into_iter().filter(|(_, len)| *len > 0))
        {
            if len != rows {
                return Err(GridError::input_shape(
                    "INPUT.PHOTON_COLUMNS",
                    format!(
                        "photon column '{}' has {} rows but 'energy' has {}",
                        name, len, rows
                    ),
                ));
            }
        }

        let position = |column: &[Cell], index: usize| {
            column.get(index).copied().map_or(f64::NAN, from_cell)
        };
        let photons = (0..rows)
            .map(|index| PhotonRecord {
                energy: columns.energy[index],
                probability: columns.probability[index],
                aperture: columns.aperture[index],
                order: columns.order[index],
                ccd: columns.ccd[index],
                det_x: position(&columns.det_x, index),
                det_y: position(&columns.det_y, index),
            })
            .collect();

        Ok(SimulationRun::new(self.meta, photons))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnValues {
    Scalar(Vec<Cell>),
    Vector(Vec<Vec<Cell>>),
    Matrix(Vec<Vec<Vec<Cell>>>),
}

impl ColumnValues {
    pub fn rows(&self) -> usize {
        match self {
            Self::Scalar(values) => values.len(),
            Self::Vector(values) => values.len(),
            Self::Matrix(values) => values.len(),
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Vector(_) => "vector",
            Self::Matrix(_) => "matrix",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub values: ColumnValues,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, unit: Option<&str>, values: ColumnValues) -> Self {
        Self {
            name: name.into(),
            unit: unit.map(str::to_string),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableDocument {
    #[serde(default)]
    pub meta: RunMetadata,
    pub columns: Vec<TableColumn>,
}

impl TableDocument {
    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn rows(&self) -> usize {
        self.columns
            .first()
            .map_or(0, |column| column.values.rows())
    }
}

pub fn read_photon_run(path: impl AsRef<Path>) -> GridResult<SimulationRun> {
    let document: PhotonTableDocument = read_json(path.as_ref())?;
    document.into_run().map_err(|error| {
        GridError::new(
            error.category(),
            error.placeholder(),
            format!("{} in '{}'", error.message(), path.as_ref().display()),
        )
    })
}

pub fn write_photon_run(path: impl AsRef<Path>, run: &SimulationRun) -> GridResult<()> {
    write_json_atomic(path.as_ref(), &PhotonTableDocument::from_run(run))
}

pub fn read_table(path: impl AsRef<Path>) -> GridResult<TableDocument> {
    read_json(path.as_ref())
}

pub fn write_table(path: impl AsRef<Path>, table: &TableDocument) -> GridResult<()> {
    write_json_atomic(path.as_ref(), table)
}

pub fn write_csv_atomic(
    path: impl AsRef<Path>,
    header: &[String],
    rows: &[Vec<String>],
) -> GridResult<()> {
    let path = path.as_ref();
    let csv_error = |source: csv::Error| TableCodecError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(header).map_err(csv_error)?;
        for row in rows {
            writer.write_record(row).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| TableCodecError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    write_bytes_atomic(path, &buffer)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> GridResult<T> {
    let content = fs::read_to_string(path).map_err(|source| TableCodecError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&content).map_err(|source| TableCodecError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(value)
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> GridResult<()> {
    let content =
        serde_json::to_vec_pretty(value).map_err(|source| TableCodecError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    write_bytes_atomic(path, &content)
}

pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> GridResult<()> {
    let write_error = |source: std::io::Error| TableCodecError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(write_error)?;

    let mut staged = tempfile::NamedTempFile::new_in(&parent).map_err(write_error)?;
    staged.write_all(bytes).map_err(write_error)?;
    staged.flush().map_err(write_error)?;
    staged
        .persist(path)
        .map_err(|error| write_error(error.error))?;
    Ok(())
}
