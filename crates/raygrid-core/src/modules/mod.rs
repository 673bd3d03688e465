pub mod area;
pub mod consistency;
pub mod expand;
pub mod grid;
pub mod resolving_power;
pub mod serialization;
pub mod single_run;

mod traits;

pub use area::{ClassColumn, relative_area, relative_area_per_order};
pub use consistency::{check_energy_uniform, check_runs_consistent};
pub use expand::{ExpandedTable, expand_column, expand_column_to_csv};
pub use grid::{CalibrationTable, FileGrid, GridAggregator, aggregate_grid_directory};
pub use resolving_power::CentroidWidthEstimator;
pub use single_run::{RunAnalysisRequest, analyse_run};
pub use traits::{OrderEstimate, ResolvingPowerEstimator, RunSource};
