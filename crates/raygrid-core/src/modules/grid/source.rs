use crate::domain::{GridError, GridResult, SimulationRun};
use crate::modules::serialization::read_photon_run;
use crate::modules::traits::RunSource;
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

/// Photon-list files of one grid directory, in lexicographic file-name order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGrid {
    paths: Vec<PathBuf>,
}

impl FileGrid {
    pub fn discover(directory: impl AsRef<Path>, pattern: &str) -> GridResult<Self> {
        let directory = directory.as_ref();
        let matcher = compile_pattern(pattern)?;
        let entries = fs::read_dir(directory).map_err(|source| {
            GridError::io_system(
                "IO.GRID_DIRECTORY",
                format!(
                    "failed to list grid directory '{}': {}",
                    directory.display(),
                    source
                ),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| {
                GridError::io_system(
                    "IO.GRID_DIRECTORY",
                    format!(
                        "failed to read entry in grid directory '{}': {}",
                        directory.display(),
                        source
                    ),
                )
            })?;
            let path = entry.path();
            let matches = path
                .file_name()
                .is_some_and(|name| matcher.is_match(Path::new(name)));
            if matches && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(Self { paths })
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl RunSource for FileGrid {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn label(&self, index: usize) -> String {
        self.paths
            .get(index)
            .map_or_else(|| format!("run #{}", index), |path| path.display().to_string())
    }

    fn load(&self, index: usize) -> GridResult<SimulationRun> {
        let path = self.paths.get(index).ok_or_else(|| {
            GridError::internal(
                "RUN.SOURCE_INDEX",
                format!("grid file index {} is out of range", index),
            )
        })?;
        read_photon_run(path)
    }
}

fn compile_pattern(pattern: &str) -> GridResult<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| {
            GridError::input_shape(
                "INPUT.GRID_PATTERN",
                format!("invalid grid file pattern '{}': {}", pattern, source),
            )
        })
}
