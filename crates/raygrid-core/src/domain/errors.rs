use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GridResult<T> = Result<T, GridError>;
pub type AnalysisResult<T> = GridResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridErrorCategory {
    Success,
    ConsistencyError,
    EnergyConsistencyError,
    MissingEstimate,
    InputShapeError,
    IoSystemError,
    InternalError,
}

impl GridErrorCategory {
    pub const fn exit_mapping(self) -> ExitMapping {
        match self {
            Self::Success => ExitMapping {
                exit_code: 0,
                category_name: "Success",
                fatal: false,
            },
            Self::ConsistencyError => ExitMapping {
                exit_code: 2,
                category_name: "ConsistencyError",
                fatal: true,
            },
            Self::EnergyConsistencyError => ExitMapping {
                exit_code: 3,
                category_name: "EnergyConsistencyError",
                fatal: true,
            },
            Self::MissingEstimate => ExitMapping {
                exit_code: 0,
                category_name: "MissingEstimateError",
                fatal: false,
            },
            Self::InputShapeError => ExitMapping {
                exit_code: 4,
                category_name: "InputShapeError",
                fatal: true,
            },
            Self::IoSystemError => ExitMapping {
                exit_code: 5,
                category_name: "IoSystemError",
                fatal: true,
            },
            Self::InternalError => ExitMapping {
                exit_code: 6,
                category_name: "InternalError",
                fatal: true,
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_mapping().exit_code
    }

    pub const fn category_name(self) -> &'static str {
        self.exit_mapping().category_name
    }

    pub const fn is_fatal(self) -> bool {
        self.exit_mapping().fatal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitMapping {
    pub exit_code: i32,
    pub category_name: &'static str,
    pub fatal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridError {
    category: GridErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl GridError {
    pub fn new(
        category: GridErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn consistency(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(GridErrorCategory::ConsistencyError, placeholder, message)
    }

    pub fn energy_consistency(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(
            GridErrorCategory::EnergyConsistencyError,
            placeholder,
            message,
        )
    }

    pub fn missing_estimate(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(GridErrorCategory::MissingEstimate, placeholder, message)
    }

    pub fn input_shape(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(GridErrorCategory::InputShapeError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(GridErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(GridErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> GridErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub const fn is_fatal(&self) -> bool {
        self.category.is_fatal()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "WARN"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.category_name(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for GridError {}
