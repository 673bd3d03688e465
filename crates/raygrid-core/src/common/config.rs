//! Instrument configuration consumed by the grid analysis.
//!
//! The configuration is loaded once, validated, and then only ever shared by
//! reference; nothing in the analysis mutates it.

use crate::domain::{GridError, GridResult, OrderList};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_GRID_PATTERN: &str = "*.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApertureSpec {
    pub id: u32,
    pub channel: String,
    /// Geometric opening area in cm².
    pub area_cm2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelSpec {
    /// Position of the zero order along the dispersion coordinate.
    pub zero_order_x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentConfig {
    pub apertures: Vec<ApertureSpec>,
    pub channels: BTreeMap<String, ChannelSpec>,
    #[serde(default)]
    pub orders: OrderList,
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_pattern() -> String {
    DEFAULT_GRID_PATTERN.to_string()
}

impl Default for InstrumentConfig {
    /// Four channels; each aperture feeds the channel with the matching index.
    fn default() -> Self {
        let channels = ["1", "2", "1m", "2m"];
        let apertures = channels
            .iter()
            .enumerate()
            .map(|(index, channel)| ApertureSpec {
                id: index as u32,
                channel: (*channel).to_string(),
                area_cm2: 1.0,
            })
            .collect();
        let channels = channels
            .iter()
            .map(|channel| ((*channel).to_string(), ChannelSpec { zero_order_x: 0.0 }))
            .collect();
        Self {
            apertures,
            channels,
            orders: OrderList::default(),
            pattern: default_pattern(),
        }
    }
}

impl InstrumentConfig {
    pub fn from_path(path: impl AsRef<Path>) -> GridResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| {
            GridError::io_system(
                "IO.CONFIG_READ",
                format!(
                    "failed to read instrument config '{}': {}",
                    path.display(),
                    source
                ),
            )
        })?;
        Self::from_json_str(&content).map_err(|error| {
            GridError::new(
                error.category(),
                error.placeholder(),
                format!("{} ({})", error.message(), path.display()),
            )
        })
    }

    pub fn from_json_str(content: &str) -> GridResult<Self> {
        let config: Self = serde_json::from_str(content).map_err(|source| {
            GridError::input_shape(
                "INPUT.CONFIG_PARSE",
                format!("failed to parse instrument config: {}", source),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.apertures.is_empty() {
            return Err(GridError::input_shape(
                "INPUT.CONFIG_APERTURES",
                "instrument config must declare at least one aperture",
            ));
        }

        for (index, aperture) in self.apertures.iter().enumerate() {
            if self.apertures[..index]
                .iter()
                .any(|other| other.id == aperture.id)
            {
                return Err(GridError::input_shape(
                    "INPUT.CONFIG_APERTURES",
                    format!("aperture id {} is declared more than once", aperture.id),
                ));
            }
            if !aperture.area_cm2.is_finite() || aperture.area_cm2 <= 0.0 {
                return Err(GridError::input_shape(
                    "INPUT.CONFIG_APERTURE_AREA",
                    format!(
                        "aperture {} has invalid geometric area {}",
                        aperture.id, aperture.area_cm2
                    ),
                ));
            }
            if !self.channels.contains_key(&aperture.channel) {
                return Err(GridError::input_shape(
                    "INPUT.CONFIG_CHANNEL",
                    format!(
                        "aperture {} refers to unknown channel '{}'",
                        aperture.id, aperture.channel
                    ),
                ));
            }
        }

        Ok(())
    }

    pub fn aperture_ids(&self) -> Vec<u32> {
        self.apertures.iter().map(|aperture| aperture.id).collect()
    }

    pub fn aperture(&self, id: u32) -> Option<&ApertureSpec> {
        self.apertures.iter().find(|aperture| aperture.id == id)
    }

    /// Reference zero-order position for the channel fed by `aperture`.
    pub fn zero_order_position(&self, aperture: u32) -> GridResult<f64> {
        let spec = self.aperture(aperture).ok_or_else(|| {
            GridError::input_shape(
                "INPUT.UNKNOWN_APERTURE",
                format!("aperture {} is not declared in the instrument config", aperture),
            )
        })?;
        self.channels
            .get(&spec.channel)
            .map(|channel| channel.zero_order_x)
            .ok_or_else(|| {
                GridError::input_shape(
                    "INPUT.CONFIG_CHANNEL",
                    format!(
                        "aperture {} refers to unknown channel '{}'",
                        aperture, spec.channel
                    ),
                )
            })
    }

    /// Geometric areas in aperture-index order.
    pub fn geometric_areas(&self) -> Vec<f64> {
        self.apertures
            .iter()
            .map(|aperture| aperture.area_cm2)
            .collect()
    }
}
