//! Calibration curves (resolving power and effective area per diffraction
//! order) from a grid of monoenergetic ray-trace runs.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
