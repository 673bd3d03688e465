//! Best-effort checks that runs of one grid come from the same setup.
//!
//! Metadata does not describe the full instrument configuration (the number
//! of channels, for example, is not recorded), so passing these checks is not
//! a proof that two runs are comparable.

use crate::common::constants::{CONSISTENCY_KEYS, ENERGY_ATOL, ENERGY_RTOL};
use crate::domain::{GridError, GridResult, MetaValue, RunMetadata, SimulationRun};
use crate::numerics::is_close;

pub fn check_runs_consistent(meta: &RunMetadata, reference: &RunMetadata) -> GridResult<()> {
    for key in CONSISTENCY_KEYS {
        let lhs = meta.get(key);
        let rhs = reference.get(key);
        if !optional_meta_values_equal(lhs, rhs) {
            return Err(GridError::consistency(
                "CONSISTENCY.META_MISMATCH",
                format!(
                    "metadata key '{}' differs: {} vs reference {}",
                    key,
                    render_optional(lhs),
                    render_optional(rhs)
                ),
            ));
        }
    }
    Ok(())
}

pub fn check_energy_uniform(run: &SimulationRun) -> GridResult<()> {
    let Some(reference) = run.energy() else {
        return Ok(());
    };

    if let Some((index, photon)) = run
        .photons
        .iter()
        .enumerate()
        .find(|(_, photon)| !is_close(photon.energy, reference, ENERGY_RTOL, ENERGY_ATOL))
    {
        return Err(GridError::energy_consistency(
            "ENERGY.NOT_UNIFORM",
            format!(
                "photon {} has energy {} keV but the run starts at {} keV",
                index, photon.energy, reference
            ),
        ));
    }
    Ok(())
}

fn optional_meta_values_equal(lhs: Option<&MetaValue>, rhs: Option<&MetaValue>) -> bool {
    match (lhs, rhs) {
        (None, None) => true,
        (Some(lhs), Some(rhs)) => meta_values_equal(lhs, rhs),
        _ => false,
    }
}

/// Numbers compare by value so that `23` and `23.0` are the same pointing.
fn meta_values_equal(lhs: &MetaValue, rhs: &MetaValue) -> bool {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        _ => lhs == rhs,
    }
}

fn render_optional(value: Option<&MetaValue>) -> String {
    value.map_or_else(|| "<missing>".to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::{check_energy_uniform, check_runs_consistent};
    use crate::common::constants::CONSISTENCY_KEYS;
    use crate::domain::{GridErrorCategory, PhotonRecord, RunMetadata, SimulationRun};
    use serde_json::json;

    fn reference_meta() -> RunMetadata {
        RunMetadata::new()
            .with("CREATOR", "raytrace")
            .with("MARXSVER", "1.2")
            .with("ARCUSVER", "0.9")
            .with("ARCDATHA", "abc123")
            .with("SATELLIT", "ARCUS")
            .with("COORDSYS", "ICRS")
            .with("RA_PNT", 23.0)
            .with("DEC_PNT", 45.0)
            .with("ROLL_PNT", 0.0)
            .with("RA_NOM", 23.0)
            .with("DEC_NOM", 45.0)
            .with("ROLL_NOM", 0.0)
    }

    fn run_with_energies(energies: &[f64]) -> SimulationRun {
        let photons = energies
            .iter()
            .map(|&energy| PhotonRecord {
                energy,
                probability: 1.0,
                aperture: 0,
                order: Some(0),
                ccd: 0,
                det_x: 0.0,
                det_y: 0.0,
            })
            .collect();
        SimulationRun::new(RunMetadata::new(), photons)
    }

    #[test]
    fn identical_metadata_is_consistent() {
        let meta = reference_meta();
        check_runs_consistent(&meta, &meta).expect("metadata should match itself");
        check_runs_consistent(&RunMetadata::new(), &RunMetadata::new())
            .expect("empty metadata should match itself");
    }

    #[test]
    fn changing_any_checked_key_fails() {
        let reference = reference_meta();
        for key in CONSISTENCY_KEYS {
            let changed = reference.clone().with(key, json!("something else"));
            let error = check_runs_consistent(&changed, &reference)
                .expect_err("changed key should be detected");
            assert_eq!(error.category(), GridErrorCategory::ConsistencyError);
            assert!(error.message().contains(key), "message should name {key}");
        }
    }

    #[test]
    fn missing_key_on_one_side_fails() {
        let reference = reference_meta();
        let mut partial = RunMetadata::new();
        for (key, value) in reference.iter().filter(|(key, _)| key.as_str() != "RA_PNT") {
            partial.insert(key.clone(), value.clone());
        }
        let error = check_runs_consistent(&partial, &reference).expect_err("should fail");
        assert!(error.message().contains("<missing>"));
    }

    #[test]
    fn unchecked_keys_and_integer_floats_are_tolerated() {
        let reference = reference_meta();
        let other = reference
            .clone()
            .with("EXPOSURE", 99)
            .with("RA_PNT", json!(23));
        check_runs_consistent(&other, &reference).expect("only checked keys matter");
    }

    #[test]
    fn energy_uniformity_accepts_empty_single_and_tiny_jitter() {
        check_energy_uniform(&run_with_energies(&[])).expect("empty run passes");
        check_energy_uniform(&run_with_energies(&[1.0])).expect("single record passes");
        check_energy_uniform(&run_with_energies(&[1.0, 1.0 + 1.0e-9, 1.0]))
            .expect("rounding noise passes");
    }

    #[test]
    fn energy_uniformity_rejects_second_energy() {
        let error = check_energy_uniform(&run_with_energies(&[1.0, 1.0, 1.5]))
            .expect_err("mixed energies should fail");
        assert_eq!(error.category(), GridErrorCategory::EnergyConsistencyError);
        assert!(error.message().starts_with("photon 2 "));
    }
}
