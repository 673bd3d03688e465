//! Physical and numerical constants shared by the analysis components.

/// Planck constant times speed of light in keV·Å (CODATA 2018).
pub const HC_KEV_ANGSTROM: f64 = 12.398_419_843_320_026_f64;

/// Ratio between the FWHM and the standard deviation of a Gaussian.
pub const GAUSSIAN_FWHM_FACTOR: f64 = 2.3548_f64;

/// Relative and absolute tolerance used when comparing photon energies.
pub const ENERGY_RTOL: f64 = 1.0e-5_f64;
pub const ENERGY_ATOL: f64 = 1.0e-8_f64;

/// An order needs more photons than this for a centroid/width fit.
pub const MIN_PHOTONS_FOR_FIT: usize = 20;

pub const SIGMA_CLIP_THRESHOLD: f64 = 3.0_f64;
pub const SIGMA_CLIP_MAX_ITERATIONS: usize = 5;

/// Metadata keys that identify a consistent simulation setup.
pub const CONSISTENCY_KEYS: [&str; 12] = [
    "CREATOR", "MARXSVER", "ARCUSVER", "ARCDATHA", "SATELLIT", "COORDSYS", "RA_PNT", "DEC_PNT",
    "ROLL_PNT", "RA_NOM", "DEC_NOM", "ROLL_NOM",
];

#[cfg(test)]
mod tests {
    use super::{CONSISTENCY_KEYS, GAUSSIAN_FWHM_FACTOR, HC_KEV_ANGSTROM};

    #[test]
    fn fwhm_factor_matches_gaussian_definition() {
        let exact = 2.0 * (2.0 * std::f64::consts::LN_2).sqrt();
        assert!((GAUSSIAN_FWHM_FACTOR - exact).abs() < 1.0e-4);
    }

    #[test]
    fn one_kev_is_about_twelve_angstrom() {
        assert!((HC_KEV_ANGSTROM - 12.398).abs() < 1.0e-3);
    }

    #[test]
    fn consistency_keys_are_unique() {
        for (index, key) in CONSISTENCY_KEYS.iter().enumerate() {
            assert!(!CONSISTENCY_KEYS[..index].contains(key), "duplicate key {key}");
        }
    }
}
