use crate::common::constants::HC_KEV_ANGSTROM;

pub fn stable_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for value in values {
        let corrected = value - correction;
        let next = sum + corrected;
        correction = (next - sum) - corrected;
        sum = next;
    }

    sum
}

/// Elementwise closeness in the usual `|a - b| <= atol + rtol * |b|` sense.
pub fn is_close(value: f64, reference: f64, rtol: f64, atol: f64) -> bool {
    (value - reference).abs() <= atol + rtol * reference.abs()
}

/// Weighted mean that skips entries with a non-finite value or a non-positive
/// (or non-finite) weight. Returns NaN when nothing is left to average.
pub fn masked_weighted_average(values: &[f64], weights: &[f64]) -> f64 {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (&value, &weight) in values.iter().zip(weights) {
        if !value.is_finite() || !weight.is_finite() || weight <= 0.0 {
            continue;
        }
        numerator += value * weight;
        denominator += weight;
    }

    if denominator > 0.0 {
        numerator / denominator
    } else {
        f64::NAN
    }
}

/// Photon energy in keV to wavelength in Å. Non-positive energies map to NaN.
pub fn energy_to_wavelength(energy_kev: f64) -> f64 {
    if energy_kev > 0.0 {
        HC_KEV_ANGSTROM / energy_kev
    } else {
        f64::NAN
    }
}

/// Probability-weighted mean and standard deviation. `None` when the total
/// weight is not positive.
pub fn weighted_mean_std(values: &[f64], weights: &[f64]) -> Option<(f64, f64)> {
    let total = stable_sum(weights.iter().copied());
    if total.is_nan() || total <= 0.0 {
        return None;
    }
    let mean = stable_sum(values.iter().zip(weights).map(|(v, w)| v * w)) / total;
    let variance = stable_sum(
        values
            .iter()
            .zip(weights)
            .map(|(v, w)| w * (v - mean) * (v - mean)),
    ) / total;
    Some((mean, variance.max(0.0).sqrt()))
}
