//! Fraction of generated photons detected per discrete class (order, CCD, ...).

use crate::domain::PhotonRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClassColumn {
    #[default]
    Order,
    Ccd,
    Aperture,
}

impl ClassColumn {
    pub fn value(self, photon: &PhotonRecord) -> Option<i64> {
        match self {
            Self::Order => photon.order.map(i64::from),
            Self::Ccd => Some(i64::from(photon.ccd)),
            Self::Aperture => Some(i64::from(photon.aperture)),
        }
    }
}

/// Effective area relative to the geometric area of the generating aperture.
///
/// `photons` must hold every generated photon: the denominator is the
/// unfiltered count. Classes that never occur get exactly `0.0`, and an empty
/// photon list yields all zeros.
pub fn relative_area(photons: &[PhotonRecord], classes: &[i64], column: ClassColumn) -> Vec<f64> {
    let mut sums = vec![0.0; classes.len()];
    if photons.is_empty() {
        return sums;
    }

    for photon in photons.iter().filter(|photon| photon.is_detected()) {
        let Some(value) = column.value(photon) else {
            continue;
        };
        if let Some(index) = classes.iter().position(|class| *class == value) {
            sums[index] += photon.probability;
        }
    }

    let generated = photons.len() as f64;
    sums.iter_mut().for_each(|sum| *sum /= generated);
    sums
}

/// [`relative_area`] keyed by diffraction order.
pub fn relative_area_per_order(photons: &[PhotonRecord], orders: &[i32]) -> Vec<f64> {
    let classes = orders.iter().copied().map(i64::from).collect::<Vec<_>>();
    relative_area(photons, &classes, ClassColumn::Order)
}
