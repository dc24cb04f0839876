use super::*;

// ----- Conformal latitude and the meridian arc ----------------------------------

impl Ellipsoid {
    /// Coefficients for the conformal latitude series. `etc[0]` carries the
    /// normalized meridian arc unit, which the transverse Mercator needs too.
    pub fn coefficients_for_conformal_latitude_computations(&self) -> FourierCoefficients {
        let n = self.third_flattening();
        let mut coefficients = taylor::fourier_coefficients(n, &CONFORMAL);
        coefficients.etc[0] = self.normalized_meridian_arc_unit();
        coefficients
    }

    /// Geographic latitude, 𝜙, to conformal, 𝜒
    pub fn latitude_geographic_to_conformal(
        &self,
        geographic: f64,
        coefficients: &FourierCoefficients,
    ) -> f64 {
        geographic + fourier::sin(2. * geographic, &coefficients.fwd)
    }

    /// Conformal latitude, 𝜒, to geographic, 𝜙
    pub fn latitude_conformal_to_geographic(
        &self,
        conformal: f64,
        coefficients: &FourierCoefficients,
    ) -> f64 {
        conformal + fourier::sin(2. * conformal, &coefficients.inv)
    }

    /// The normalized meridian arc unit, Qn, i.e. the mean length of one
    /// radian of the meridian, divided by the semimajor axis
    #[must_use]
    pub fn normalized_meridian_arc_unit(&self) -> f64 {
        let n = self.third_flattening();
        taylor::horner(n * n, &MERIDIAN_ARC_COEFFICIENTS) / (1. + n)
    }
}

/// Series in n² for the normalized meridian arc unit (Karney 2011, eq. 14)
const MERIDIAN_ARC_COEFFICIENTS: [f64; 5] = [1., 1. / 4., 1. / 64., 1. / 256., 25. / 16384.];

/// Polynomials in n for the coefficients of the geographic <-> conformal
/// latitude series (Karney 2011, eq. 10-11)
#[rustfmt::skip]
const CONFORMAL: PolynomialCoefficients = PolynomialCoefficients {
    fwd: [
        [-2., 2. / 3., 4. / 3., -82. / 45., 32. / 45., 4642. / 4725.],
        [0., 5. / 3., -16. / 15., -13. / 9., 904. / 315., -1522. / 945.],
        [0., 0., -26. / 15., 34. / 21., 8. / 5., -12686. / 2835.],
        [0., 0., 0., 1237. / 630., -12. / 5., -24832. / 14175.],
        [0., 0., 0., 0., -734. / 315., 109598. / 31185.],
        [0., 0., 0., 0., 0., 444337. / 155925.]
    ],
    inv: [
        [2., -2. / 3., -2., 116. / 45., 26. / 45., -2854. / 675.],
        [0., 7. / 3., -8. / 5., -227. / 45., 2704. / 315., 2323. / 945.],
        [0., 0., 56. / 15., -136. / 35., -1262. / 105., 73814. / 2835.],
        [0., 0., 0., 4279. / 630., -332. / 35., -399572. / 14175.],
        [0., 0., 0., 0., 4174. / 315., -144838. / 6237.],
        [0., 0., 0., 0., 0., 601676. / 22275.]
    ],
};

// ----- Tests ---------------------------------------------------------------------
