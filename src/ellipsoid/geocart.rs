use super::*;
use std::f64::consts::FRAC_PI_2;

// ----- Geographic <--> Cartesian conversion ----------------------------------

impl Ellipsoid {
    /// Geographic (longitude, latitude, ellipsoidal height) to geocentric
    /// cartesian coordinates, following Bowring (1976)
    #[must_use]
    #[allow(non_snake_case)]
    pub fn cartesian(&self, geographic: &Coor4D) -> Coor4D {
        let (lam, phi, h, t) = geographic.xyzt();

        let N = self.prime_vertical_radius_of_curvature(phi);
        let (sinphi, cosphi) = phi.sin_cos();
        let (sinlam, coslam) = lam.sin_cos();

        let X = (N + h) * cosphi * coslam;
        let Y = (N + h) * cosphi * sinlam;
        let Z = (N * (1.0 - self.eccentricity_squared()) + h) * sinphi;

        Coor4D::raw(X, Y, Z, t)
    }

    /// Geocentric cartesian to geographic coordinates, using the
    /// non-iterative Bowring (1985) formulation in the form given
    /// by Fukushima (1999), appendix B
    #[must_use]
    #[allow(non_snake_case)]
    pub fn geographic(&self, cartesian: &Coor4D) -> Coor4D {
        let (X, Y, Z, t) = cartesian.xyzt();

        let a = self.semimajor_axis();
        let b = self.semiminor_axis();
        let eps = self.second_eccentricity_squared();
        let es = self.eccentricity_squared();

        let lam = Y.atan2(X);
        let p = X.hypot(Y);

        // On the polar axis the latitude is ±90° and the height is |Z| - b
        if p < 1.0e-12 {
            let phi = FRAC_PI_2.copysign(Z);
            let h = Z.abs() - b;
            return Coor4D::raw(lam, phi, h, t);
        }

        let T = (Z * a) / (p * b);
        let c = 1.0 / (1.0 + T * T).sqrt();
        let s = c * T;

        let phi_num = Z + eps * b * s.powi(3);
        let phi_denom = p - es * a * c.powi(3);
        let phi = phi_num.atan2(phi_denom);

        let lenphi = phi_num.hypot(phi_denom);
        let sinphi = phi_num / lenphi;
        let cosphi = phi_denom / lenphi;

        let N = a / (1.0 - sinphi.powi(2) * es).sqrt();

        // Bowring (1985): better behaved than h = p / cosphi - N near the poles
        let h = p * cosphi + Z * sinphi - a * a / N;

        Coor4D::raw(lam, phi, h, t)
    }
}

// ----- Tests ---------------------------------------------------------------------
