use crate::authoring::*;

mod geocart;
mod latitudes;

/// A biaxial ellipsoid of revolution, given by its semimajor axis and flattening
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    a: f64,
    f: f64,
}

/// GRS80 is the default ellipsoid.
impl Default for Ellipsoid {
    fn default() -> Ellipsoid {
        Ellipsoid::new(6_378_137.0, 1. / 298.257_222_100_882_7)
    }
}

/// The named ellipsoids known by [`Ellipsoid::named`]: name, semimajor axis
/// and reciprocal flattening.
#[rustfmt::skip]
pub const ELLIPSOID_LIST: [(&str, f64, f64); 9] = [
    ("GRS80",   6_378_137.0,   298.257_222_100_882_7),
    ("WGS84",   6_378_137.0,   298.257_223_563),
    ("intl",    6_378_388.0,   297.0),
    ("airy",    6_377_563.396, 299.324_964_6),
    ("bessel",  6_377_397.155, 299.152_812_8),
    ("clrk66",  6_378_206.4,   294.978_698_2),
    ("clrk80",  6_378_249.145, 293.465),
    ("Helmert", 6_378_200.0,   298.3),
    ("struve",  6_378_298.3,   294.73),
];

impl Ellipsoid {
    /// User defined ellipsoid
    #[must_use]
    pub fn new(semimajor_axis: f64, flattening: f64) -> Ellipsoid {
        Ellipsoid {
            a: semimajor_axis,
            f: flattening,
        }
    }

    /// Predefined ellipsoid, or an ad hoc one given as `a, rf`, i.e.
    /// semimajor axis and reciprocal flattening
    pub fn named(name: &str) -> Result<Ellipsoid, Error> {
        for (id, a, rf) in ELLIPSOID_LIST {
            if id == name {
                return Ok(Ellipsoid::new(a, 1. / rf));
            }
        }

        let parts: Vec<&str> = name.split(',').map(str::trim).collect();
        if parts.len() == 2 {
            if let (Ok(a), Ok(rf)) = (parts[0].parse::<f64>(), parts[1].parse::<f64>()) {
                let f = if rf == 0. { 0. } else { 1. / rf };
                return Ok(Ellipsoid::new(a, f));
            }
        }

        Err(Error::NotFound(name.to_string(), ": Ellipsoid".to_string()))
    }

    // ----- Axes and flattenings --------------------------------------------------

    /// The semimajor axis, *a*
    #[must_use]
    pub fn semimajor_axis(&self) -> f64 {
        self.a
    }

    /// The semiminor axis, *b*
    #[must_use]
    pub fn semiminor_axis(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// The flattening, *f = (a - b)/a*
    #[must_use]
    pub fn flattening(&self) -> f64 {
        self.f
    }

    /// The reciprocal flattening, *1/f*. Zero for a sphere
    #[must_use]
    pub fn reciprocal_flattening(&self) -> f64 {
        if self.f == 0. {
            return 0.;
        }
        1. / self.f
    }

    /// The third flattening, *n = (a - b) / (a + b) = f / (2 - f)*
    #[must_use]
    pub fn third_flattening(&self) -> f64 {
        self.f / (2.0 - self.f)
    }

    // ----- Eccentricities --------------------------------------------------------

    /// The squared eccentricity *e² = (a² - b²) / a²*.
    #[must_use]
    pub fn eccentricity_squared(&self) -> f64 {
        self.f * (2_f64 - self.f)
    }

    /// The squared second eccentricity *e'² = (a² - b²) / b² = e² / (1 - e²)*
    #[must_use]
    pub fn second_eccentricity_squared(&self) -> f64 {
        let es = self.eccentricity_squared();
        es / (1.0 - es)
    }

    // ----- Curvatures ------------------------------------------------------------

    /// Radius of curvature in the prime vertical, *N*
    #[must_use]
    pub fn prime_vertical_radius_of_curvature(&self, latitude: f64) -> f64 {
        if self.f == 0.0 {
            return self.a;
        }
        self.a / (1.0 - latitude.sin().powi(2) * self.eccentricity_squared()).sqrt()
    }
}

// ----- Tests ---------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_ad_hoc() -> Result<(), Error> {
        let ellps = Ellipsoid::named("intl")?;
        assert_eq!(ellps.semimajor_axis(), 6378388.0);
        assert_eq!(ellps.flattening(), 1. / 297.);
        assert!((ellps.reciprocal_flattening() - 297.).abs() < 1e-10);

        let ellps = Ellipsoid::named("6378137, 298.257223563")?;
        assert_eq!(ellps, Ellipsoid::named("WGS84")?);

        let sphere = Ellipsoid::named("6371000, 0")?;
        assert_eq!(sphere.flattening(), 0.);
        assert_eq!(sphere.prime_vertical_radius_of_curvature(1.), 6371000.);

        assert!(matches!(
            Ellipsoid::named("Pluto"),
            Err(Error::NotFound(_, _))
        ));
        Ok(())
    }

    #[test]
    fn shape_parameters() -> Result<(), Error> {
        let ellps = Ellipsoid::named("GRS80")?;
        assert!((ellps.semiminor_axis() - 6_356_752.314_140_348).abs() < 1e-8);
        assert!((ellps.eccentricity_squared() - 0.006_694_380_022_903_417).abs() < 1e-14);
        assert!((ellps.second_eccentricity_squared() - 0.006_739_496_775_481_6).abs() < 1e-14);
        assert!((ellps.third_flattening() - 0.001_679_220_394_629_406).abs() < 1e-14);
        Ok(())
    }
}
