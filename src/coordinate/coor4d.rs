use super::*;
use std::ops::{Add, Index, IndexMut, Sub};

/// Generic 4D coordinate tuple, with no fixed interpretation of the elements.
/// Geographic coordinates are stored as longitude, latitude (radians),
/// ellipsoidal height and time.
#[derive(Debug, Default, PartialEq, Copy, Clone)]
pub struct Coor4D(pub [f64; 4]);

// ----- O P E R A T O R   T R A I T S -------------------------------------------------

impl Index<usize> for Coor4D {
    type Output = f64;
    fn index(&self, i: usize) -> &Self::Output {
        &self.0[i]
    }
}

impl IndexMut<usize> for Coor4D {
    fn index_mut(&mut self, i: usize) -> &mut Self::Output {
        &mut self.0[i]
    }
}

impl Add for Coor4D {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Coor4D([
            self.0[0] + other.0[0],
            self.0[1] + other.0[1],
            self.0[2] + other.0[2],
            self.0[3] + other.0[3],
        ])
    }
}

impl Sub for Coor4D {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Coor4D([
            self.0[0] - other.0[0],
            self.0[1] - other.0[1],
            self.0[2] - other.0[2],
            self.0[3] - other.0[3],
        ])
    }
}

// ----- A N G U L A R   U N I T S -------------------------------------------

impl AngularUnits for Coor4D {
    fn to_radians(self) -> Self {
        Coor4D::raw(self[0].to_radians(), self[1].to_radians(), self[2], self[3])
    }

    fn to_degrees(self) -> Self {
        Coor4D::raw(self[0].to_degrees(), self[1].to_degrees(), self[2], self[3])
    }

    fn to_geo(self) -> Self {
        Coor4D::raw(self[1].to_degrees(), self[0].to_degrees(), self[2], self[3])
    }
}

// ----- C O N S T R U C T O R S ---------------------------------------------

impl Coor4D {
    /// A `Coor4D` from latitude/longitude/height/time, with the angular input in degrees
    #[must_use]
    pub fn geo(latitude: f64, longitude: f64, height: f64, time: f64) -> Coor4D {
        Coor4D([longitude.to_radians(), latitude.to_radians(), height, time])
    }

    /// A `Coor4D` from longitude/latitude/height/time, with the angular input in degrees
    #[must_use]
    pub fn gis(longitude: f64, latitude: f64, height: f64, time: f64) -> Coor4D {
        Coor4D([longitude.to_radians(), latitude.to_radians(), height, time])
    }

    /// A `Coor4D` from four numbers, taken as is
    #[must_use]
    pub fn raw(first: f64, second: f64, third: f64, fourth: f64) -> Coor4D {
        Coor4D([first, second, third, fourth])
    }

    /// A `Coor4D` consisting of 4 `NaN`s
    #[must_use]
    pub fn nan() -> Coor4D {
        Coor4D([f64::NAN, f64::NAN, f64::NAN, f64::NAN])
    }

    /// A `Coor4D` consisting of 4 `0`s
    #[must_use]
    pub fn origin() -> Coor4D {
        Coor4D([0., 0., 0., 0.])
    }

    /// True if any of the spatial elements is NaN
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self[0].is_nan() || self[1].is_nan() || self[2].is_nan()
    }

    pub fn xy(&self) -> (f64, f64) {
        (self[0], self[1])
    }

    pub fn xyz(&self) -> (f64, f64, f64) {
        (self[0], self[1], self[2])
    }

    pub fn xyzt(&self) -> (f64, f64, f64, f64) {
        (self[0], self[1], self[2], self[3])
    }

    /// Euclidean distance between two points in the 2D plane, spanned by
    /// the first two coordinates
    #[must_use]
    pub fn hypot2(&self, other: &Self) -> f64 {
        (self[0] - other[0]).hypot(self[1] - other[1])
    }

    /// Euclidean distance between two points in 3D space, spanned by the
    /// first three coordinates
    #[must_use]
    pub fn hypot3(&self, other: &Self) -> f64 {
        (self[0] - other[0])
            .hypot(self[1] - other[1])
            .hypot(self[2] - other[2])
    }
}

// ----- T E S T S ---------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord() {
        let c = Coor4D::raw(12., 55., 100., 0.).to_radians();
        let d = Coor4D::gis(12., 55., 100., 0.);
        assert_eq!(c, d);
        assert_eq!(d, Coor4D::geo(55., 12., 100., 0.));
        assert_eq!(d[0], 12f64.to_radians());
        let e = d.to_geo();
        assert!((e[0] - 55.).abs() < 1e-12);
        assert!((e[1] - 12.).abs() < 1e-12);
        let f = d.to_degrees();
        assert!((f[0] - 12.).abs() < 1e-12);
        assert!((f[1] - 55.).abs() < 1e-12);
        assert_eq!(f[2], 100.);
        assert!(!d.is_nan());
        assert!(Coor4D::nan().is_nan());
    }

    #[test]
    fn arithmetic_and_distances() {
        let a = Coor4D([1., 2., 3., 4.]);
        let b = Coor4D([4., 3., 2., 1.]);
        assert_eq!(a + b, Coor4D([5., 5., 5., 5.]));
        assert_eq!((a + b) - b, a);

        let t = 1000_f64;
        let p0 = Coor4D::origin();
        let p1 = Coor4D::raw(t, t, t, 0.);
        assert_eq!(p0.hypot2(&p1), t.hypot(t));
        assert_eq!(p0.hypot3(&p1), t.hypot(t).hypot(t));
    }
}
