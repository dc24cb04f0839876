//! Series expansions, angle bookkeeping and small rotations used by the operators

/// Normalization of angles
pub mod angular;

/// Fourier- and Taylor series
pub mod series;
pub use series::fourier;
pub use series::taylor;
pub use series::FourierCoefficients;
pub use series::PolynomialCoefficients;

/// The Gudermannian function, gd, which maps the isometric latitude of the
/// Mercator family to the conformal latitude, and back
pub mod gudermannian {
    pub fn fwd(arg: f64) -> f64 {
        arg.sinh().atan()
    }

    pub fn inv(arg: f64) -> f64 {
        arg.tan().asinh()
    }
}

/// Rotation taking geocentric cartesian differences into the local
/// east-north-up frame at geodetic longitude `lon` and latitude `lat`
/// (radians). Rows are the unit vectors of the E, N and U axes expressed
/// in the geocentric frame, so the transpose rotates back.
pub fn topocentric_rotation(lon: f64, lat: f64) -> [[f64; 3]; 3] {
    let (sl, cl) = lon.sin_cos();
    let (sp, cp) = lat.sin_cos();
    [
        [-sl, cl, 0.],
        [-sp * cl, -sp * sl, cp],
        [cp * cl, cp * sl, sp],
    ]
}

/// 3x3 matrix times 3-vector
pub fn rotate(r: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        r[0][0] * v[0] + r[0][1] * v[1] + r[0][2] * v[2],
        r[1][0] * v[0] + r[1][1] * v[1] + r[1][2] * v[2],
        r[2][0] * v[0] + r[2][1] * v[1] + r[2][2] * v[2],
    ]
}

/// Transposed 3x3 matrix times 3-vector
pub fn rotate_transposed(r: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        r[0][0] * v[0] + r[1][0] * v[1] + r[2][0] * v[2],
        r[0][1] * v[0] + r[1][1] * v[1] + r[2][1] * v[2],
        r[0][2] * v[0] + r[1][2] * v[1] + r[2][2] * v[2],
    ]
}
