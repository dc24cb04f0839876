//! Fixed precision rendering of coordinates and topocentric frame identifiers.

use crate::crs::split_code;
use crate::registry::Registry;
use crate::Error;

pub use crate::registry::{ANGLE_PRECISION, ENU_PRECISION, HEIGHT_PRECISION, LINEAR_PRECISION};

/// Output digits `(horizontal, vertical)` for coordinates in `identifier`
pub fn precision_of(registry: &Registry, identifier: &str) -> Result<(usize, usize), Error> {
    registry.precision_of(identifier)
}

/// `value` with exactly `digits` decimals
pub fn format_fixed(value: f64, digits: usize) -> String {
    format!("{value:.digits$}")
}

/// Render the identifier of the topocentric frame with its origin at
/// `(lon, lat, h)` in the geographic CRS `base`. EPSG codes are written
/// in their bare numeric form
pub fn enu_identifier(base: &str, lon: f64, lat: f64, h: f64) -> String {
    let base = match split_code(base) {
        ("EPSG", code) => code,
        _ => base,
    };
    format!(
        "ENU:{base};{};{};{}",
        format_fixed(lon, ANGLE_PRECISION),
        format_fixed(lat, ANGLE_PRECISION),
        format_fixed(h, HEIGHT_PRECISION)
    )
}

/// Render a coordinate tuple with the digits of its CRS
pub fn format_point(x: f64, y: f64, z: Option<f64>, digits: (usize, usize)) -> String {
    let mut text = format!(
        "{} {}",
        format_fixed(x, digits.0),
        format_fixed(y, digits.0)
    );
    if let Some(z) = z {
        text += " ";
        text += &format_fixed(z, digits.1);
    }
    text
}

// ----- T E S T S ---------------------------------------------------------------------
