/// Normalize arbitrary angles to [-π, π)
pub fn normalize_symmetric(angle: f64) -> f64 {
    use std::f64::consts::PI;
    let angle = (angle + PI) % (2.0 * PI);
    angle - PI * angle.signum()
}

/// Central meridian, in degrees, of a UTM zone
pub fn utm_central_meridian(zone: usize) -> f64 {
    -183.0 + 6.0 * zone as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        use std::f64::consts::PI;
        assert!((normalize_symmetric(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-14);
        assert!((normalize_symmetric(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-14);
        assert!((normalize_symmetric(0.25) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn central_meridians() {
        assert_eq!(utm_central_meridian(30), -3.0);
        assert_eq!(utm_central_meridian(31), 3.0);
        assert_eq!(utm_central_meridian(1), -177.0);
    }
}
