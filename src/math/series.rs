/// The order of the series expansions behind the conformal latitude and
/// the Krüger transverse Mercator
pub const POLYNOMIAL_ORDER: usize = 6;

/// Two upper triangular matrices of polynomial coefficients (in the third
/// flattening, n), for computing the coefficients of a Fourier series
#[derive(Clone, Copy, Debug, Default)]
pub struct PolynomialCoefficients {
    pub fwd: [[f64; POLYNOMIAL_ORDER]; POLYNOMIAL_ORDER],
    pub inv: [[f64; POLYNOMIAL_ORDER]; POLYNOMIAL_ORDER],
}

/// Fourier coefficients for a forward/inverse pair of series. `etc` carries
/// ellipsoid specific scalars computed along with the coefficients
#[derive(Clone, Copy, Debug, Default)]
pub struct FourierCoefficients {
    pub fwd: [f64; POLYNOMIAL_ORDER],
    pub inv: [f64; POLYNOMIAL_ORDER],
    pub etc: [f64; 2],
}

// --- Taylor series polynomial evaluation ----

pub mod taylor {
    use super::FourierCoefficients;
    use super::PolynomialCoefficients;
    use super::POLYNOMIAL_ORDER;

    /// Evaluate the polynomials in `coefficients` at `arg`, giving the
    /// coefficients of the corresponding Fourier series. Row `i` of each
    /// matrix starts with `i` zeros, so the extra factor `arg` lifts the
    /// leading term to the power `i + 1`
    pub fn fourier_coefficients(
        arg: f64,
        coefficients: &PolynomialCoefficients,
    ) -> FourierCoefficients {
        let mut result = FourierCoefficients::default();
        for i in 0..POLYNOMIAL_ORDER {
            result.fwd[i] = arg * horner(arg, &coefficients.fwd[i]);
            result.inv[i] = arg * horner(arg, &coefficients.inv[i]);
        }
        result
    }

    /// Evaluate Σ cᵢ · xⁱ using Horner's scheme
    pub fn horner(arg: f64, coefficients: &[f64]) -> f64 {
        coefficients
            .iter()
            .rev()
            .fold(0., |value, c| value.mul_add(arg, *c))
    }
}

// --- Fourier series summation, using Clenshaw's recurrence ---

pub mod fourier {
    /// Evaluate Σ cᵢ sin( i · arg ), for i ∈ {order, ... , 1}
    pub fn sin(arg: f64, coefficients: &[f64]) -> f64 {
        let (sin_arg, cos_arg) = arg.sin_cos();
        let x = 2.0 * cos_arg;
        let mut c0 = 0.0;
        let mut c1 = 0.0;

        for c in coefficients.iter().rev() {
            (c1, c0) = (c0, x.mul_add(c0, c - c1));
        }
        sin_arg * c0
    }

    /// Evaluate Σ cᵢ sin( i · arg ), for complex `arg` = [re, im] and real
    /// coefficients
    pub fn complex_sin(arg: [f64; 2], coefficients: &[f64]) -> [f64; 2] {
        let (sin_r, cos_r) = arg[0].sin_cos();
        let hyp = [arg[1].sinh(), arg[1].cosh()];
        complex_sin_optimized_for_tmerc([sin_r, cos_r], hyp, coefficients)
    }

    /// As [complex_sin], but with the trigonometric and hyperbolic factors
    /// of the argument, `trig` = [sin re, cos re] and `hyp` = [sinh im, cosh im],
    /// precomputed by the caller. The forward transverse Mercator gets these
    /// for free.
    #[allow(unused_assignments)]
    #[inline(always)]
    pub fn complex_sin_optimized_for_tmerc(
        trig: [f64; 2],
        hyp: [f64; 2],
        coefficients: &[f64],
    ) -> [f64; 2] {
        let (sin_r, cos_r) = (trig[0], trig[1]);
        let (sinh_i, cosh_i) = (hyp[0], hyp[1]);
        let r = 2. * cos_r * cosh_i;
        let i = -2. * sin_r * sinh_i;

        let mut coefficients = coefficients.iter().rev();
        let Some(c) = coefficients.next() else {
            return [0.; 2];
        };

        let (mut hr2, mut hr1, mut hr) = (0., 0., *c);
        let (mut hi2, mut hi1, mut hi) = (0., 0., 0.);

        for c in coefficients {
            (hr2, hi2, hr1, hi1) = (hr1, hi1, hr, hi);
            hr = -hr2 + r * hr1 - i * hi1 + c;
            hi = -hi2 + i * hr1 + r * hi1;
        }

        let r = sin_r * cosh_i;
        let i = cos_r * sinh_i;
        [r * hr - i * hi, r * hi + i * hr]
    }
}

// ----- T E S T S ---------------------------------------------------------------------
