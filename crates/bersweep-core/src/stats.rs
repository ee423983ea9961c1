//! Error-Rate Statistics — normal quantiles and binomial intervals
//!
//! Statistical helpers for Monte Carlo error counting: the inverse
//! standard normal CDF (to turn a confidence level into a critical
//! value), the Wilson score interval (well-behaved for extreme
//! proportions and small counts, unlike the plain normal approximation),
//! and the Gaussian tail function Q(x) for theoretical reference curves.

/// Wilson score interval around an observed proportion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WilsonInterval {
    /// Lower bound, clamped to 0.
    pub lo: f64,
    /// Upper bound, clamped to 1.
    pub hi: f64,
    /// Interval half-width before clamping.
    pub half: f64,
}

/// Inverse standard normal CDF via Acklam's rational approximation.
///
/// Accurate to about 1.15e-9 over the open unit interval; returns NaN
/// for `p` outside (0, 1).
pub fn inv_norm_cdf(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        return f64::NAN;
    }

    const A: [f64; 6] = [
        -39.69683028665376,
        220.9460984245205,
        -275.9285104469687,
        138.3577518672690,
        -30.66479806614716,
        2.506628277459239,
    ];
    const B: [f64; 5] = [
        -54.47609879822406,
        161.5858368580409,
        -155.6989798598866,
        66.80131188771972,
        -13.28068155288572,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838,
        -2.549732539343734,
        4.374664141464968,
        2.938163982698783,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996,
        3.754408661907416,
    ];
    const P_LOW: f64 = 0.02425;
    const P_HIGH: f64 = 1.0 - P_LOW;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p > P_HIGH {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    }
}

/// Wilson score interval for `errs` successes in `bits` trials at
/// critical value `z`. Zero trials yield the full unit interval.
pub fn wilson_interval(errs: u64, bits: u64, z: f64) -> WilsonInterval {
    if bits == 0 {
        return WilsonInterval {
            lo: 0.0,
            hi: 1.0,
            half: 0.5,
        };
    }
    let n = bits as f64;
    let p = errs as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = z * ((p * (1.0 - p)) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    WilsonInterval {
        lo: (center - half).max(0.0),
        hi: (center + half).min(1.0),
        half,
    }
}

/// Gaussian tail function Q(x) = 0.5·erfc(x/√2).
pub fn q_function(x: f64) -> f64 {
    0.5 * erfc(x / std::f64::consts::SQRT_2)
}

/// Complementary error function, Abramowitz & Stegun 7.1.26.
fn erfc(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.3275911 * x.abs());
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    let result = poly * (-x * x).exp();
    if x >= 0.0 {
        result
    } else {
        2.0 - result
    }
}
