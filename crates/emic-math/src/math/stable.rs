//! Scalar helpers that stay finite where the naive formula does not.

use std::f64::consts::PI;

/// Lanczos approximation, g = 7, n = 9.
const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)]
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// ln √(2π)
const HALF_LN_TAU: f64 = 0.918_938_533_204_672_8;

/// `ln |Γ(z)|`.
///
/// NaN at the poles (zero and the negative integers) and for `-∞`; values
/// below one half go through the reflection formula.
pub fn log_gamma(z: f64) -> f64 {
    if z.is_nan() || z == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if z.is_infinite() {
        return f64::INFINITY;
    }
    if z <= 0.0 && z.fract() == 0.0 {
        return f64::NAN;
    }
    if z < 0.5 {
        // Γ(z) Γ(1 - z) = π / sin(πz)
        let reflected = (PI * z).sin().abs();
        return PI.ln() - reflected.ln() - log_gamma(1.0 - z);
    }

    let shifted = z - 1.0;
    let series = LANCZOS[1..]
        .iter()
        .zip(1u32..)
        .fold(LANCZOS[0], |acc, (c, k)| acc + c / (shifted + f64::from(k)));
    let base = shifted + LANCZOS_G + 0.5;
    HALF_LN_TAU + (shifted + 0.5) * base.ln() - base + series.ln()
}

/// One term of a Shannon sum in bits: `p log₂ p`, taking `0 log 0 = 0`.
///
/// Anything that is not a positive probability contributes nothing.
pub fn xlog2x(p: f64) -> f64 {
    if p > 0.0 {
        p * p.log2()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn log_gamma_matches_factorials() {
        close(log_gamma(1.0), 0.0, 1e-12);
        close(log_gamma(2.0), 0.0, 1e-12);
        close(log_gamma(5.0), 24f64.ln(), 1e-10);
        close(log_gamma(11.0), 3_628_800f64.ln(), 1e-9);
    }

    #[test]
    fn log_gamma_half_integers() {
        close(log_gamma(0.5), 0.5 * PI.ln(), 1e-10);
        // Γ(-1/2) = -2√π
        close(log_gamma(-0.5), (2.0 * PI.sqrt()).ln(), 1e-10);
    }

    #[test]
    fn log_gamma_poles() {
        assert!(log_gamma(0.0).is_nan());
        assert!(log_gamma(-3.0).is_nan());
        assert!(log_gamma(f64::NAN).is_nan());
        assert_eq!(log_gamma(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn xlog2x_terms() {
        assert_eq!(xlog2x(0.0), 0.0);
        assert_eq!(xlog2x(-0.3), 0.0);
        assert_eq!(xlog2x(f64::NAN), 0.0);
        assert_eq!(xlog2x(1.0), 0.0);
        close(xlog2x(0.5), -0.5, 1e-15);
        close(xlog2x(0.25), -0.5, 1e-15);
    }
}
