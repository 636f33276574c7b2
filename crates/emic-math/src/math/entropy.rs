//! Shannon entropy in bits.

use super::stable::xlog2x;

/// Entropy of a probability vector in bits.
///
/// Zero entries contribute nothing. The vector is not renormalized; callers
/// pass distributions that already sum to one.
pub fn entropy_bits(probs: &[f64]) -> f64 {
    let h: f64 = -probs.iter().map(|&p| xlog2x(p)).sum::<f64>();
    // -0.0 and rounding noise below zero both collapse to 0.
    h.max(0.0)
}

/// Entropy in bits of the empirical distribution of a count vector.
///
/// An all-zero vector has zero entropy.
pub fn entropy_of_counts(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let h: f64 = -counts
        .iter()
        .map(|&c| xlog2x(c as f64 / total))
        .sum::<f64>();
    h.max(0.0)
}

/// Binary entropy H(p) in bits.
pub fn binary_entropy(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    entropy_bits(&[p, 1.0 - p])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_entropy() {
        assert!((entropy_bits(&[0.25; 4]) - 2.0).abs() < 1e-15);
        assert!((entropy_of_counts(&[7, 7]) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn point_mass_has_zero_entropy() {
        assert_eq!(entropy_bits(&[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(entropy_of_counts(&[0, 42]), 0.0);
        assert_eq!(entropy_of_counts(&[0, 0]), 0.0);
    }

    #[test]
    fn binary_entropy_values() {
        assert!((binary_entropy(0.5) - 1.0).abs() < 1e-15);
        assert_eq!(binary_entropy(0.0), 0.0);
        assert!(binary_entropy(1.5).is_nan());
        // H(1/3) = log2(3) - 2/3
        let expected = 3.0f64.log2() - 2.0 / 3.0;
        assert!((binary_entropy(1.0 / 3.0) - expected).abs() < 1e-12);
    }
}
