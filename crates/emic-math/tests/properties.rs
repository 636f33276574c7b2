//! Property-based tests for emic-math numerical functions.
//!
//! Uses proptest to verify the homogeneity tests and entropy helpers behave
//! across many random count tables.

use emic_math::{
    binary_entropy, chi_squared_homogeneity, entropy_bits, entropy_of_counts, gamma_p, gamma_q,
    ks_two_sample, solve_linear_system,
};
use proptest::prelude::*;

const TOL: f64 = 1e-10;

fn counts_strategy(width: usize) -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..5_000, width)
}

// ============================================================================
// Incomplete gamma
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// P(a, x) + Q(a, x) = 1 everywhere in the valid domain.
    #[test]
    fn gamma_p_q_complementary(a in 0.05..50.0f64, x in 0.0..100.0f64) {
        let sum = gamma_p(a, x) + gamma_q(a, x);
        prop_assert!((sum - 1.0).abs() < 1e-8, "P+Q={} for a={}, x={}", sum, a, x);
    }

    /// Q(a, x) is non-increasing in x.
    #[test]
    fn gamma_q_monotone(a in 0.1..20.0f64, x in 0.0..50.0f64, dx in 0.0..5.0f64) {
        prop_assert!(gamma_q(a, x + dx) <= gamma_q(a, x) + 1e-9);
    }
}

// ============================================================================
// Homogeneity tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// p-values are valid probabilities.
    #[test]
    fn chi_squared_p_value_in_unit_interval(a in counts_strategy(4), b in counts_strategy(4)) {
        let out = chi_squared_homogeneity(&a, &b);
        prop_assert!(out.p_value >= 0.0 && out.p_value <= 1.0, "p={}", out.p_value);
        prop_assert!(out.statistic >= 0.0);
    }

    /// A sample is never distinguishable from a scaled copy of itself.
    #[test]
    fn chi_squared_scale_invariant_null(a in counts_strategy(3), k in 1u64..20) {
        let scaled: Vec<u64> = a.iter().map(|c| c * k).collect();
        let out = chi_squared_homogeneity(&a, &scaled);
        prop_assert!(out.statistic < TOL, "stat={}", out.statistic);
        prop_assert!(!out.rejects(0.05));
    }

    /// The KS statistic is a distance in [0, 1] and symmetric.
    #[test]
    fn ks_distance_bounds(a in counts_strategy(5), b in counts_strategy(5)) {
        let ab = ks_two_sample(&a, &b);
        let ba = ks_two_sample(&b, &a);
        prop_assert!(ab.statistic >= 0.0 && ab.statistic <= 1.0 + TOL);
        prop_assert!((ab.statistic - ba.statistic).abs() < TOL);
        prop_assert!(ab.p_value >= 0.0 && ab.p_value <= 1.0);
    }
}

// ============================================================================
// Entropy
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Entropy of k outcomes is bounded by log2(k).
    #[test]
    fn entropy_bounded_by_log_k(counts in prop::collection::vec(0u64..1_000, 1..8)) {
        let h = entropy_of_counts(&counts);
        let k = counts.len() as f64;
        prop_assert!(h >= 0.0);
        prop_assert!(h <= k.log2() + TOL, "H={} > log2({})", h, k);
    }

    /// Binary entropy is symmetric around 1/2.
    #[test]
    fn binary_entropy_symmetric(p in 0.0..=1.0f64) {
        prop_assert!((binary_entropy(p) - binary_entropy(1.0 - p)).abs() < TOL);
    }

    /// entropy_bits agrees with entropy_of_counts after normalization.
    #[test]
    fn entropy_counts_matches_probs(counts in prop::collection::vec(1u64..1_000, 1..6)) {
        let total: u64 = counts.iter().sum();
        let probs: Vec<f64> = counts.iter().map(|&c| c as f64 / total as f64).collect();
        prop_assert!((entropy_bits(&probs) - entropy_of_counts(&counts)).abs() < TOL);
    }
}

// ============================================================================
// Linear solve
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Diagonally dominant systems are always solvable and the solution checks out.
    #[test]
    fn diagonally_dominant_systems_solve(
        entries in prop::collection::vec(-1.0..1.0f64, 9),
        rhs in prop::collection::vec(-10.0..10.0f64, 3),
    ) {
        let mut a = vec![vec![0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                a[i][j] = entries[i * 3 + j];
            }
            a[i][i] += 4.0;
        }
        let x = solve_linear_system(a.clone(), rhs.clone()).expect("dominant system solvable");
        for i in 0..3 {
            let lhs: f64 = (0..3).map(|j| a[i][j] * x[j]).sum();
            prop_assert!((lhs - rhs[i]).abs() < 1e-9);
        }
    }
}
