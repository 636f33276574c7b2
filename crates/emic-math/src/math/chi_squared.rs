//! Pearson chi-squared test of homogeneity for two count vectors.
//!
//! The two samples form a 2×k contingency table. Columns where both samples
//! are zero carry no information and are dropped, so the degrees of freedom
//! are `(observed columns) - 1`. A table with a single observed column (or an
//! empty sample) cannot reject homogeneity and yields `p = 1`.

use super::gamma::gamma_q;
use super::TestOutcome;

/// Survival function of the chi-squared distribution with `df` degrees of freedom.
pub fn chi_squared_survival(statistic: f64, df: usize) -> f64 {
    if df == 0 || statistic.is_nan() {
        return f64::NAN;
    }
    if statistic <= 0.0 {
        return 1.0;
    }
    gamma_q(df as f64 / 2.0, statistic / 2.0)
}

/// Chi-squared homogeneity test between two count vectors of equal length.
///
/// Vectors of different length are compared over the shorter prefix padded
/// with zeros.
pub fn chi_squared_homogeneity(a: &[u64], b: &[u64]) -> TestOutcome {
    let n_a: u64 = a.iter().sum();
    let n_b: u64 = b.iter().sum();
    if n_a == 0 || n_b == 0 {
        return TestOutcome::NO_EVIDENCE;
    }

    let total = (n_a + n_b) as f64;
    let frac_a = n_a as f64 / total;
    let frac_b = n_b as f64 / total;
    let width = a.len().max(b.len());

    let mut statistic = 0.0;
    let mut columns = 0usize;
    for j in 0..width {
        let obs_a = a.get(j).copied().unwrap_or(0) as f64;
        let obs_b = b.get(j).copied().unwrap_or(0) as f64;
        let column = obs_a + obs_b;
        if column == 0.0 {
            continue;
        }
        columns += 1;
        let exp_a = column * frac_a;
        let exp_b = column * frac_b;
        statistic += (obs_a - exp_a).powi(2) / exp_a + (obs_b - exp_b).powi(2) / exp_b;
    }

    if columns < 2 {
        return TestOutcome::NO_EVIDENCE;
    }
    let df = columns - 1;
    TestOutcome {
        statistic,
        degrees_of_freedom: df,
        p_value: chi_squared_survival(statistic, df),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survival_two_df_is_exponential() {
        for &x in &[0.5_f64, 2.0, 5.991] {
            let expected = (-x / 2.0).exp();
            assert!((chi_squared_survival(x, 2) - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn survival_critical_value_one_df() {
        // 3.841 is the 95th percentile of chi2(1).
        let p = chi_squared_survival(3.841_458_820_694_124, 1);
        assert!((p - 0.05).abs() < 1e-6, "p={p}");
    }

    #[test]
    fn identical_proportions_do_not_reject() {
        let out = chi_squared_homogeneity(&[500, 500], &[1000, 1000]);
        assert_eq!(out.degrees_of_freedom, 1);
        assert!(out.statistic.abs() < 1e-12);
        assert!(!out.rejects(0.05));
    }

    #[test]
    fn very_different_proportions_reject() {
        let out = chi_squared_homogeneity(&[900, 100], &[100, 900]);
        assert!(out.rejects(0.001), "p={}", out.p_value);
    }

    #[test]
    fn empty_sample_is_no_evidence() {
        let out = chi_squared_homogeneity(&[0, 0], &[10, 5]);
        assert_eq!(out, TestOutcome::NO_EVIDENCE);
    }

    #[test]
    fn single_shared_column_is_no_evidence() {
        let out = chi_squared_homogeneity(&[40, 0, 0], &[7, 0, 0]);
        assert_eq!(out.degrees_of_freedom, 0);
        assert_eq!(out.p_value, 1.0);
    }

    #[test]
    fn zero_columns_are_dropped() {
        let with_gap = chi_squared_homogeneity(&[30, 0, 70], &[60, 0, 40]);
        let compact = chi_squared_homogeneity(&[30, 70], &[60, 40]);
        assert_eq!(with_gap.degrees_of_freedom, compact.degrees_of_freedom);
        assert!((with_gap.statistic - compact.statistic).abs() < 1e-12);
    }

    #[test]
    fn symmetric_in_arguments() {
        let ab = chi_squared_homogeneity(&[12, 30, 8], &[40, 22, 19]);
        let ba = chi_squared_homogeneity(&[40, 22, 19], &[12, 30, 8]);
        assert!((ab.statistic - ba.statistic).abs() < 1e-9);
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
    }
}
