//! Core math modules.

pub mod chi_squared;
pub mod entropy;
pub mod gamma;
pub mod kolmogorov;
pub mod linalg;
pub mod stable;

use serde::{Deserialize, Serialize};

/// Result of a two-sample homogeneity test on count vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Test statistic (chi-squared value or KS distance).
    pub statistic: f64,
    /// Degrees of freedom (0 when the test carries no evidence).
    pub degrees_of_freedom: usize,
    /// Probability of a statistic at least this extreme under the null.
    pub p_value: f64,
}

impl TestOutcome {
    /// Outcome for samples that cannot be told apart for lack of evidence.
    pub const NO_EVIDENCE: TestOutcome = TestOutcome {
        statistic: 0.0,
        degrees_of_freedom: 0,
        p_value: 1.0,
    };

    /// True when the null hypothesis (same distribution) is rejected at `alpha`.
    pub fn rejects(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}
