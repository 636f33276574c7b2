//! Two-sample tests deciding whether two histories predict differently.

use std::fmt;
use std::sync::Arc;

use emic_config::TestKind;
use emic_math::TestOutcome;

/// A hypothesis test on next-symbol count vectors.
///
/// The null hypothesis is that both samples come from the same distribution.
/// Implementations must be pure: the engine calls them from several threads
/// against a frozen partition.
pub trait DistinguishabilityTest: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn outcome(&self, a: &[u64], b: &[u64]) -> TestOutcome;

    /// True when the samples differ at significance `alpha`.
    fn distinguishable(&self, a: &[u64], b: &[u64], alpha: f64) -> bool {
        self.outcome(a, b).rejects(alpha)
    }
}

/// Pearson chi-squared test of homogeneity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChiSquaredTest;

impl DistinguishabilityTest for ChiSquaredTest {
    fn name(&self) -> &'static str {
        "chi_squared"
    }

    fn outcome(&self, a: &[u64], b: &[u64]) -> TestOutcome {
        emic_math::chi_squared_homogeneity(a, b)
    }
}

/// Two-sample Kolmogorov-Smirnov test over the symbol order.
#[derive(Debug, Clone, Copy, Default)]
pub struct KolmogorovSmirnovTest;

impl DistinguishabilityTest for KolmogorovSmirnovTest {
    fn name(&self) -> &'static str {
        "kolmogorov_smirnov"
    }

    fn outcome(&self, a: &[u64], b: &[u64]) -> TestOutcome {
        emic_math::ks_two_sample(a, b)
    }
}

/// The built-in test selected by `kind`.
pub fn test_for(kind: TestKind) -> Arc<dyn DistinguishabilityTest> {
    match kind {
        TestKind::ChiSquared => Arc::new(ChiSquaredTest),
        TestKind::KolmogorovSmirnov => Arc::new(KolmogorovSmirnovTest),
    }
}
