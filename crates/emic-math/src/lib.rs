//! emic math utilities.

pub mod math;

pub use math::chi_squared::{chi_squared_homogeneity, chi_squared_survival};
pub use math::entropy::{binary_entropy, entropy_bits, entropy_of_counts};
pub use math::gamma::{gamma_p, gamma_q};
pub use math::kolmogorov::{kolmogorov_q, ks_two_sample};
pub use math::linalg::solve_linear_system;
pub use math::stable::*;
pub use math::TestOutcome;
