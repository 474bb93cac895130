/// Weighted maximum-likelihood estimation of Gaussian parameters
pub mod fit;
/// Univariate Gaussian distribution
pub mod gaussian;
/// Multivariate Gaussian distribution
pub mod multi_gaussian;

pub use fit::{uniform_weights, weighted_fit, weighted_fit_scalar};
pub use gaussian::GaussianDistribution;
pub use multi_gaussian::MultiGaussianDistribution;

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use std::f64::consts::PI;

/// Builds the random source used by generators: seeded when a seed is
/// given, from entropy otherwise.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Draws one standard normal variate with the Box-Muller transform.
pub(crate) fn standard_normal(rng: &mut dyn RngCore) -> f64 {
    // gen() is in [0, 1), the logarithm needs (0, 1]
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
