use super::standard_normal;
use crate::error::{ModelError, Result};
use rand::RngCore;
use std::f64::consts::PI;

/// Univariate normal distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianDistribution {
    mean: f64,
    variance: f64,
}

impl Default for GaussianDistribution {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianDistribution {
    /// Standard normal distribution.
    pub fn new() -> Self {
        Self {
            mean: 0.0,
            variance: 1.0,
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidArgument` unless the variance is finite and strictly
    /// positive.
    pub fn with_params(mean: f64, variance: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(ModelError::invalid_argument("The mean must be finite."));
        }
        if !(variance.is_finite() && variance > 0.0) {
            return Err(ModelError::invalid_argument(
                "The variance must be finite and greater than 0.",
            ));
        }
        Ok(Self { mean, variance })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Replaces the parameters with fitted ones. A zero variance is accepted
    /// here (a fit on identical values), and reported by `probability` and
    /// `generate` instead.
    pub(crate) fn set_params(&mut self, mean: f64, variance: f64) {
        self.mean = mean;
        self.variance = variance;
    }

    pub fn ln_probability(&self, x: f64) -> Result<f64> {
        if !(self.variance > 0.0) {
            return Err(ModelError::SingularCovariance);
        }
        let centered = x - self.mean;
        Ok(-0.5 * centered * centered / self.variance - 0.5 * (2.0 * PI * self.variance).ln())
    }

    pub fn probability(&self, x: f64) -> Result<f64> {
        Ok(self.ln_probability(x)?.exp())
    }

    pub fn generate(&self, rng: &mut dyn RngCore) -> Result<f64> {
        if !(self.variance > 0.0) {
            return Err(ModelError::SingularCovariance);
        }
        Ok(self.mean + self.variance.sqrt() * standard_normal(rng))
    }
}
