use super::Opdf;
use crate::data::ObservationReal;
use crate::distributions::{weighted_fit_scalar, GaussianDistribution};
use crate::error::Result;
use rand::RngCore;
use std::fmt::{self, Display, Formatter};

/// Univariate Gaussian emission model over [`ObservationReal`]s.
#[derive(Clone, Debug, Default)]
pub struct OpdfGaussian {
    distribution: GaussianDistribution,
}

impl OpdfGaussian {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mean: f64, variance: f64) -> Result<Self> {
        Ok(Self {
            distribution: GaussianDistribution::with_params(mean, variance)?,
        })
    }

    pub fn mean(&self) -> f64 {
        self.distribution.mean()
    }

    pub fn variance(&self) -> f64 {
        self.distribution.variance()
    }
}

impl Opdf<ObservationReal> for OpdfGaussian {
    fn probability(&self, observation: &ObservationReal) -> Result<f64> {
        self.distribution.probability(observation.value)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Result<ObservationReal> {
        Ok(ObservationReal::new(self.distribution.generate(rng)?))
    }

    fn fit_weighted(&mut self, observations: &[ObservationReal], weights: &[f64]) -> Result<()> {
        let values: Vec<f64> = observations.iter().map(|o| o.value).collect();
        let (mean, variance) = weighted_fit_scalar(&values, weights)?;
        self.distribution.set_params(mean, variance);
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Opdf<ObservationReal>>> {
        Ok(Box::new(self.clone()))
    }
}

impl Display for OpdfGaussian {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Gaussian distribution --- Mean: {} Variance {}",
            self.mean(),
            self.variance()
        )
    }
}
