use super::Opdf;
use crate::data::ObservationVector;
use crate::distributions::{weighted_fit, MultiGaussianDistribution};
use crate::error::{ModelError, Result};
use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use std::fmt::{self, Display, Formatter};
use tracing::trace;

/// Multivariate Gaussian emission model over [`ObservationVector`]s.
#[derive(Clone, Debug)]
pub struct OpdfMultiGaussian {
    distribution: MultiGaussianDistribution,
}

impl OpdfMultiGaussian {
    /// Zero mean and identity covariance in `dimension` dimensions.
    pub fn new(dimension: usize) -> Self {
        Self {
            distribution: MultiGaussianDistribution::new(dimension),
        }
    }

    /// # Errors
    ///
    /// `InvalidArgument` if the covariance is empty, not square, or does not
    /// match the dimension of the mean.
    pub fn with_params(mean: DVector<f64>, covariance: DMatrix<f64>) -> Result<Self> {
        Ok(Self {
            distribution: MultiGaussianDistribution::with_params(mean, covariance)?,
        })
    }

    pub fn mean(&self) -> &DVector<f64> {
        self.distribution.mean()
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        self.distribution.covariance()
    }

    pub fn dimension(&self) -> usize {
        self.distribution.dimension()
    }

    fn check_dimension(&self, o: &ObservationVector) -> Result<()> {
        if o.dimension() != self.dimension() {
            return Err(ModelError::InvalidDimension {
                expected: self.dimension(),
                found: o.dimension(),
            });
        }
        Ok(())
    }
}

impl Opdf<ObservationVector> for OpdfMultiGaussian {
    fn probability(&self, observation: &ObservationVector) -> Result<f64> {
        self.check_dimension(observation)?;
        self.distribution.probability(&observation.value)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Result<ObservationVector> {
        Ok(ObservationVector::new(self.distribution.generate(rng)?))
    }

    fn fit_weighted(&mut self, observations: &[ObservationVector], weights: &[f64]) -> Result<()> {
        if observations.is_empty() || observations.len() != weights.len() {
            return Err(ModelError::invalid_argument(format!(
                "{} observations but {} weights",
                observations.len(),
                weights.len()
            )));
        }
        for o in observations {
            self.check_dimension(o)?;
        }

        let values: Vec<_> = observations.iter().map(|o| &o.value).collect();
        let (mean, covariance) = weighted_fit(&values, weights)?;
        trace!(
            dimension = self.dimension(),
            observations = observations.len(),
            "fitted multivariate gaussian"
        );

        // both parameters are validated before either replaces the current ones
        self.distribution = MultiGaussianDistribution::with_params(mean, covariance)?;
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Opdf<ObservationVector>>> {
        Ok(Box::new(self.clone()))
    }
}

impl Display for OpdfMultiGaussian {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Multi-variate Gaussian distribution --- Mean: [")?;
        for value in self.mean().iter() {
            write!(f, " {}", value)?;
        }
        write!(f, " ]")
    }
}
