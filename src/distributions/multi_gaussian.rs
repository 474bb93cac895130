use super::standard_normal;
use crate::error::{ModelError, Result};
use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use rand::RngCore;
use std::f64::consts::PI;

/// Multivariate normal distribution.
///
/// The Cholesky factor of the covariance is recomputed whenever the
/// covariance changes. A covariance that is not positive definite is stored
/// as is, but `probability` and `generate` then fail with
/// `SingularCovariance`.
#[derive(Clone, Debug)]
pub struct MultiGaussianDistribution {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    factor: Option<Cholesky<f64, Dyn>>,
}

impl MultiGaussianDistribution {
    /// Zero mean, identity covariance.
    pub fn new(dimension: usize) -> Self {
        let covariance = DMatrix::identity(dimension, dimension);
        Self {
            mean: DVector::zeros(dimension),
            factor: Cholesky::new(covariance.clone()),
            covariance,
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidArgument` if the covariance is empty, not square, not
    /// symmetric, or of a different dimension than the mean, or if any
    /// parameter is not finite.
    pub fn with_params(mean: DVector<f64>, covariance: DMatrix<f64>) -> Result<Self> {
        if mean.iter().any(|m| !m.is_finite()) {
            return Err(ModelError::invalid_argument("The mean must be finite."));
        }
        if covariance.is_empty() || !covariance.is_square() || mean.len() != covariance.nrows() {
            return Err(ModelError::invalid_argument(format!(
                "mean of dimension {} and {}x{} covariance",
                mean.len(),
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        let mut distribution = Self::new(mean.len());
        distribution.mean = mean;
        distribution.set_covariance(covariance)?;
        Ok(distribution)
    }

    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    pub fn set_mean(&mut self, r: usize, value: f64) -> Result<()> {
        if r >= self.dimension() {
            return Err(ModelError::invalid_argument(format!(
                "mean index {} out of range 0..{}",
                r,
                self.dimension()
            )));
        }
        self.mean[r] = value;
        Ok(())
    }

    pub fn set_covariance(&mut self, covariance: DMatrix<f64>) -> Result<()> {
        let dimension = self.dimension();
        if covariance.nrows() != dimension || covariance.ncols() != dimension {
            return Err(ModelError::invalid_argument(format!(
                "expected a {}x{} covariance, got {}x{}",
                dimension,
                dimension,
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        if covariance.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::invalid_argument(
                "The covariance matrix must be finite.",
            ));
        }
        if !is_symmetric(&covariance) {
            return Err(ModelError::invalid_argument(
                "The covariance matrix must be symmetric.",
            ));
        }
        self.factor = Cholesky::new(covariance.clone());
        self.covariance = covariance;
        Ok(())
    }

    pub fn ln_probability(&self, v: &DVector<f64>) -> Result<f64> {
        if v.len() != self.dimension() {
            return Err(ModelError::InvalidDimension {
                expected: self.dimension(),
                found: v.len(),
            });
        }
        let factor = self.factor.as_ref().ok_or(ModelError::SingularCovariance)?;

        let centered = v - &self.mean;
        let mahalanobis = centered.dot(&factor.solve(&centered));
        let ln_det: f64 = factor
            .l_dirty()
            .diagonal()
            .iter()
            .map(|l| 2.0 * l.ln())
            .sum();

        Ok(-0.5 * (mahalanobis + ln_det + self.dimension() as f64 * (2.0 * PI).ln()))
    }

    pub fn probability(&self, v: &DVector<f64>) -> Result<f64> {
        Ok(self.ln_probability(v)?.exp())
    }

    pub fn generate(&self, rng: &mut dyn RngCore) -> Result<DVector<f64>> {
        let factor = self.factor.as_ref().ok_or(ModelError::SingularCovariance)?;
        let z = DVector::from_fn(self.dimension(), |_, _| standard_normal(rng));
        Ok(&self.mean + factor.l() * z)
    }
}

fn is_symmetric(m: &DMatrix<f64>) -> bool {
    (0..m.nrows()).all(|r| {
        (0..r).all(|c| {
            let (a, b) = (m[(r, c)], m[(c, r)]);
            (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
        })
    })
}
