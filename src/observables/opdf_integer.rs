use super::Opdf;
use crate::data::ObservationInteger;
use crate::error::{ModelError, Result};
use rand::{Rng, RngCore};
use std::fmt::{self, Display, Formatter};

/// Discrete emission model over the values `0..n`.
#[derive(Clone, Debug, PartialEq)]
pub struct OpdfInteger {
    probabilities: Vec<f64>,
}

impl OpdfInteger {
    /// Uniform distribution over `0..nb_entries`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `nb_entries` is zero.
    pub fn new(nb_entries: usize) -> Result<Self> {
        if nb_entries == 0 {
            return Err(ModelError::invalid_argument(
                "The number of entries must be greater than 0.",
            ));
        }
        Ok(Self {
            probabilities: vec![1.0 / nb_entries as f64; nb_entries],
        })
    }

    /// # Errors
    ///
    /// `InvalidArgument` if `probabilities` is empty, holds a negative or
    /// non-finite entry, or does not sum to one.
    pub fn with_probabilities(probabilities: Vec<f64>) -> Result<Self> {
        if probabilities.is_empty() {
            return Err(ModelError::invalid_argument("Empty probability vector"));
        }
        if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ModelError::invalid_argument(
                "Probabilities must be finite and non-negative.",
            ));
        }
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ModelError::invalid_argument(format!(
                "Probabilities sum to {} instead of 1",
                sum
            )));
        }
        Ok(Self { probabilities })
    }

    pub fn nb_entries(&self) -> usize {
        self.probabilities.len()
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    fn check_range(&self, o: &ObservationInteger) -> Result<()> {
        if o.value >= self.nb_entries() {
            return Err(ModelError::invalid_argument(format!(
                "value {} out of range 0..{}",
                o.value,
                self.nb_entries()
            )));
        }
        Ok(())
    }
}

impl Opdf<ObservationInteger> for OpdfInteger {
    fn probability(&self, observation: &ObservationInteger) -> Result<f64> {
        self.check_range(observation)?;
        Ok(self.probabilities[observation.value])
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Result<ObservationInteger> {
        let threshold = rng.gen::<f64>();
        let mut cumulative = 0.0;
        for (value, p) in self.probabilities.iter().enumerate() {
            cumulative += p;
            if threshold < cumulative {
                return Ok(ObservationInteger::new(value));
            }
        }
        // the cumulative sum may stop just below one; fall back to the last
        // value that can actually be drawn
        let last = self
            .probabilities
            .iter()
            .rposition(|&p| p > 0.0)
            .unwrap_or(self.nb_entries() - 1);
        Ok(ObservationInteger::new(last))
    }

    fn fit_weighted(&mut self, observations: &[ObservationInteger], weights: &[f64]) -> Result<()> {
        if observations.is_empty() || observations.len() != weights.len() {
            return Err(ModelError::invalid_argument(format!(
                "{} observations but {} weights",
                observations.len(),
                weights.len()
            )));
        }
        for o in observations {
            self.check_range(o)?;
        }

        let mut histogram = vec![0.0; self.nb_entries()];
        for (o, w) in observations.iter().zip(weights) {
            histogram[o.value] += w;
        }
        let total: f64 = histogram.iter().sum();
        if !(total > 0.0) {
            return Err(ModelError::invalid_argument("Weights sum to zero"));
        }
        self.probabilities = histogram.into_iter().map(|h| h / total).collect();
        Ok(())
    }

    fn try_clone(&self) -> Result<Box<dyn Opdf<ObservationInteger>>> {
        Ok(Box::new(self.clone()))
    }
}

impl Display for OpdfInteger {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Integer distribution ---")?;
        for (value, p) in self.probabilities.iter().enumerate() {
            write!(f, " {} {}", value, p)?;
        }
        Ok(())
    }
}
