use crate::distributions::uniform_weights;
use crate::error::Result;
use rand::RngCore;

/// Observation probability distribution function: the emission model of one
/// HMM state.
///
/// The trait is object safe so that an HMM can hold one boxed `Opdf` per
/// state and swap them independently.
pub trait Opdf<O> {
    /// Density (or mass) of `observation`. Never negative.
    fn probability(&self, observation: &O) -> Result<f64>;

    /// Draws one observation.
    fn generate(&self, rng: &mut dyn RngCore) -> Result<O>;

    /// Weighted maximum-likelihood re-estimation. During Baum-Welch the
    /// weights are the state posteriors of the current iteration.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `observations` is empty or its length differs
    /// from the length of `weights`.
    fn fit_weighted(&mut self, observations: &[O], weights: &[f64]) -> Result<()>;

    /// Re-estimation with uniform weights `1/n`.
    fn fit(&mut self, observations: &[O]) -> Result<()> {
        self.fit_weighted(observations, &uniform_weights(observations.len()))
    }

    /// Duplicates the emission model. Implementations whose state cannot be
    /// deep-copied return `CloneFailure`.
    fn try_clone(&self) -> Result<Box<dyn Opdf<O>>>;
}
