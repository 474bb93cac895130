//! Parameters of a Hidden Markov Model.
//!
//! This is the surface the training loop works against: initial state
//! probabilities, the transition matrix and one emission model per state.
//! The forward-backward recursion that computes state occupancies lives
//! with the trainer and only talks to an `Hmm` through these accessors.

use crate::error::{ModelError, Result};
use crate::observables::Opdf;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Hidden Markov Model with observations of type `O`.
pub struct Hmm<O> {
    pi: DVector<f64>,
    a: DMatrix<f64>,
    opdfs: Vec<Box<dyn Opdf<O>>>,
}

impl<O> Hmm<O> {
    /// Creates a model with uniform initial and transition probabilities,
    /// calling `factory` once per state for its emission model.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `nb_states` is zero.
    pub fn new<F>(nb_states: usize, mut factory: F) -> Result<Self>
    where
        F: FnMut() -> Box<dyn Opdf<O>>,
    {
        if nb_states == 0 {
            return Err(ModelError::invalid_argument(
                "The number of states must be greater than 0.",
            ));
        }
        let p = 1.0 / nb_states as f64;
        Ok(Self {
            pi: DVector::from_element(nb_states, p),
            a: DMatrix::from_element(nb_states, nb_states, p),
            opdfs: (0..nb_states).map(|_| factory()).collect(),
        })
    }

    /// # Errors
    ///
    /// `InvalidArgument` unless `pi`, the rows and columns of `a` and `opdfs`
    /// all have the same non-zero length.
    pub fn with_params(
        pi: DVector<f64>,
        a: DMatrix<f64>,
        opdfs: Vec<Box<dyn Opdf<O>>>,
    ) -> Result<Self> {
        let nb_states = pi.len();
        if nb_states == 0
            || a.nrows() != nb_states
            || a.ncols() != nb_states
            || opdfs.len() != nb_states
        {
            return Err(ModelError::invalid_argument(format!(
                "{} initial probabilities, {}x{} transitions and {} opdfs",
                nb_states,
                a.nrows(),
                a.ncols(),
                opdfs.len()
            )));
        }
        Ok(Self { pi, a, opdfs })
    }

    pub fn nb_states(&self) -> usize {
        self.pi.len()
    }

    fn check_state(&self, state: usize) -> Result<()> {
        if state >= self.nb_states() {
            return Err(ModelError::invalid_argument(format!(
                "state {} out of range 0..{}",
                state,
                self.nb_states()
            )));
        }
        Ok(())
    }

    pub fn pi(&self, i: usize) -> Result<f64> {
        self.check_state(i)?;
        Ok(self.pi[i])
    }

    pub fn set_pi(&mut self, i: usize, value: f64) -> Result<()> {
        self.check_state(i)?;
        self.pi[i] = value;
        Ok(())
    }

    /// Probability of the transition from state `i` to state `j`.
    pub fn a_ij(&self, i: usize, j: usize) -> Result<f64> {
        self.check_state(i)?;
        self.check_state(j)?;
        Ok(self.a[(i, j)])
    }

    pub fn set_aij(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        self.check_state(i)?;
        self.check_state(j)?;
        self.a[(i, j)] = value;
        Ok(())
    }

    pub fn opdf(&self, state: usize) -> Result<&dyn Opdf<O>> {
        self.check_state(state)?;
        Ok(self.opdfs[state].as_ref())
    }

    pub fn opdf_mut(&mut self, state: usize) -> Result<&mut (dyn Opdf<O> + 'static)> {
        self.check_state(state)?;
        Ok(self.opdfs[state].as_mut())
    }

    pub fn set_opdf(&mut self, state: usize, opdf: Box<dyn Opdf<O>>) -> Result<()> {
        self.check_state(state)?;
        self.opdfs[state] = opdf;
        Ok(())
    }

    /// Re-estimates the emission model of `state` from the observations and
    /// their posterior weights. This is the M-step of one EM iteration for
    /// that state.
    pub fn fit_opdf(&mut self, state: usize, observations: &[O], weights: &[f64]) -> Result<()> {
        debug!(state, observations = observations.len(), "re-estimating opdf");
        self.opdf_mut(state)?.fit_weighted(observations, weights)
    }

    /// Deep copy of the model.
    ///
    /// # Errors
    ///
    /// Propagates `CloneFailure` from any emission model that cannot be
    /// duplicated.
    pub fn try_clone(&self) -> Result<Self> {
        let opdfs = self
            .opdfs
            .iter()
            .map(|opdf| opdf.try_clone())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            pi: self.pi.clone(),
            a: self.a.clone(),
            opdfs,
        })
    }
}
