//! Target attributes: the cost of modelling a group of sources.
//!
//! A split is scored by how much it lowers the total cost,
//! `cost(parent) - sum(cost(child))`. Both costs below are additive over
//! sources and concave in the group's composition, so that merging groups
//! never lowers the total.

use super::params::Criterion;
use crate::distributions::{uniform_weights, weighted_fit};
use crate::error::{ModelError, Result};
use nalgebra::{Cholesky, DMatrix, DVector};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::rc::Rc;

/// The attribute a tree's partition should separate.
pub trait TargetAttribute<S> {
    fn name(&self) -> &str;

    /// Cost of modelling `sources` as one group. The empty group costs 0.
    /// Must be deterministic: equal inputs give bit-identical costs.
    fn cost(&self, sources: &[&S]) -> Result<f64>;
}

/// Continuous vector target, modelled by a multivariate Gaussian per group.
///
/// The cost is the negative log-likelihood of the group under the Gaussian
/// fitted to it, after `variance_floor` is added to the diagonal of the
/// covariance so that small or collinear groups keep a finite cost.
pub struct GaussianTarget<S> {
    name: String,
    evaluator: Rc<dyn Fn(&S) -> DVector<f64>>,
    variance_floor: f64,
}

impl<S> Clone for GaussianTarget<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            evaluator: Rc::clone(&self.evaluator),
            variance_floor: self.variance_floor,
        }
    }
}

impl<S> GaussianTarget<S> {
    pub const DEFAULT_VARIANCE_FLOOR: f64 = 1e-6;

    pub fn new(name: impl Into<String>, evaluator: impl Fn(&S) -> DVector<f64> + 'static) -> Self {
        Self {
            name: name.into(),
            evaluator: Rc::new(evaluator),
            variance_floor: Self::DEFAULT_VARIANCE_FLOOR,
        }
    }

    /// A zero floor would let a single source or a constant group make the
    /// covariance singular, so the floor must be positive.
    pub fn with_variance_floor(mut self, variance_floor: f64) -> Result<Self> {
        if !(variance_floor.is_finite() && variance_floor > 0.0) {
            return Err(ModelError::invalid_argument(
                "The variance floor must be finite and positive.",
            ));
        }
        self.variance_floor = variance_floor;
        Ok(self)
    }

    pub fn variance_floor(&self) -> f64 {
        self.variance_floor
    }

    pub fn evaluate(&self, source: &S) -> DVector<f64> {
        (self.evaluator)(source)
    }
}

impl<S> TargetAttribute<S> for GaussianTarget<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self, sources: &[&S]) -> Result<f64> {
        if sources.is_empty() {
            return Ok(0.0);
        }
        let values: Vec<DVector<f64>> = sources.iter().map(|s| self.evaluate(*s)).collect();
        let refs: Vec<&DVector<f64>> = values.iter().collect();
        let (_, scatter) = weighted_fit(&refs, &uniform_weights(refs.len()))?;

        let dimension = scatter.nrows();
        let covariance = &scatter + DMatrix::identity(dimension, dimension) * self.variance_floor;
        let factor = Cholesky::new(covariance).ok_or(ModelError::SingularCovariance)?;

        let ln_det: f64 = factor
            .l_dirty()
            .diagonal()
            .iter()
            .map(|l| 2.0 * l.ln())
            .sum();
        // sum of the squared Mahalanobis distances is n * tr(C^-1 S)
        let trace = factor.solve(&scatter).trace();
        let n = sources.len() as f64;

        Ok(0.5 * n * (dimension as f64 * (2.0 * PI).ln() + ln_det + trace))
    }
}

/// Categorical target. The cost of a group is its size times its impurity.
pub struct NominalTarget<S> {
    name: String,
    evaluator: Rc<dyn Fn(&S) -> usize>,
    criterion: Criterion,
}

impl<S> Clone for NominalTarget<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            evaluator: Rc::clone(&self.evaluator),
            criterion: self.criterion,
        }
    }
}

impl<S> NominalTarget<S> {
    pub fn new(
        name: impl Into<String>,
        criterion: Criterion,
        evaluator: impl Fn(&S) -> usize + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            evaluator: Rc::new(evaluator),
            criterion,
        }
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    fn impurity(&self, counts: &BTreeMap<usize, usize>, n: f64) -> f64 {
        let frequencies = counts.values().map(|&count| count as f64 / n);
        match self.criterion {
            Criterion::Gini => 1.0 - frequencies.map(|p| p * p).sum::<f64>(),
            Criterion::Entropy => -frequencies.map(|p| p * p.ln()).sum::<f64>(),
        }
    }
}

impl<S> TargetAttribute<S> for NominalTarget<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self, sources: &[&S]) -> Result<f64> {
        if sources.is_empty() {
            return Ok(0.0);
        }
        let mut counts = BTreeMap::new();
        for source in sources {
            *counts.entry((self.evaluator)(*source)).or_insert(0) += 1;
        }
        let n = sources.len() as f64;
        Ok(n * self.impurity(&counts, n))
    }
}
