//! Weighted maximum-likelihood fit of Gaussian parameters.
//!
//! Both the emission re-estimation step of the HMM and the split scoring of
//! the decision tree go through these routines. The mean is fully computed
//! before any covariance term, since every covariance term is a weighted
//! product of values centered on that mean.

use crate::error::{ModelError, Result};
use nalgebra::{DMatrix, DVector};

/// Weights `1/n` for `n` observations.
pub fn uniform_weights(n: usize) -> Vec<f64> {
    vec![1.0 / n as f64; n]
}

/// Computes the weighted mean and the weighted (biased) covariance of a set
/// of vectors.
///
/// Weights are used as given; they need not sum to one.
///
/// # Errors
///
/// * `InvalidArgument` if `observations` is empty or its length differs from
///   the length of `weights`.
/// * `InvalidDimension` if the observations don't all share the dimension of
///   the first one.
pub fn weighted_fit(
    observations: &[&DVector<f64>],
    weights: &[f64],
) -> Result<(DVector<f64>, DMatrix<f64>)> {
    if observations.is_empty() {
        return Err(ModelError::invalid_argument("Empty observation set"));
    }
    if observations.len() != weights.len() {
        return Err(ModelError::invalid_argument(format!(
            "{} observations but {} weights",
            observations.len(),
            weights.len()
        )));
    }

    let dimension = observations[0].len();
    if let Some(o) = observations.iter().find(|o| o.len() != dimension) {
        return Err(ModelError::InvalidDimension {
            expected: dimension,
            found: o.len(),
        });
    }

    let mut mean = DVector::zeros(dimension);
    for (o, &w) in observations.iter().zip(weights) {
        mean.axpy(w, *o, 1.0);
    }

    let mut covariance = DMatrix::zeros(dimension, dimension);
    for (o, &w) in observations.iter().zip(weights) {
        let centered = *o - &mean;
        covariance.ger(w, &centered, &centered, 1.0);
    }

    Ok((mean, covariance))
}

/// Scalar version of [`weighted_fit`], returning `(mean, variance)`.
pub fn weighted_fit_scalar(values: &[f64], weights: &[f64]) -> Result<(f64, f64)> {
    if values.is_empty() {
        return Err(ModelError::invalid_argument("Empty observation set"));
    }
    if values.len() != weights.len() {
        return Err(ModelError::invalid_argument(format!(
            "{} observations but {} weights",
            values.len(),
            weights.len()
        )));
    }

    let mean: f64 = values.iter().zip(weights).map(|(x, w)| x * w).sum();
    let variance = values
        .iter()
        .zip(weights)
        .map(|(x, w)| (x - mean) * (x - mean) * w)
        .sum();

    Ok((mean, variance))
}
