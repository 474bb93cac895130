use crate::error::{ModelError, Result};
use std::str::FromStr;

/// Budget that bounds how far `grow` and `prune` move the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeParams {
    pub min_samples_split: u16,
    pub max_depth: Option<u16>,
    pub max_leaves: Option<usize>,
    pub min_gain: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeParams {
    pub fn new() -> Self {
        Self {
            min_samples_split: 2,
            max_depth: None,
            max_leaves: None,
            min_gain: 0.0,
        }
    }

    pub fn set_min_samples_split(&mut self, min_samples_split: u16) -> Result<()> {
        if min_samples_split < 2 {
            return Err(ModelError::invalid_argument(
                "The minimum number of samples to split must be greater than 1.",
            ));
        }
        self.min_samples_split = min_samples_split;
        Ok(())
    }

    /// Leaves at depth `max_depth` are never split.
    pub fn set_max_depth(&mut self, max_depth: Option<u16>) -> Result<()> {
        if max_depth.is_some_and(|depth| depth < 1) {
            return Err(ModelError::invalid_argument(
                "The maximum depth must be greater than 0.",
            ));
        }
        self.max_depth = max_depth;
        Ok(())
    }

    pub fn set_max_leaves(&mut self, max_leaves: Option<usize>) -> Result<()> {
        if max_leaves.is_some_and(|leaves| leaves < 1) {
            return Err(ModelError::invalid_argument(
                "The maximum number of leaves must be greater than 0.",
            ));
        }
        self.max_leaves = max_leaves;
        Ok(())
    }

    /// Splits gaining no more than `min_gain` are not worth their leaves.
    pub fn set_min_gain(&mut self, min_gain: f64) -> Result<()> {
        if !(min_gain.is_finite() && min_gain >= 0.0) {
            return Err(ModelError::invalid_argument(
                "The minimum gain must be finite and non-negative.",
            ));
        }
        self.min_gain = min_gain;
        Ok(())
    }

    pub fn min_samples_split(&self) -> u16 {
        self.min_samples_split
    }

    pub fn max_depth(&self) -> Option<u16> {
        self.max_depth
    }

    pub fn max_leaves(&self) -> Option<usize> {
        self.max_leaves
    }

    pub fn min_gain(&self) -> f64 {
        self.min_gain
    }
}

/// Impurity measure of a nominal target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Criterion {
    #[default]
    Gini,
    Entropy,
}

impl FromStr for Criterion {
    type Err = ModelError;

    fn from_str(criterion: &str) -> Result<Self> {
        match criterion {
            "gini" => Ok(Criterion::Gini),
            "entropy" => Ok(Criterion::Entropy),
            _ => Err(ModelError::invalid_argument(
                "The criterion must be either 'gini' or 'entropy'.",
            )),
        }
    }
}
