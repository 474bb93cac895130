//! Attributes bound to a source object type.
//!
//! The tree never looks inside a source object. Everything it knows about
//! one comes through an attribute: a *source attribute* proposes and
//! materializes splits, a *target attribute* (see [`super::target`]) says
//! how costly a group of sources is to model.

use super::target::TargetAttribute;
use crate::error::{ModelError, Result};
use std::cmp::Ordering;

/// Pure evaluation of one attribute of a source object, and the order it
/// induces on sources.
pub trait ObjectAttribute<S> {
    type Value;

    fn evaluate(&self, source: &S) -> Self::Value;

    /// Total order over sources induced by the attribute.
    fn compare(&self, a: &S, b: &S) -> Ordering;

    /// Compares the evaluated value of `source` against a fixed value.
    fn compare_with(&self, source: &S, target: &Self::Value) -> Ordering;

    /// A value lying between the values of `a` and `b`; candidate split
    /// thresholds are taken from here.
    fn between(&self, a: &S, b: &S) -> Self::Value;
}

/// Parameters of the best split an attribute found for a memory.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SplitData {
    /// No admissible split.
    #[default]
    None,
    /// Binary split, sources evaluating `<=` the threshold go to branch 0.
    Threshold(f64),
    /// Multiway split, branch `i` receives sources of category
    /// `categories[i]`.
    Categories(Vec<usize>),
}

/// Score of a candidate split together with an owned copy of its
/// parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredSplit {
    pub score: f64,
    pub data: SplitData,
}

impl ScoredSplit {
    pub fn new(score: f64, data: SplitData) -> Self {
        Self { score, data }
    }

    /// Score of a memory that cannot be partitioned.
    pub fn inadmissible() -> Self {
        Self::new(f64::NEG_INFINITY, SplitData::None)
    }
}

/// Routing rule held by an internal node.
pub trait SplitRule<S> {
    /// Index of the child a source belongs to, `< arity()`.
    fn branch(&self, source: &S) -> usize;

    fn arity(&self) -> usize;

    /// Human readable form, e.g. `x <= 1.5`.
    fn describe(&self) -> String;
}

/// Replacement for a leaf being expanded: the rule of the new internal node
/// and the memory of each of its children, in branch order.
pub struct DecisionBlueprint<S> {
    pub rule: Box<dyn SplitRule<S>>,
    pub groups: Vec<Vec<S>>,
}

impl<S> DecisionBlueprint<S> {
    /// Routes every source of `memory` through `rule`, draining `memory`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the rule has no branch or sends a source to a
    /// branch `>= arity()`. `memory` is left untouched in that case.
    pub fn partition(rule: Box<dyn SplitRule<S>>, memory: &mut Vec<S>) -> Result<Self> {
        let arity = rule.arity();
        if arity == 0 {
            return Err(ModelError::invalid_argument(format!(
                "rule {} has no branch",
                rule.describe()
            )));
        }
        let branches: Vec<usize> = memory.iter().map(|source| rule.branch(source)).collect();
        if let Some(branch) = branches.iter().find(|&&branch| branch >= arity) {
            return Err(ModelError::invalid_argument(format!(
                "rule {} chose branch {} of {}",
                rule.describe(),
                branch,
                arity
            )));
        }

        let mut groups: Vec<Vec<S>> = (0..arity).map(|_| Vec::new()).collect();
        for (source, branch) in memory.drain(..).zip(branches) {
            groups[branch].push(source);
        }
        Ok(Self { rule, groups })
    }
}

/// An attribute the tree may split on.
pub trait SourceAttribute<S> {
    fn name(&self) -> &str;

    /// Scores partitioning `memory` by this attribute, with respect to how
    /// much it lowers the cost of `target`. Higher is better; an
    /// inadmissible split scores `-inf`. `memory` is left untouched.
    fn calculate_score(&self, memory: &[S], target: &dyn TargetAttribute<S>) -> Result<ScoredSplit>;

    /// Builds the routing rule that realizes `split`.
    ///
    /// # Errors
    ///
    /// `NoAdmissibleSplit` when `split` is [`SplitData::None`];
    /// `InvalidArgument` when `split` was produced by another kind of
    /// attribute.
    fn create_split_rule(&self, split: &SplitData) -> Result<Box<dyn SplitRule<S>>>;

    /// Builds the node that realizes `split` over `memory`: its rule and the
    /// memory of each child. The sources are drained out of `memory`; on
    /// error `memory` must be left as it was.
    fn create_decision_node(
        &self,
        memory: &mut Vec<S>,
        split: &SplitData,
    ) -> Result<DecisionBlueprint<S>> {
        DecisionBlueprint::partition(self.create_split_rule(split)?, memory)
    }
}
