use super::attribute::{ObjectAttribute, ScoredSplit, SourceAttribute, SplitData, SplitRule};
use super::target::TargetAttribute;
use crate::error::{ModelError, Result};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Categorical attribute, split into one branch per category.
///
/// Branches follow ascending category order. A category never seen in the
/// memory that was split is routed to branch 0.
pub struct NominalAttribute<S> {
    name: String,
    evaluator: Rc<dyn Fn(&S) -> usize>,
}

impl<S> Clone for NominalAttribute<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            evaluator: Rc::clone(&self.evaluator),
        }
    }
}

impl<S> NominalAttribute<S> {
    pub fn new(name: impl Into<String>, evaluator: impl Fn(&S) -> usize + 'static) -> Self {
        Self {
            name: name.into(),
            evaluator: Rc::new(evaluator),
        }
    }
}

impl<S> ObjectAttribute<S> for NominalAttribute<S> {
    type Value = usize;

    fn evaluate(&self, source: &S) -> usize {
        (self.evaluator)(source)
    }

    fn compare(&self, a: &S, b: &S) -> Ordering {
        self.evaluate(a).cmp(&self.evaluate(b))
    }

    fn compare_with(&self, source: &S, target: &usize) -> Ordering {
        self.evaluate(source).cmp(target)
    }

    /// Categories have no midpoint; the lower of the two is returned.
    fn between(&self, a: &S, b: &S) -> usize {
        self.evaluate(a).min(self.evaluate(b))
    }
}

impl<S: 'static> SourceAttribute<S> for NominalAttribute<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn calculate_score(&self, memory: &[S], target: &dyn TargetAttribute<S>) -> Result<ScoredSplit> {
        let mut groups: BTreeMap<usize, Vec<&S>> = BTreeMap::new();
        for source in memory {
            groups.entry(self.evaluate(source)).or_default().push(source);
        }
        if groups.len() < 2 {
            return Ok(ScoredSplit::inadmissible());
        }

        let all: Vec<&S> = memory.iter().collect();
        let mut score = target.cost(&all)?;
        for group in groups.values() {
            score -= target.cost(group)?;
        }
        Ok(ScoredSplit::new(
            score,
            SplitData::Categories(groups.into_keys().collect()),
        ))
    }

    fn create_split_rule(&self, split: &SplitData) -> Result<Box<dyn SplitRule<S>>> {
        match split {
            SplitData::Categories(categories) if !categories.is_empty() => {
                Ok(Box::new(CategoryRule {
                    attribute: self.clone(),
                    categories: categories.clone(),
                }))
            }
            SplitData::None => Err(ModelError::NoAdmissibleSplit),
            _ => Err(ModelError::invalid_argument(format!(
                "attribute {} splits on categories",
                self.name
            ))),
        }
    }
}

struct CategoryRule<S> {
    attribute: NominalAttribute<S>,
    categories: Vec<usize>,
}

impl<S> SplitRule<S> for CategoryRule<S> {
    fn branch(&self, source: &S) -> usize {
        self.categories
            .binary_search(&self.attribute.evaluate(source))
            .unwrap_or(0)
    }

    fn arity(&self) -> usize {
        self.categories.len()
    }

    fn describe(&self) -> String {
        format!("{} in {:?}", self.attribute.name, self.categories)
    }
}
