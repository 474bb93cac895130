use super::attribute::{ObjectAttribute, ScoredSplit, SourceAttribute, SplitData, SplitRule};
use super::target::TargetAttribute;
use crate::data::RealNumber;
use crate::error::{ModelError, Result};
use std::cmp::Ordering;
use std::rc::Rc;

/// Real valued attribute, split in two at a threshold.
///
/// Candidate thresholds are the midpoints between consecutive distinct
/// values of the sorted memory.
pub struct ContinuousAttribute<S, T> {
    name: String,
    evaluator: Rc<dyn Fn(&S) -> T>,
}

impl<S, T> Clone for ContinuousAttribute<S, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            evaluator: Rc::clone(&self.evaluator),
        }
    }
}

impl<S, T: RealNumber> ContinuousAttribute<S, T> {
    pub fn new(name: impl Into<String>, evaluator: impl Fn(&S) -> T + 'static) -> Self {
        Self {
            name: name.into(),
            evaluator: Rc::new(evaluator),
        }
    }
}

impl<S, T: RealNumber> ObjectAttribute<S> for ContinuousAttribute<S, T> {
    type Value = T;

    fn evaluate(&self, source: &S) -> T {
        (self.evaluator)(source)
    }

    fn compare(&self, a: &S, b: &S) -> Ordering {
        self.evaluate(a).as_f64().total_cmp(&self.evaluate(b).as_f64())
    }

    fn compare_with(&self, source: &S, target: &T) -> Ordering {
        self.evaluate(source).as_f64().total_cmp(&target.as_f64())
    }

    fn between(&self, a: &S, b: &S) -> T {
        let half = T::from_f64_lossy(0.5);
        self.evaluate(a) * half + self.evaluate(b) * half
    }
}

impl<S: 'static, T: RealNumber> SourceAttribute<S> for ContinuousAttribute<S, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn calculate_score(&self, memory: &[S], target: &dyn TargetAttribute<S>) -> Result<ScoredSplit> {
        if memory.len() < 2 {
            return Ok(ScoredSplit::inadmissible());
        }

        let mut sorted: Vec<&S> = memory.iter().collect();
        sorted.sort_by(|a, b| self.compare(a, b));
        let base = target.cost(&sorted)?;

        let mut best = ScoredSplit::inadmissible();
        for k in 1..sorted.len() {
            if self.compare(sorted[k - 1], sorted[k]) == Ordering::Equal {
                continue;
            }
            let mut threshold = self.between(sorted[k - 1], sorted[k]);
            // adjacent floats can round the midpoint up onto the upper value
            if self.compare_with(sorted[k], &threshold) != Ordering::Greater {
                threshold = self.evaluate(sorted[k - 1]);
            }
            let threshold = threshold.as_f64();
            if !threshold.is_finite() {
                continue;
            }
            let score = base - target.cost(&sorted[..k])? - target.cost(&sorted[k..])?;
            if score > best.score {
                best = ScoredSplit::new(score, SplitData::Threshold(threshold));
            }
        }
        Ok(best)
    }

    fn create_split_rule(&self, split: &SplitData) -> Result<Box<dyn SplitRule<S>>> {
        match split {
            SplitData::Threshold(threshold) => Ok(Box::new(ThresholdRule {
                attribute: self.clone(),
                threshold: T::from_f64_lossy(*threshold),
            })),
            SplitData::None => Err(ModelError::NoAdmissibleSplit),
            SplitData::Categories(_) => Err(ModelError::invalid_argument(format!(
                "attribute {} splits on a threshold",
                self.name
            ))),
        }
    }
}

struct ThresholdRule<S, T> {
    attribute: ContinuousAttribute<S, T>,
    threshold: T,
}

impl<S, T: RealNumber> SplitRule<S> for ThresholdRule<S, T> {
    fn branch(&self, source: &S) -> usize {
        match self.attribute.compare_with(source, &self.threshold) {
            Ordering::Greater => 1,
            _ => 0,
        }
    }

    fn arity(&self) -> usize {
        2
    }

    fn describe(&self) -> String {
        format!("{} <= {}", self.attribute.name, self.threshold)
    }
}
