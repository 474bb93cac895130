/// Source attributes, split rules and split parameters
pub mod attribute;
/// Real valued source attribute
pub mod continuous;
/// The adaptive decision tree
pub mod decision_tree;
/// Leaves, internal nodes and node handles
pub mod node;
/// Categorical source attribute
pub mod nominal;
/// Growth parameters and impurity criteria
pub mod params;
/// Target attributes and their costs
pub mod target;

pub use attribute::{
    DecisionBlueprint, ObjectAttribute, ScoredSplit, SourceAttribute, SplitData, SplitRule,
};
pub use continuous::ContinuousAttribute;
pub use decision_tree::{DecisionTree, Partitions};
pub use node::{DecisionNode, Inode, Leaf, NodeId, NodeKind};
pub use nominal::NominalAttribute;
pub use params::{Criterion, TreeParams};
pub use target::{GaussianTarget, NominalTarget, TargetAttribute};
