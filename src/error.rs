//! Error type shared by every model in the crate.

use thiserror::Error;

/// Errors raised by distributions, emission models, the HMM container and
/// the decision tree.
///
/// All of them are precondition violations detected synchronously at the
/// call that receives the bad input. None of them is transient, so callers
/// should abandon the current training run instead of retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Empty observation set, mismatched lengths, malformed shapes, indices
    /// out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A vector whose dimension disagrees with the model's dimension.
    #[error("invalid dimension: expected {expected}, found {found}")]
    InvalidDimension { expected: usize, found: usize },

    /// The operation exists in the interface but is not implemented for the
    /// receiver.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A model could not be duplicated.
    #[error("clone failure: {0}")]
    CloneFailure(String),

    /// The covariance matrix (or variance) is not positive definite.
    #[error("covariance is not positive definite")]
    SingularCovariance,

    /// No source attribute is able to partition the leaf's memory.
    #[error("leaf has no admissible split")]
    NoAdmissibleSplit,

    /// The node handle is detached from the tree or never belonged to it.
    #[error("node {0} is not part of the tree")]
    UnknownNode(usize),

    #[error("node {0} is not a leaf")]
    NotALeaf(usize),

    #[error("node {0} is not an internal node")]
    NotAnInode(usize),
}

pub type Result<T> = std::result::Result<T, ModelError>;

impl ModelError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        ModelError::InvalidArgument(message.into())
    }
}
