use super::attribute::{SplitData, SplitRule};
use std::fmt::{self, Display, Formatter};

/// Handle to a node of a [`super::DecisionTree`].
///
/// A handle stays valid until the node is replaced by `expand` or removed
/// by `reduce`; after that the tree reports it as unknown, even if its slot
/// has been reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Best split found the last time a leaf was scored.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LeafScore {
    pub score: f64,
    pub split_index: usize,
    pub split_data: SplitData,
}

/// Node holding raw memory, waiting for a split decision.
pub struct Leaf<S> {
    memory: Vec<S>,
    cached: Option<LeafScore>,
}

impl<S> Leaf<S> {
    pub(crate) fn new(memory: Vec<S>) -> Self {
        Self {
            memory,
            cached: None,
        }
    }

    pub fn memory(&self) -> &[S] {
        &self.memory
    }

    /// Whether the score must be recomputed before it can be trusted.
    pub fn is_dirty(&self) -> bool {
        self.cached.is_none()
    }

    pub(crate) fn insert(&mut self, source: S) {
        self.make_dirty();
        self.memory.push(source);
    }

    pub(crate) fn make_dirty(&mut self) {
        self.cached = None;
    }

    pub(crate) fn cached(&self) -> Option<&LeafScore> {
        self.cached.as_ref()
    }

    pub(crate) fn set_cached(&mut self, score: LeafScore) {
        self.cached = Some(score);
    }

    /// Moves the memory out, leaving the cached score alone so that
    /// [`Leaf::restore_memory`] can undo it.
    pub(crate) fn take_memory(&mut self) -> Vec<S> {
        std::mem::take(&mut self.memory)
    }

    pub(crate) fn restore_memory(&mut self, memory: Vec<S>) {
        self.memory = memory;
    }

    pub(crate) fn into_memory(self) -> Vec<S> {
        self.memory
    }
}

/// Internal node: a routing rule and one child per branch.
pub struct Inode<S> {
    rule: Box<dyn SplitRule<S>>,
    children: Vec<NodeId>,
    reduce_score: Option<f64>,
}

impl<S> Inode<S> {
    pub(crate) fn new(rule: Box<dyn SplitRule<S>>, children: Vec<NodeId>) -> Self {
        Self {
            rule,
            children,
            reduce_score: None,
        }
    }

    pub fn rule(&self) -> &dyn SplitRule<S> {
        self.rule.as_ref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn set_children(&mut self, children: Vec<NodeId>) {
        self.children = children;
        self.reduce_score = None;
    }

    pub(crate) fn cached_reduce_score(&self) -> Option<f64> {
        self.reduce_score
    }

    pub(crate) fn set_reduce_score(&mut self, score: f64) {
        self.reduce_score = Some(score);
    }

    pub(crate) fn make_dirty(&mut self) {
        self.reduce_score = None;
    }

    /// Swaps the edge to `was` for an edge to `now`. Returns whether `was`
    /// was a child.
    pub(crate) fn replace_child(&mut self, was: NodeId, now: NodeId) -> bool {
        match self.children.iter_mut().find(|child| **child == was) {
            Some(child) => {
                *child = now;
                true
            }
            None => false,
        }
    }
}

pub enum NodeKind<S> {
    Leaf(Leaf<S>),
    Inode(Inode<S>),
}

/// A node of the tree and the navigational link to its parent. Ownership
/// only flows from the tree's arena; the parent link is a plain handle.
pub struct DecisionNode<S> {
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind<S>,
}

impl<S> DecisionNode<S> {
    pub(crate) fn leaf(parent: Option<NodeId>, memory: Vec<S>) -> Self {
        Self {
            parent,
            kind: NodeKind::Leaf(Leaf::new(memory)),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind<S> {
        &self.kind
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&Leaf<S>> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Inode(_) => None,
        }
    }

    pub fn as_inode(&self) -> Option<&Inode<S>> {
        match &self.kind {
            NodeKind::Inode(inode) => Some(inode),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Children in branch order; empty for a leaf.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Inode(inode) => inode.children(),
        }
    }
}
