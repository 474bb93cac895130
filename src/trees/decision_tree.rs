//! Adaptive decision tree over source objects.
//!
//! Sources accumulate in leaves. Each leaf lazily finds the source attribute
//! whose split most lowers the cost of the target attribute; the tree grows
//! by expanding the leaf with the best such score and shrinks by reducing
//! the internal node whose collapse loses the least. Scores are cached and
//! every mutation dirties exactly the caches above it; nothing is
//! recomputed until a score is asked for.
//!
//! Nodes live in an arena owned by the tree. Parent links are plain
//! [`NodeId`]s, so ownership runs strictly from the tree to its nodes.

use super::attribute::{DecisionBlueprint, SourceAttribute, SplitData};
use super::node::{DecisionNode, Inode, Leaf, LeafScore, NodeId, NodeKind};
use super::params::TreeParams;
use super::target::TargetAttribute;
use crate::error::{ModelError, Result};
use tracing::{debug, trace};

struct Slot<S> {
    generation: u32,
    node: Option<DecisionNode<S>>,
}

/// Decision tree partitioning sources of type `S`.
pub struct DecisionTree<S> {
    slots: Vec<Slot<S>>,
    free: Vec<usize>,
    root: NodeId,
    source_attributes: Vec<Box<dyn SourceAttribute<S>>>,
    target_attribute: Box<dyn TargetAttribute<S>>,
    params: TreeParams,
}

impl<S> DecisionTree<S> {
    /// Creates a tree made of one empty leaf, with default parameters.
    ///
    /// The order of `source_attributes` matters: when two attributes score
    /// the same, the one listed first wins.
    pub fn new(
        source_attributes: Vec<Box<dyn SourceAttribute<S>>>,
        target_attribute: Box<dyn TargetAttribute<S>>,
    ) -> Self {
        Self::with_params(source_attributes, target_attribute, TreeParams::new())
    }

    pub fn with_params(
        source_attributes: Vec<Box<dyn SourceAttribute<S>>>,
        target_attribute: Box<dyn TargetAttribute<S>>,
        params: TreeParams,
    ) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            source_attributes,
            target_attribute,
            params,
        };
        tree.root = tree.alloc(DecisionNode::leaf(None, Vec::new()));
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Replaces the parameters. Every cached score depends on them, so all of
    /// them are dropped.
    pub fn set_params(&mut self, params: TreeParams) {
        self.params = params;
        for node in self.slots.iter_mut().filter_map(|slot| slot.node.as_mut()) {
            match &mut node.kind {
                NodeKind::Leaf(leaf) => leaf.make_dirty(),
                NodeKind::Inode(inode) => inode.make_dirty(),
            }
        }
    }

    pub fn source_attributes(&self) -> &[Box<dyn SourceAttribute<S>>] {
        &self.source_attributes
    }

    pub fn target_attribute(&self) -> &dyn TargetAttribute<S> {
        self.target_attribute.as_ref()
    }

    fn alloc(&mut self, node: DecisionNode<S>) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Result<DecisionNode<S>> {
        self.node(id)?;
        let slot = &mut self.slots[id.index];
        let node = slot.node.take().ok_or(ModelError::UnknownNode(id.index))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Ok(node)
    }

    pub fn node(&self, id: NodeId) -> Result<&DecisionNode<S>> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(ModelError::UnknownNode(id.index))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut DecisionNode<S>> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(ModelError::UnknownNode(id.index))
    }

    fn leaf(&self, id: NodeId) -> Result<&Leaf<S>> {
        self.node(id)?
            .as_leaf()
            .ok_or(ModelError::NotALeaf(id.index))
    }

    fn leaf_mut(&mut self, id: NodeId) -> Result<&mut Leaf<S>> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Leaf(leaf) => Ok(leaf),
            NodeKind::Inode(_) => Err(ModelError::NotALeaf(id.index)),
        }
    }

    fn inode_mut(&mut self, id: NodeId) -> Result<&mut Inode<S>> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Inode(inode) => Ok(inode),
            NodeKind::Leaf(_) => Err(ModelError::NotAnInode(id.index)),
        }
    }

    /// Whether `id` designates a node currently in the tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    pub fn is_leaf(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.is_leaf())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent())
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> Result<usize> {
        let mut depth = 0;
        let mut current = self.node(id)?.parent();
        while let Some(parent) = current {
            depth += 1;
            current = self.node(parent)?.parent();
        }
        Ok(depth)
    }

    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    /// Leaves in pre-order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder(self.root)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| self.is_leaf(*id).unwrap_or(false))
            .collect()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Nodes of the subtree rooted at `from`, parents before children and
    /// children in branch order.
    fn preorder(&self, from: NodeId) -> Result<Vec<NodeId>> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id)?.children().iter().rev());
        }
        Ok(order)
    }

    /// Follows the split rules from the root down to the leaf `source`
    /// belongs to.
    pub fn find_leaf(&self, source: &S) -> Result<NodeId> {
        let mut current = self.root;
        loop {
            match &self.node(current)?.kind {
                NodeKind::Leaf(_) => return Ok(current),
                NodeKind::Inode(inode) => {
                    let branch = inode.rule().branch(source);
                    current = *inode.children().get(branch).ok_or_else(|| {
                        ModelError::invalid_argument(format!(
                            "rule of node {} chose branch {} of {}",
                            current,
                            branch,
                            inode.children().len()
                        ))
                    })?;
                }
            }
        }
    }

    /// Routes `source` to its leaf and stores it there. Returns that leaf.
    pub fn insert(&mut self, source: S) -> Result<NodeId> {
        let leaf = self.find_leaf(&source)?;
        self.insert_into(leaf, source)?;
        Ok(leaf)
    }

    pub fn extend<I>(&mut self, sources: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
    {
        for source in sources {
            self.insert(source)?;
        }
        Ok(())
    }

    /// Appends `source` to the memory of `leaf`, bypassing the split rules.
    /// The leaf and every internal node above it become dirty.
    pub fn insert_into(&mut self, leaf: NodeId, source: S) -> Result<()> {
        self.leaf_mut(leaf)?.insert(source);
        let parent = self.node(leaf)?.parent();
        self.invalidate_ancestors(parent);
        Ok(())
    }

    fn invalidate_ancestors(&mut self, mut current: Option<NodeId>) {
        while let Some(id) = current {
            let Ok(node) = self.node_mut(id) else {
                break;
            };
            if let NodeKind::Inode(inode) = &mut node.kind {
                inode.make_dirty();
            }
            current = node.parent;
        }
    }

    pub fn is_dirty(&self, leaf: NodeId) -> Result<bool> {
        Ok(self.leaf(leaf)?.is_dirty())
    }

    /// Score of splitting `leaf`, computed only if the leaf is dirty.
    pub fn expand_score(&mut self, leaf: NodeId) -> Result<f64> {
        if let Some(cached) = self.leaf(leaf)?.cached() {
            return Ok(cached.score);
        }
        self.calculate_score(leaf)
    }

    /// Recomputes and caches the best split of `leaf`, dirty or not.
    pub fn calculate_score(&mut self, leaf: NodeId) -> Result<f64> {
        let scored = self.score_leaf(leaf)?;
        let score = scored.score;
        self.leaf_mut(leaf)?.set_cached(scored);
        Ok(score)
    }

    /// Index of the winning source attribute at the last scoring, `None` if
    /// the leaf is dirty.
    pub fn split_index(&self, leaf: NodeId) -> Result<Option<usize>> {
        Ok(self.leaf(leaf)?.cached().map(|cached| cached.split_index))
    }

    /// Parameters of the winning split at the last scoring, `None` if the
    /// leaf is dirty.
    pub fn split_data(&self, leaf: NodeId) -> Result<Option<&SplitData>> {
        Ok(self.leaf(leaf)?.cached().map(|cached| &cached.split_data))
    }

    fn score_leaf(&self, id: NodeId) -> Result<LeafScore> {
        let leaf = self.leaf(id)?;
        let mut best = LeafScore {
            score: f64::NEG_INFINITY,
            split_index: 0,
            split_data: SplitData::None,
        };
        if !self.may_split(id, leaf.memory().len())? {
            trace!(leaf = %id, "leaf is not eligible for a split");
            return Ok(best);
        }

        let target = self.target_attribute.as_ref();
        for (index, attribute) in self.source_attributes.iter().enumerate() {
            let candidate = attribute.calculate_score(leaf.memory(), target)?;
            // strict comparison: on ties the first attribute wins
            if candidate.score > best.score {
                best = LeafScore {
                    score: candidate.score,
                    split_index: index,
                    split_data: candidate.data,
                };
            }
        }
        trace!(
            leaf = %id,
            sources = leaf.memory().len(),
            score = best.score,
            split_index = best.split_index,
            "scored leaf"
        );
        Ok(best)
    }

    fn may_split(&self, id: NodeId, sources: usize) -> Result<bool> {
        if sources < usize::from(self.params.min_samples_split()) {
            return Ok(false);
        }
        if let Some(max_depth) = self.params.max_depth() {
            if self.depth(id)? >= usize::from(max_depth) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Replaces `leaf` by an internal node realizing its best split, with
    /// one fresh leaf per branch. Returns the new internal node; `leaf` is
    /// no longer part of the tree afterwards.
    ///
    /// The winning attribute builds the replacement through
    /// [`SourceAttribute::create_decision_node`].
    ///
    /// # Errors
    ///
    /// `NoAdmissibleSplit` if the best score of the leaf is `-inf`; any error
    /// of the attribute building the node. The leaf is left as it was.
    pub fn expand(&mut self, leaf: NodeId) -> Result<NodeId> {
        let score = self.expand_score(leaf)?;
        let (split_index, split_data) = match self.leaf(leaf)?.cached() {
            Some(cached) if score > f64::NEG_INFINITY => {
                (cached.split_index, cached.split_data.clone())
            }
            _ => return Err(ModelError::NoAdmissibleSplit),
        };
        let parent = self.node(leaf)?.parent();
        let mut memory = self.leaf_mut(leaf)?.take_memory();
        let sources = memory.len();
        let blueprint =
            match self.source_attributes[split_index].create_decision_node(&mut memory, &split_data) {
                Ok(blueprint) => blueprint,
                Err(err) => {
                    self.leaf_mut(leaf)?.restore_memory(memory);
                    return Err(err);
                }
            };
        let DecisionBlueprint { rule, groups } = blueprint;
        if groups.len() != rule.arity() {
            let arity = rule.arity();
            let found = groups.len();
            let memory = groups.into_iter().flatten().collect();
            self.leaf_mut(leaf)?.restore_memory(memory);
            return Err(ModelError::invalid_argument(format!(
                "rule {} has {} branches but {} groups were built",
                rule.describe(),
                arity,
                found
            )));
        }
        let description = rule.describe();
        self.release(leaf)?;

        let inode = self.alloc(DecisionNode {
            parent,
            kind: NodeKind::Inode(Inode::new(rule, Vec::new())),
        });
        let children: Vec<NodeId> = groups
            .into_iter()
            .map(|group| self.alloc(DecisionNode::leaf(Some(inode), group)))
            .collect();
        self.inode_mut(inode)?.set_children(children);
        self.replace_child(parent, leaf, inode)?;

        debug!(
            leaf = %leaf,
            inode = %inode,
            sources,
            score,
            rule = %description,
            "expanded leaf"
        );
        Ok(inode)
    }

    /// Rewires the edge from `parent` (or the root slot) to point at `now`
    /// instead of `was`.
    fn replace_child(&mut self, parent: Option<NodeId>, was: NodeId, now: NodeId) -> Result<()> {
        match parent {
            None => self.root = now,
            Some(parent_id) => {
                if !self.inode_mut(parent_id)?.replace_child(was, now) {
                    return Err(ModelError::UnknownNode(was.index));
                }
            }
        }
        self.invalidate_ancestors(parent);
        Ok(())
    }

    /// How much model quality is kept by collapsing `id` into one leaf:
    /// the summed cost of its leaves minus the cost of all its sources
    /// together. Never positive for costs where merging never helps; the
    /// highest value marks the least harmful collapse. `-inf` for a leaf.
    pub fn reduce_score(&mut self, id: NodeId) -> Result<f64> {
        match &self.node(id)?.kind {
            NodeKind::Leaf(_) => return Ok(f64::NEG_INFINITY),
            NodeKind::Inode(inode) => {
                if let Some(score) = inode.cached_reduce_score() {
                    return Ok(score);
                }
            }
        }
        let score = self.collective_reduce_score(id)?;
        self.inode_mut(id)?.set_reduce_score(score);
        Ok(score)
    }

    fn collective_reduce_score(&self, id: NodeId) -> Result<f64> {
        let target = self.target_attribute.as_ref();
        let mut separate = 0.0;
        for group in self.partitioned_stored_sources(id)? {
            let refs: Vec<&S> = group.iter().collect();
            separate += target.cost(&refs)?;
        }
        let merged = target.cost(&self.stored_sources(id)?)?;
        Ok(separate - merged)
    }

    /// Replaces the internal node `id` and its whole subtree by a single
    /// dirty leaf holding every source of the subtree, in partition order.
    /// Returns the new leaf.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` if `id` is a leaf.
    pub fn reduce(&mut self, id: NodeId) -> Result<NodeId> {
        let node = self.node(id)?;
        if node.is_leaf() {
            return Err(ModelError::UnsupportedOperation(format!(
                "leaf {} cannot be reduced",
                id
            )));
        }
        let parent = node.parent();

        let subtree = self.preorder(id)?;
        let mut memory = Vec::new();
        for node_id in &subtree {
            if let NodeKind::Leaf(leaf) = self.release(*node_id)?.kind {
                memory.extend(leaf.into_memory());
            }
        }
        let sources = memory.len();

        let leaf = self.alloc(DecisionNode::leaf(parent, memory));
        self.replace_child(parent, id, leaf)?;

        debug!(
            inode = %id,
            leaf = %leaf,
            removed = subtree.len(),
            sources,
            "reduced subtree"
        );
        Ok(leaf)
    }

    /// Leaf with the highest expand score, with that score. Leaves are
    /// visited in pre-order and the first one wins ties.
    pub fn maximum_expand_leaf(&mut self) -> Result<(NodeId, f64)> {
        let mut best: Option<(NodeId, f64)> = None;
        for id in self.preorder(self.root)? {
            if !self.is_leaf(id)? {
                continue;
            }
            let score = self.expand_score(id)?;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((id, score));
            }
        }
        best.ok_or(ModelError::UnknownNode(self.root.index))
    }

    /// Internal node with the highest reduce score, with that score. `None`
    /// when the tree is a single leaf. Pre-order, first one wins ties.
    pub fn maximum_reduce_inode(&mut self) -> Result<Option<(NodeId, f64)>> {
        let mut best: Option<(NodeId, f64)> = None;
        for id in self.preorder(self.root)? {
            if self.is_leaf(id)? {
                continue;
            }
            let score = self.reduce_score(id)?;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((id, score));
            }
        }
        Ok(best)
    }

    /// Every source stored under `id`, in partition order.
    pub fn stored_sources(&self, id: NodeId) -> Result<Vec<&S>> {
        Ok(self.partitioned_stored_sources(id)?.flatten().collect())
    }

    /// The memories of the leaves under `id`, one group per leaf, in
    /// pre-order. The iterator is lazy; clone it or call again to restart.
    pub fn partitioned_stored_sources(&self, id: NodeId) -> Result<Partitions<'_, S>> {
        self.node(id)?;
        Ok(Partitions {
            tree: self,
            stack: vec![id],
        })
    }

    /// Greedily expands the most profitable leaf until no split gains more
    /// than `min_gain` or no further split fits in `max_leaves`. A leaf whose
    /// best split has more branches than the budget has room for is passed
    /// over in favour of the next best leaf. Returns the number of
    /// expansions.
    pub fn grow(&mut self) -> Result<usize> {
        let mut expansions = 0;
        loop {
            let room = self
                .params
                .max_leaves()
                .map(|max_leaves| max_leaves.saturating_sub(self.leaf_count()));
            if room == Some(0) {
                break;
            }
            let Some((leaf, _)) = self.best_expandable_leaf(room)? else {
                break;
            };
            self.expand(leaf)?;
            expansions += 1;
        }
        debug!(expansions, leaves = self.leaf_count(), "grow finished");
        Ok(expansions)
    }

    /// Leaf with the highest expand score above `min_gain` whose split adds
    /// at most `room` leaves. Pre-order, first one wins ties.
    fn best_expandable_leaf(&mut self, room: Option<usize>) -> Result<Option<(NodeId, f64)>> {
        let mut best: Option<(NodeId, f64)> = None;
        for id in self.preorder(self.root)? {
            if !self.is_leaf(id)? {
                continue;
            }
            let score = self.expand_score(id)?;
            if score.is_nan() || score <= self.params.min_gain() {
                continue;
            }
            if best.is_some_and(|(_, best_score)| score <= best_score) {
                continue;
            }
            if let Some(room) = room {
                let added = self.split_arity(id)?.saturating_sub(1);
                if added > room {
                    trace!(leaf = %id, added, room, "split does not fit the leaf budget");
                    continue;
                }
            }
            best = Some((id, score));
        }
        Ok(best)
    }

    /// Number of children the cached best split of `leaf` would create.
    fn split_arity(&self, leaf: NodeId) -> Result<usize> {
        let cached = self
            .leaf(leaf)?
            .cached()
            .ok_or(ModelError::NoAdmissibleSplit)?;
        let rule = self.source_attributes[cached.split_index].create_split_rule(&cached.split_data)?;
        Ok(rule.arity())
    }

    /// Collapses the least harmful subtree while the tree holds more than
    /// `max_leaves` leaves or that subtree gains no more than `min_gain`.
    /// Returns the number of reductions.
    pub fn prune(&mut self) -> Result<usize> {
        let mut reductions = 0;
        while let Some((inode, score)) = self.maximum_reduce_inode()? {
            let over_budget = self
                .params
                .max_leaves()
                .is_some_and(|max_leaves| self.leaf_count() > max_leaves);
            if !over_budget && -score > self.params.min_gain() {
                break;
            }
            self.reduce(inode)?;
            reductions += 1;
        }
        debug!(reductions, leaves = self.leaf_count(), "prune finished");
        Ok(reductions)
    }

    /// Calls `fit` on the memory of every leaf under `id`, in pre-order, and
    /// pairs each result with its leaf. This is how a per-region model, e.g.
    /// one emission distribution per leaf, is obtained from the partition.
    pub fn fit_leaves<D, F>(&self, id: NodeId, mut fit: F) -> Result<Vec<(NodeId, D)>>
    where
        F: FnMut(&[S]) -> Result<D>,
    {
        let mut fitted = Vec::new();
        for node_id in self.preorder(id)? {
            if let Some(leaf) = self.node(node_id)?.as_leaf() {
                fitted.push((node_id, fit(leaf.memory())?));
            }
        }
        Ok(fitted)
    }
}

/// Lazy iterator over the leaf memories of a subtree.
pub struct Partitions<'a, S> {
    tree: &'a DecisionTree<S>,
    stack: Vec<NodeId>,
}

impl<S> Clone for Partitions<'_, S> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            stack: self.stack.clone(),
        }
    }
}

impl<'a, S> Iterator for Partitions<'a, S> {
    type Item = &'a [S];

    fn next(&mut self) -> Option<&'a [S]> {
        let tree: &'a DecisionTree<S> = self.tree;
        while let Some(id) = self.stack.pop() {
            match &tree.node(id).ok()?.kind {
                NodeKind::Leaf(leaf) => return Some(leaf.memory()),
                NodeKind::Inode(inode) => self.stack.extend(inode.children().iter().rev()),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trees::attribute::{ScoredSplit, SplitRule};
    use crate::trees::continuous::ContinuousAttribute;
    use crate::trees::nominal::NominalAttribute;
    use crate::trees::params::Criterion;
    use crate::trees::target::{GaussianTarget, NominalTarget};
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use std::cell::Cell;
    use std::rc::Rc;

    /// (x, color, class)
    type Sample = (f64, usize, usize);

    fn target() -> Box<dyn TargetAttribute<Sample>> {
        Box::new(NominalTarget::new("class", Criterion::Gini, |s: &Sample| s.2))
    }

    fn attributes() -> Vec<Box<dyn SourceAttribute<Sample>>> {
        vec![
            Box::new(ContinuousAttribute::new("x", |s: &Sample| s.0)),
            Box::new(NominalAttribute::new("color", |s: &Sample| s.1)),
        ]
    }

    fn tree() -> DecisionTree<Sample> {
        DecisionTree::new(attributes(), target())
    }

    fn samples() -> Vec<Sample> {
        vec![
            (1.0, 0, 0),
            (2.0, 1, 0),
            (3.0, 0, 0),
            (4.0, 1, 1),
            (5.0, 0, 1),
            (6.0, 1, 2),
        ]
    }

    /// Attribute with a fixed score that counts how often it is consulted.
    struct FixedScore {
        score: f64,
        calls: Rc<Cell<usize>>,
    }

    impl SourceAttribute<Sample> for FixedScore {
        fn name(&self) -> &str {
            "fixed"
        }

        fn calculate_score(
            &self,
            _memory: &[Sample],
            _target: &dyn TargetAttribute<Sample>,
        ) -> Result<ScoredSplit> {
            self.calls.set(self.calls.get() + 1);
            Ok(ScoredSplit::new(self.score, SplitData::Threshold(self.score)))
        }

        fn create_split_rule(&self, _split: &SplitData) -> Result<Box<dyn SplitRule<Sample>>> {
            Err(ModelError::UnsupportedOperation("fixed".into()))
        }
    }

    fn fixed(score: f64, calls: &Rc<Cell<usize>>) -> Box<dyn SourceAttribute<Sample>> {
        Box::new(FixedScore {
            score,
            calls: Rc::clone(calls),
        })
    }

    /// Splits on `x` and records whether the tree asked it to build a node.
    struct Recording {
        inner: ContinuousAttribute<Sample, f64>,
        built: Rc<Cell<bool>>,
    }

    impl SourceAttribute<Sample> for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn calculate_score(
            &self,
            memory: &[Sample],
            target: &dyn TargetAttribute<Sample>,
        ) -> Result<ScoredSplit> {
            self.inner.calculate_score(memory, target)
        }

        fn create_split_rule(&self, split: &SplitData) -> Result<Box<dyn SplitRule<Sample>>> {
            self.inner.create_split_rule(split)
        }

        fn create_decision_node(
            &self,
            memory: &mut Vec<Sample>,
            split: &SplitData,
        ) -> Result<DecisionBlueprint<Sample>> {
            self.built.set(true);
            self.inner.create_decision_node(memory, split)
        }
    }

    #[test]
    fn test_new_tree_is_single_empty_leaf() {
        let tree = tree();
        assert!(tree.is_leaf(tree.root()).unwrap());
        assert_eq!(tree.parent(tree.root()).unwrap(), None);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.stored_sources(tree.root()).unwrap().is_empty());
    }

    #[test]
    fn test_expand_score_is_cached_until_insert() {
        let calls = Rc::new(Cell::new(0));
        let mut tree: DecisionTree<Sample> = DecisionTree::new(vec![fixed(1.0, &calls)], target());
        tree.extend(samples()).unwrap();
        let root = tree.root();

        assert!(tree.is_dirty(root).unwrap());
        assert_eq!(tree.expand_score(root).unwrap(), 1.0);
        assert_eq!(tree.expand_score(root).unwrap(), 1.0);
        assert_eq!(calls.get(), 1);
        assert!(!tree.is_dirty(root).unwrap());

        tree.insert((7.0, 0, 2)).unwrap();
        assert!(tree.is_dirty(root).unwrap());
        assert_eq!(tree.split_index(root).unwrap(), None);
        tree.expand_score(root).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_cached_score_equals_fresh_score() {
        let mut tree = tree();
        let root = tree.root();
        for sample in samples() {
            tree.insert(sample).unwrap();
            let cached = tree.expand_score(root).unwrap();
            assert_eq!(cached, tree.score_leaf(root).unwrap().score);
        }
    }

    #[test]
    fn test_ties_go_to_the_first_attribute() {
        let calls = Rc::new(Cell::new(0));
        let mut tree: DecisionTree<Sample> = DecisionTree::new(
            vec![
                fixed(1.0, &calls),
                fixed(3.0, &calls),
                fixed(3.0, &calls),
                fixed(2.0, &calls),
            ],
            target(),
        );
        tree.extend(samples()).unwrap();
        let root = tree.root();

        for _ in 0..3 {
            assert_eq!(tree.calculate_score(root).unwrap(), 3.0);
            assert_eq!(tree.split_index(root).unwrap(), Some(1));
            assert_eq!(
                tree.split_data(root).unwrap(),
                Some(&SplitData::Threshold(3.0))
            );
        }
    }

    #[test]
    fn test_identical_attributes_tie_on_lower_index() {
        let mut tree: DecisionTree<Sample> = DecisionTree::new(
            vec![
                Box::new(ContinuousAttribute::new("a", |s: &Sample| s.0)),
                Box::new(ContinuousAttribute::new("b", |s: &Sample| s.0)),
            ],
            target(),
        );
        tree.extend(samples()).unwrap();
        let root = tree.root();
        tree.expand_score(root).unwrap();
        assert_eq!(tree.split_index(root).unwrap(), Some(0));
    }

    #[test]
    fn test_expand_root() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        let old_root = tree.root();

        let inode = tree.expand(old_root).unwrap();
        assert_eq!(tree.root(), inode);
        assert!(!tree.contains(old_root));
        assert!(matches!(
            tree.expand_score(old_root),
            Err(ModelError::UnknownNode(_))
        ));
        assert_eq!(tree.children(inode).unwrap().len(), 2);
        for child in tree.children(inode).unwrap() {
            assert_eq!(tree.parent(*child).unwrap(), Some(inode));
            assert!(tree.is_dirty(*child).unwrap());
        }
        assert_eq!(tree.stored_sources(inode).unwrap().len(), 6);
    }

    #[test]
    fn test_expand_detaches_inner_leaf() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        let root = tree.expand(tree.root()).unwrap();

        // x <= 3.5 holds the three class-0 samples, the other side three
        let right = tree.children(root).unwrap()[1];
        assert_eq!(tree.stored_sources(right).unwrap().len(), 3);

        let inode = tree.expand(right).unwrap();
        let siblings = tree.children(root).unwrap();
        assert!(!siblings.contains(&right));
        assert_eq!(siblings.iter().filter(|&&c| c == inode).count(), 1);
        assert_eq!(tree.parent(inode).unwrap(), Some(root));
        assert!(!tree.contains(right));
        assert!(tree.leaves().iter().all(|&leaf| leaf != right));
    }

    #[test]
    fn test_expand_without_admissible_split() {
        let mut tree = tree();
        tree.insert((1.0, 0, 0)).unwrap();
        let root = tree.root();

        assert_eq!(tree.expand(root), Err(ModelError::NoAdmissibleSplit));
        assert!(tree.contains(root));
        assert_eq!(tree.stored_sources(root).unwrap().len(), 1);
    }

    #[test]
    fn test_find_leaf_routes_new_sources() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        let root = tree.expand(tree.root()).unwrap();
        let left = tree.children(root).unwrap()[0];
        let right = tree.children(root).unwrap()[1];

        assert_eq!(tree.insert((0.5, 1, 0)).unwrap(), left);
        assert_eq!(tree.insert((9.0, 1, 2)).unwrap(), right);
        assert_eq!(tree.stored_sources(left).unwrap().len(), 4);
    }

    #[test]
    fn test_insert_into_rejects_inodes() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        let root = tree.expand(tree.root()).unwrap();
        assert_eq!(
            tree.insert_into(root, (1.0, 0, 0)),
            Err(ModelError::NotALeaf(root.index()))
        );
    }

    #[test]
    fn test_reduce_leaf_is_unsupported() {
        let mut tree = tree();
        let root = tree.root();
        assert!(matches!(
            tree.reduce(root),
            Err(ModelError::UnsupportedOperation(_))
        ));
        assert_eq!(tree.reduce_score(root).unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_reduce_merges_subtree() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        let root = tree.expand(tree.root()).unwrap();
        let right = tree.children(root).unwrap()[1];
        let inner = tree.expand(right).unwrap();
        let before: Vec<Sample> = tree.stored_sources(inner).unwrap().into_iter().copied().collect();
        let removed = tree.children(inner).unwrap().to_vec();

        let leaf = tree.reduce(inner).unwrap();
        assert!(tree.is_leaf(leaf).unwrap());
        assert!(tree.is_dirty(leaf).unwrap());
        assert_eq!(tree.parent(leaf).unwrap(), Some(root));
        assert_eq!(tree.children(root).unwrap()[1], leaf);
        assert!(!tree.contains(inner));
        assert!(removed.iter().all(|id| !tree.contains(*id)));

        let after: Vec<Sample> = tree.stored_sources(leaf).unwrap().into_iter().copied().collect();
        assert_eq!(before, after);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_reduce_root_gives_single_leaf() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        tree.grow().unwrap();
        assert!(tree.leaf_count() > 1);

        let leaf = tree.reduce(tree.root()).unwrap();
        assert_eq!(tree.root(), leaf);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.stored_sources(leaf).unwrap().len(), 6);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        let old_root = tree.root();
        let inode = tree.expand(old_root).unwrap();
        // the inode reuses the slot released by the old root
        assert_eq!(inode.index(), old_root.index());
        assert_ne!(inode, old_root);
        assert!(!tree.contains(old_root));
    }

    #[test]
    fn test_reduce_score_is_collective_and_invalidated() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        let root = tree.expand(tree.root()).unwrap();

        // leaves {0,0,0} and {1,1,2}: 0 + 3 * (1 - 5/9); all six: 6 * (1 - 14/36)
        let expected = 3.0 * (4.0 / 9.0) - 6.0 * (22.0 / 36.0);
        assert_relative_eq!(tree.reduce_score(root).unwrap(), expected, max_relative = 1e-12);

        let left = tree.children(root).unwrap()[0];
        tree.insert_into(left, (0.0, 0, 2)).unwrap();
        // {0,0,0,2}: 4 * (1 - 10/16); all seven: 7 * (1 - 17/49)
        let expected = 4.0 * (6.0 / 16.0) + 3.0 * (4.0 / 9.0) - 7.0 * (32.0 / 49.0);
        assert_relative_eq!(tree.reduce_score(root).unwrap(), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_maximum_expand_leaf_prefers_best_score() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        let root = tree.expand(tree.root()).unwrap();
        let right = tree.children(root).unwrap()[1];

        // the left leaf is pure, only the right one can gain
        let (leaf, score) = tree.maximum_expand_leaf().unwrap();
        assert_eq!(leaf, right);
        assert!(score > 0.0);
    }

    #[test]
    fn test_maximum_reduce_inode() {
        let mut tree = tree();
        assert_eq!(tree.maximum_reduce_inode().unwrap(), None);

        tree.extend(samples()).unwrap();
        let root = tree.expand(tree.root()).unwrap();
        let right = tree.children(root).unwrap()[1];
        let inner = tree.expand(right).unwrap();

        let (inode, score) = tree.maximum_reduce_inode().unwrap().unwrap();
        assert_eq!(inode, inner);
        assert!(score <= 0.0);
        assert!(score >= tree.reduce_score(root).unwrap());
    }

    #[test]
    fn test_grow_until_pure() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        assert_eq!(tree.grow().unwrap(), 2);
        assert_eq!(tree.leaf_count(), 3);
        for leaf in tree.leaves() {
            let classes: Vec<usize> = tree
                .stored_sources(leaf)
                .unwrap()
                .iter()
                .map(|s| s.2)
                .collect();
            assert!(classes.windows(2).all(|w| w[0] == w[1]));
        }
    }

    #[test]
    fn test_grow_respects_budget() {
        let mut params = TreeParams::new();
        params.set_max_leaves(Some(2)).unwrap();
        let mut tree: DecisionTree<Sample> = DecisionTree::with_params(attributes(), target(), params);
        tree.extend(samples()).unwrap();
        assert_eq!(tree.grow().unwrap(), 1);
        assert_eq!(tree.leaf_count(), 2);
        let right = tree.leaves()[1];
        assert!(tree.expand_score(right).unwrap() > 0.0);

        let mut params = TreeParams::new();
        params.set_max_depth(Some(1)).unwrap();
        tree.set_params(params);
        assert!(tree.is_dirty(right).unwrap());
        assert_eq!(tree.grow().unwrap(), 0);

        let mut params = TreeParams::new();
        params.set_min_samples_split(7).unwrap();
        let mut tree: DecisionTree<Sample> = DecisionTree::with_params(attributes(), target(), params);
        tree.extend(samples()).unwrap();
        assert_eq!(tree.grow().unwrap(), 0);
    }

    #[test]
    fn test_prune_to_leaf_budget() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        tree.grow().unwrap();
        assert_eq!(tree.prune().unwrap(), 0);

        let mut params = TreeParams::new();
        params.set_max_leaves(Some(2)).unwrap();
        tree.set_params(params);
        assert_eq!(tree.prune().unwrap(), 1);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.stored_sources(tree.root()).unwrap().len(), 6);
    }

    #[test]
    fn test_prune_removes_weak_splits() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        tree.grow().unwrap();

        let mut params = TreeParams::new();
        params.set_min_gain(100.0).unwrap();
        tree.set_params(params);
        tree.prune().unwrap();
        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_partitions_cover_stored_sources() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        tree.grow().unwrap();
        let root = tree.root();

        let partitions = tree.partitioned_stored_sources(root).unwrap();
        assert_eq!(partitions.clone().count(), tree.leaf_count());
        let flattened: Vec<&Sample> = partitions.flatten().collect();
        assert_eq!(flattened, tree.stored_sources(root).unwrap());

        let mut all: Vec<Sample> = flattened.into_iter().copied().collect();
        all.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert_eq!(all, samples());
    }

    #[test]
    fn test_fit_leaves() {
        let mut tree = tree();
        tree.extend(samples()).unwrap();
        tree.grow().unwrap();

        let sizes = tree
            .fit_leaves(tree.root(), |memory| Ok(memory.len()))
            .unwrap();
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes.iter().map(|(_, n)| n).sum::<usize>(), 6);
        assert_eq!(
            sizes.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            tree.leaves()
        );

        let failing = tree.fit_leaves(tree.root(), |_| -> Result<()> {
            Err(ModelError::invalid_argument("nope"))
        });
        assert!(failing.is_err());
    }

    #[test]
    fn test_expand_builds_node_through_attribute() {
        let built = Rc::new(Cell::new(false));
        let mut tree: DecisionTree<Sample> = DecisionTree::new(
            vec![Box::new(Recording {
                inner: ContinuousAttribute::new("x", |s: &Sample| s.0),
                built: Rc::clone(&built),
            })],
            target(),
        );
        tree.extend(samples()).unwrap();

        let inode = tree.expand(tree.root()).unwrap();
        assert!(built.get());
        assert_eq!(tree.children(inode).unwrap().len(), 2);
    }

    #[test]
    fn test_failed_expand_keeps_leaf() {
        let calls = Rc::new(Cell::new(0));
        let mut tree: DecisionTree<Sample> = DecisionTree::new(vec![fixed(1.0, &calls)], target());
        tree.extend(samples()).unwrap();
        let root = tree.root();

        assert!(matches!(
            tree.expand(root),
            Err(ModelError::UnsupportedOperation(_))
        ));
        assert_eq!(tree.root(), root);
        assert!(tree.is_leaf(root).unwrap());
        assert!(!tree.is_dirty(root).unwrap());
        assert_eq!(tree.stored_sources(root).unwrap().len(), 6);
    }

    #[test]
    fn test_grow_skips_splits_wider_than_budget() {
        // color separates the classes perfectly but needs three leaves
        let data = vec![(0.0, 0, 0), (1.0, 1, 1), (2.0, 2, 2)];

        let mut params = TreeParams::new();
        params.set_max_leaves(Some(2)).unwrap();
        let mut tree: DecisionTree<Sample> = DecisionTree::with_params(attributes(), target(), params);
        tree.extend(data.clone()).unwrap();
        assert_eq!(tree.grow().unwrap(), 0);
        assert_eq!(tree.leaf_count(), 1);

        let mut params = TreeParams::new();
        params.set_max_leaves(Some(3)).unwrap();
        let mut tree: DecisionTree<Sample> = DecisionTree::with_params(attributes(), target(), params);
        tree.extend(data).unwrap();
        assert_eq!(tree.grow().unwrap(), 1);
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn test_grow_passes_over_leaf_whose_split_does_not_fit() {
        let mut tree = tree();
        tree.extend(vec![(0.0, 0, 0), (1.0, 0, 0), (10.0, 0, 3), (11.0, 0, 3), (12.0, 0, 4)])
            .unwrap();
        let root = tree.expand(tree.root()).unwrap();
        let (low, high) = match tree.children(root).unwrap() {
            [low, high] => (*low, *high),
            other => panic!("expected a binary split, got {} branches", other.len()),
        };

        // the low leaf now prefers a three-way color split over anything else
        assert_eq!(tree.insert((1.5, 1, 1)).unwrap(), low);
        assert_eq!(tree.insert((2.0, 2, 2)).unwrap(), low);
        assert!(tree.expand_score(low).unwrap() > tree.expand_score(high).unwrap());
        assert_eq!(tree.split_index(low).unwrap(), Some(1));

        let mut params = TreeParams::new();
        params.set_max_leaves(Some(3)).unwrap();
        tree.set_params(params);
        assert_eq!(tree.grow().unwrap(), 1);
        assert_eq!(tree.leaf_count(), 3);
        assert!(tree.is_leaf(low).unwrap());
        assert_eq!(tree.stored_sources(low).unwrap().len(), 4);
        assert!(!tree.is_leaf(high).unwrap());
    }

    #[test]
    fn test_grow_with_gaussian_target() {
        let mut params = TreeParams::new();
        params.set_max_leaves(Some(2)).unwrap();
        let mut tree: DecisionTree<f64> = DecisionTree::with_params(
            vec![Box::new(ContinuousAttribute::new("value", |s: &f64| *s))],
            Box::new(GaussianTarget::new("value", |s: &f64| DVector::from_element(1, *s))),
            params,
        );
        tree.extend(vec![0.0, 0.1, 0.2, 10.0, 10.1, 10.2]).unwrap();

        assert_eq!(tree.grow().unwrap(), 1);
        let groups: Vec<Vec<f64>> = tree
            .partitioned_stored_sources(tree.root())
            .unwrap()
            .map(|group| group.to_vec())
            .collect();
        assert_eq!(groups, vec![vec![0.0, 0.1, 0.2], vec![10.0, 10.1, 10.2]]);
    }
}
