//! Arena-backed schedule tree.
//!
//! Nodes live in a slot vector and are addressed by [`NodeId`]. Each slot
//! records its parent for navigation and owns the ordered list of its
//! children. Subtrees that are not attached anywhere are held through a
//! [`Detached`] token; the token is move-only, so a subtree is either
//! attached under exactly one parent or owned by exactly one token.
//!
//! Accessing a freed `NodeId` is a bug in the caller and panics, like
//! indexing a slice out of bounds.

use crate::polyhedral::{IntegerSet, UnionMap, UnionSet};
use crate::schedule::elem::{BandElem, FilterElem, NodeType, ScheduleElem};
use crate::schedule::mapping::MappingId;
use crate::utils::{ScheduleError, ScheduleErrorKind, ScheduleResult};
use std::collections::BTreeSet;
use std::fmt;

/// Stable handle to a node of a [`ScheduleTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ownership of a subtree that is not attached to any parent.
///
/// Consumed by [`ScheduleTree::insert_child`], [`ScheduleTree::append_child`],
/// [`ScheduleTree::replace_child`] or [`ScheduleTree::discard`].
#[must_use = "a detached subtree must be attached or discarded"]
#[derive(Debug, PartialEq, Eq)]
pub struct Detached(NodeId);

impl Detached {
    /// The root of the detached subtree. The id stays valid once the
    /// subtree is attached.
    pub fn id(&self) -> NodeId {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Node {
    elem: ScheduleElem,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A schedule tree rooted at a Domain node.
#[derive(Debug, Clone)]
pub struct ScheduleTree {
    nodes: Vec<Option<Node>>,
    free: Vec<u32>,
    root: NodeId,
}

impl ScheduleTree {
    /// A tree consisting of a single Domain node.
    pub fn new(domain: UnionSet) -> Self {
        let mut tree = Self { nodes: Vec::new(), free: Vec::new(), root: NodeId(0) };
        let root = tree.alloc(ScheduleElem::Domain(domain), Vec::new());
        tree.root = root.0;
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, attached or detached.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.index()), Some(Some(_)))
    }

    fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("stale schedule tree node {}", id),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("stale schedule tree node {}", id),
        }
    }

    fn alloc(&mut self, elem: ScheduleElem, children: Vec<Detached>) -> Detached {
        let node = Node { elem, parent: None, children: Vec::new() };
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId((self.nodes.len() - 1) as u32)
            }
        };
        self.append_children(id, children);
        Detached(id)
    }

    // ------------------------------------------------------------------
    // Factories
    // ------------------------------------------------------------------

    pub fn make_context(&mut self, context: IntegerSet, children: Vec<Detached>) -> Detached {
        self.alloc(ScheduleElem::Context(context), children)
    }

    pub fn make_filter(&mut self, filter: UnionSet, children: Vec<Detached>) -> Detached {
        self.alloc(ScheduleElem::Filter(FilterElem::new(filter)), children)
    }

    pub fn make_mapping_filter(
        &mut self,
        filter: UnionSet,
        ids: BTreeSet<MappingId>,
        children: Vec<Detached>,
    ) -> Detached {
        self.alloc(ScheduleElem::Filter(FilterElem::mapping(filter, ids)), children)
    }

    pub fn make_band(&mut self, band: BandElem, children: Vec<Detached>) -> Detached {
        self.alloc(ScheduleElem::Band(band), children)
    }

    pub fn make_sequence(&mut self, children: Vec<Detached>) -> Detached {
        self.alloc(ScheduleElem::Sequence, children)
    }

    pub fn make_extension(&mut self, extension: UnionMap, children: Vec<Detached>) -> Detached {
        self.alloc(ScheduleElem::Extension(extension), children)
    }

    /// A detached copy of the subtree rooted at `node`.
    pub fn deep_copy(&mut self, node: NodeId) -> Detached {
        let elem = self.elem(node).clone();
        let children: Vec<Detached> = self.children(node)
            .to_vec()
            .into_iter()
            .map(|child| self.deep_copy(child))
            .collect();
        self.alloc(elem, children)
    }

    /// Free a detached subtree.
    pub fn discard(&mut self, subtree: Detached) {
        let mut stack = vec![subtree.0];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes[id.index()].take() {
                stack.extend(node.children);
                self.free.push(id.0);
            }
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn elem(&self, id: NodeId) -> &ScheduleElem {
        &self.node(id).elem
    }

    pub fn elem_mut(&mut self, id: NodeId) -> &mut ScheduleElem {
        &mut self.node_mut(id).elem
    }

    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.elem(id).node_type()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn n_children(&self, id: NodeId) -> usize {
        self.node(id).children.len()
    }

    pub fn child(&self, id: NodeId, pos: usize) -> Option<NodeId> {
        self.node(id).children.get(pos).copied()
    }

    /// Follow child positions from `id`.
    pub fn descendant(&self, id: NodeId, path: &[usize]) -> Option<NodeId> {
        path.iter().try_fold(id, |node, &pos| self.child(node, pos))
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Ancestors of `node` up to and including `root`, outermost first.
    /// `node` itself is not included; the list is empty when `node == root`.
    pub fn ancestors(&self, root: NodeId, node: NodeId) -> ScheduleResult<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut current = node;
        while current != root {
            match self.parent(current) {
                Some(parent) => {
                    result.push(parent);
                    current = parent;
                }
                None => {
                    return Err(ScheduleError::new(
                        ScheduleErrorKind::NotADescendant,
                        "ancestors",
                        format!("node {} is not below {}", node, root),
                    ));
                }
            }
        }
        result.reverse();
        Ok(result)
    }

    /// The ancestor `generation` levels above `node` (1 is the parent),
    /// which must not be above `root`.
    pub fn ancestor(&self, root: NodeId, node: NodeId, generation: usize) -> ScheduleResult<NodeId> {
        let ancestors = self.ancestors(root, node)?;
        if generation == 0 || generation > ancestors.len() {
            return Err(ScheduleError::new(
                ScheduleErrorKind::NotStrictRelativeRoot,
                "ancestor",
                format!("node {} has no ancestor {} levels up below {}", node, generation, root),
            ));
        }
        Ok(ancestors[ancestors.len() - generation])
    }

    pub fn position_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    /// Child positions leading from `root` down to `node`.
    pub fn position_relative_to(&self, root: NodeId, node: NodeId) -> ScheduleResult<Vec<usize>> {
        let ancestors = self.ancestors(root, node)?;
        let mut path = Vec::with_capacity(ancestors.len());
        for (i, &anc) in ancestors.iter().enumerate() {
            let next = ancestors.get(i + 1).copied().unwrap_or(node);
            let pos = self.children(anc).iter().position(|&c| c == next);
            path.extend(pos);
        }
        Ok(path)
    }

    /// Nodes of the given type in the subtree of `node`, in pre-order.
    pub fn collect(&self, node: NodeId, node_type: NodeType) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if self.node_type(id) == node_type {
                result.push(id);
            }
            stack.extend(self.children(id).iter().rev());
        }
        result
    }

    /// `start` followed by the nodes produced by repeatedly applying `next`
    /// until it returns `None`.
    pub fn collect_path<F>(&self, start: NodeId, mut next: F) -> Vec<NodeId>
    where
        F: FnMut(&Self, NodeId) -> Option<NodeId>,
    {
        let mut path = vec![start];
        let mut current = start;
        while let Some(n) = next(self, current) {
            path.push(n);
            current = n;
        }
        path
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub fn detach_child(&mut self, node: NodeId, pos: usize) -> ScheduleResult<Detached> {
        if pos >= self.n_children(node) {
            return Err(ScheduleError::new(
                ScheduleErrorKind::PositionOutOfBounds,
                "detach_child",
                format!("node {} has no child at position {}", node, pos),
            ));
        }
        let child = self.node_mut(node).children.remove(pos);
        self.node_mut(child).parent = None;
        Ok(Detached(child))
    }

    pub fn detach_children(&mut self, node: NodeId) -> Vec<Detached> {
        let children = std::mem::take(&mut self.node_mut(node).children);
        children
            .into_iter()
            .map(|child| {
                self.node_mut(child).parent = None;
                Detached(child)
            })
            .collect()
    }

    /// Attach `child` at `pos`. A rejected subtree is discarded.
    pub fn insert_child(&mut self, node: NodeId, pos: usize, child: Detached) -> ScheduleResult<NodeId> {
        if pos > self.n_children(node) {
            self.discard(child);
            return Err(ScheduleError::new(
                ScheduleErrorKind::PositionOutOfBounds,
                "insert_child",
                format!("position {} out of bounds for node {} with {} children", pos, node, self.n_children(node)),
            ));
        }
        let id = child.0;
        self.node_mut(id).parent = Some(node);
        self.node_mut(node).children.insert(pos, id);
        Ok(id)
    }

    pub fn append_child(&mut self, node: NodeId, child: Detached) -> NodeId {
        let id = child.0;
        self.node_mut(id).parent = Some(node);
        self.node_mut(node).children.push(id);
        id
    }

    pub fn append_children(&mut self, node: NodeId, children: Vec<Detached>) {
        for child in children {
            self.append_child(node, child);
        }
    }

    /// Put `child` at `pos` and hand back the subtree it displaces.
    pub fn replace_child(&mut self, node: NodeId, pos: usize, child: Detached) -> ScheduleResult<Detached> {
        let old = match self.detach_child(node, pos) {
            Ok(old) => old,
            Err(err) => {
                self.discard(child);
                return Err(err);
            }
        };
        self.insert_child(node, pos, child)?;
        Ok(old)
    }

    /// Graft `new_subtree` in place of `node`, which must be strictly below
    /// `relative_root`. Returns the id of the grafted subtree and the
    /// displaced one. On error `new_subtree` is discarded.
    pub fn swap_subtree(
        &mut self,
        relative_root: NodeId,
        node: NodeId,
        new_subtree: Detached,
    ) -> ScheduleResult<(NodeId, Detached)> {
        let (parent, pos, old) = match self.detach_at(relative_root, node, "swap_subtree") {
            Ok(site) => site,
            Err(err) => {
                self.discard(new_subtree);
                return Err(err);
            }
        };
        let id = self.insert_child(parent, pos, new_subtree)?;
        Ok((id, old))
    }

    /// Detach the subtree at `node` from `relative_root`'s subtree,
    /// returning the former parent, the position and the subtree.
    pub(crate) fn detach_at(
        &mut self,
        relative_root: NodeId,
        node: NodeId,
        operation: &'static str,
    ) -> ScheduleResult<(NodeId, usize, Detached)> {
        if relative_root == node {
            return Err(ScheduleError::new(
                ScheduleErrorKind::NotStrictRelativeRoot,
                operation,
                format!("node {} is the relative root", node),
            ));
        }
        let parent = self.ancestor(relative_root, node, 1)?;
        let pos = self.position_in_parent(node).unwrap_or(0);
        let subtree = self.detach_child(parent, pos)?;
        Ok((parent, pos, subtree))
    }
}
