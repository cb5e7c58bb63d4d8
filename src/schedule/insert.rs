//! Structural insertion: grafting bands, sequences, extensions and contexts
//! into an existing tree.
//!
//! Every operator returns the id of the node it created, so edits can be
//! chained. Ids of the nodes that were wrapped stay valid.

use crate::polyhedral::{IntegerSet, MultiUnionPwAff, UnionMap, UnionSet};
use crate::schedule::elem::{BandElem, NodeType};
use crate::schedule::tree::{NodeId, ScheduleTree};
use crate::utils::{Id, ScheduleError, ScheduleErrorKind, ScheduleResult};
use log::debug;

impl ScheduleTree {
    /// Wrap `node` in a new band carrying `mupa` and return the band.
    pub fn insert_band_above(&mut self, root: NodeId, node: NodeId, mupa: MultiUnionPwAff) -> ScheduleResult<NodeId> {
        let (parent, pos, subtree) = self.detach_at(root, node, "insert_band_above")?;
        let band = self.make_band(BandElem::from_mupa(mupa), vec![subtree]);
        self.insert_child(parent, pos, band)
    }

    /// Insert a band carrying `mupa` between `node` and its only child.
    pub fn insert_band_below(&mut self, node: NodeId, mupa: MultiUnionPwAff) -> ScheduleResult<NodeId> {
        let n = self.n_children(node);
        if n > 1 {
            return Err(ScheduleError::new(
                ScheduleErrorKind::TooManyChildren,
                "insert_band_below",
                format!("node {} has {} children", node, n),
            ));
        }
        let children = self.detach_children(node);
        let band = self.make_band(BandElem::from_mupa(mupa), children);
        Ok(self.append_child(node, band))
    }

    /// Wrap `node` in a one-child sequence, its filter being the active
    /// domain at `node`. Returns the sequence.
    pub fn insert_sequence_above(&mut self, root: NodeId, node: NodeId) -> ScheduleResult<NodeId> {
        let active = self.active_domain(root, node)?;
        let (parent, pos, subtree) = self.detach_at(root, node, "insert_sequence_above")?;
        let filter = self.make_filter(active, vec![subtree]);
        let seq = self.make_sequence(vec![filter]);
        self.insert_child(parent, pos, seq)
    }

    /// Wrap `node` in an extension carrying `extension`.
    pub fn insert_extension_above(&mut self, root: NodeId, node: NodeId, extension: UnionMap) -> ScheduleResult<NodeId> {
        let (parent, pos, subtree) = self.detach_at(root, node, "insert_extension_above")?;
        let ext = self.make_extension(extension, vec![subtree]);
        self.insert_child(parent, pos, ext)
    }

    pub fn insert_empty_extension_above(&mut self, root: NodeId, node: NodeId) -> ScheduleResult<NodeId> {
        if self.elem(root).as_domain().is_none() {
            return Err(ScheduleError::new(
                ScheduleErrorKind::RootNotDomain,
                "insert_empty_extension_above",
                format!("root must be a domain node, got {}", self.node_type(root)),
            ));
        }
        self.insert_extension_above(root, node, UnionMap::empty())
    }

    /// Insert a filter for the zero-dimensional label `id[]` at `pos` in the
    /// sequence `seq`, and make the extension directly above `seq` introduce
    /// that label at every point of the band schedule above it. An empty
    /// extension is inserted above `seq` first if there is none.
    ///
    /// Returns the label filter.
    pub fn insert_extension_label_at(&mut self, root: NodeId, seq: NodeId, pos: usize, id: Id) -> ScheduleResult<NodeId> {
        const OP: &str = "insert_extension_label_at";
        if !self.elem(seq).is_sequence() {
            return Err(ScheduleError::new(
                ScheduleErrorKind::WrongNodeKind,
                OP,
                format!("expected a sequence, {} is a {}", seq, self.node_type(seq)),
            ));
        }
        if pos > self.n_children(seq) {
            return Err(ScheduleError::new(
                ScheduleErrorKind::PositionOutOfBounds,
                OP,
                format!("position {} past the end of sequence {}", pos, seq),
            ));
        }

        let parent = self.ancestor(root, seq, 1)?;
        let ext_node = if self.node_type(parent) == NodeType::Extension {
            parent
        } else {
            self.insert_empty_extension_above(root, seq)?
        };

        let prefix = self.prefix_schedule_mupa(root, ext_node)?;
        let label = UnionSet::label(id);
        let relation = UnionMap::universe_between(&prefix.range(), &label);
        let extension = self.elem_mut(ext_node).as_extension_mut().ok_or_else(|| {
            ScheduleError::new(ScheduleErrorKind::WrongNodeKind, OP, "expected an extension node")
        })?;
        *extension = extension.unite(&relation);
        debug!("inserting label {} at position {} of {}", id, pos, seq);

        let filter = self.make_filter(label, vec![]);
        self.insert_child(seq, pos, filter)
    }

    /// Find or create the sequence a label next to `node` goes into.
    fn label_site(&mut self, root: NodeId, node: NodeId, after: bool) -> ScheduleResult<(NodeId, usize)> {
        if self.elem(node).is_sequence() {
            let pos = if after { self.n_children(node) } else { 0 };
            return Ok((node, pos));
        }
        let parent = self.ancestor(root, node, 1)?;
        if self.node_type(parent) == NodeType::Filter && parent != root {
            let grandparent = self.ancestor(root, parent, 1)?;
            if self.elem(grandparent).is_sequence() {
                let pos = self.position_in_parent(parent).unwrap_or(0);
                return Ok((grandparent, pos + usize::from(after)));
            }
        }
        let seq = self.insert_sequence_above(root, node)?;
        Ok((seq, usize::from(after)))
    }

    /// Insert the label `id` so that it executes right before `node`.
    pub fn insert_extension_label_before(&mut self, root: NodeId, node: NodeId, id: Id) -> ScheduleResult<NodeId> {
        let (seq, pos) = self.label_site(root, node, false)?;
        self.insert_extension_label_at(root, seq, pos, id)
    }

    /// Insert the label `id` so that it executes right after `node`.
    pub fn insert_extension_label_after(&mut self, root: NodeId, node: NodeId, id: Id) -> ScheduleResult<NodeId> {
        let (seq, pos) = self.label_site(root, node, true)?;
        self.insert_extension_label_at(root, seq, pos, id)
    }

    /// Intersect the parameter context directly below the Domain `root` with
    /// `context`, inserting an unconstrained Context node first if the root
    /// does not have one as its only child.
    pub fn update_top_level_context(&mut self, root: NodeId, context: &IntegerSet) -> ScheduleResult<NodeId> {
        const OP: &str = "update_top_level_context";
        if self.elem(root).as_domain().is_none() {
            return Err(ScheduleError::new(
                ScheduleErrorKind::RootNotDomain,
                OP,
                format!("root must be a domain node, got {}", self.node_type(root)),
            ));
        }
        if !context.is_params() {
            return Err(ScheduleError::new(
                ScheduleErrorKind::ContextSpaceMismatch,
                OP,
                format!("context must be a parameter set: {}", context),
            ));
        }

        let existing = match self.children(root) {
            [only] if self.node_type(*only) == NodeType::Context => Some(*only),
            _ => None,
        };
        let ctx_node = match existing {
            Some(node) => node,
            None => {
                let children = self.detach_children(root);
                let universe = IntegerSet::params(context.n_param());
                let ctx = self.make_context(universe, children);
                self.append_child(root, ctx)
            }
        };

        let current = self.elem_mut(ctx_node).as_context_mut().ok_or_else(|| {
            ScheduleError::new(ScheduleErrorKind::WrongNodeKind, OP, "expected a context node")
        })?;
        if current.n_param() != context.n_param() {
            return Err(ScheduleError::new(
                ScheduleErrorKind::ContextSpaceMismatch,
                OP,
                format!("context has {} parameters, expected {}", context.n_param(), current.n_param()),
            ));
        }
        *current = current.intersect(context);
        Ok(ctx_node)
    }
}
