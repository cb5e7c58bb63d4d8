//! Hardware-mapping labels and consolidation of nested mapping filters.
//!
//! Mapping filters record which block/thread dimensions a subset of the
//! statement instances is bound to. Mapping passes tend to emit one filter
//! per bound dimension, which leaves chains of mapping filters whose parent
//! is again a mapping filter. [`ScheduleTree::merge_consecutive_mapping_filters`]
//! folds such chains into single nodes.

use crate::schedule::elem::NodeType;
use crate::schedule::tree::{NodeId, ScheduleTree};
use crate::utils::{Id, ScheduleError, ScheduleErrorKind, ScheduleResult};
use log::debug;
use serde::{Serialize, Deserialize};
use std::fmt;

/// A hardware-mapping label such as a block or thread dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MappingId(Id);

impl MappingId {
    pub fn new(name: &str) -> Self {
        Self(Id::new(name))
    }

    /// Block dimension `dim` (`b0`, `b1`, ...).
    pub fn block(dim: usize) -> Self {
        Self::new(&format!("b{}", dim))
    }

    /// Thread dimension `dim` (`t0`, `t1`, ...).
    pub fn thread(dim: usize) -> Self {
        Self::new(&format!("t{}", dim))
    }

    pub fn id(&self) -> Id {
        self.0
    }
}

impl fmt::Display for MappingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ScheduleTree {
    /// Merge every mapping filter in the subtree of `node` into its parent
    /// when the parent is also a mapping filter with no other children, until
    /// no such pair is left.
    ///
    /// A pair is merged only if intersecting the filters keeps the number of
    /// statement spaces of both operands; otherwise it is left alone. The
    /// merged node keeps the intersection and the union of both identifier
    /// sets, and the child's own children take the child's place. An
    /// identifier present in both filters is an error.
    ///
    /// `root` must be a Domain or an Extension node.
    pub fn merge_consecutive_mapping_filters(&mut self, root: NodeId, node: NodeId) -> ScheduleResult<NodeId> {
        const OP: &str = "merge_consecutive_mapping_filters";
        if !matches!(self.node_type(root), NodeType::Domain | NodeType::Extension) {
            return Err(ScheduleError::new(
                ScheduleErrorKind::WrongNodeKind,
                OP,
                format!("relative root must be a domain or an extension, got {}", self.node_type(root)),
            ));
        }

        let mut changed = true;
        while changed {
            changed = false;
            for f in self.collect(node, NodeType::MappingFilter) {
                if f == root {
                    continue;
                }
                let p = self.ancestor(root, f, 1)?;
                if self.n_children(p) != 1 {
                    continue;
                }
                let (Some(parent), Some(child)) = (
                    self.elem(p).as_mapping_filter(),
                    self.elem(f).as_mapping_filter(),
                ) else {
                    continue;
                };

                let merged = parent.filter.intersect(&child.filter);
                if merged.n_set() != parent.filter.n_set() || merged.n_set() != child.filter.n_set() {
                    continue;
                }
                let parent_ids = parent.mapping_ids.clone().unwrap_or_default();
                let child_ids = child.mapping_ids.clone().unwrap_or_default();
                if let Some(id) = child_ids.intersection(&parent_ids).next() {
                    return Err(ScheduleError::new(
                        ScheduleErrorKind::MappingIdCollision,
                        OP,
                        format!("id {} mapped in both filters {} and {}", id, f, p),
                    ));
                }

                debug!("merging mapping filter {} into {}", f, p);
                let elem = self.elem_mut(p).as_filter_mut().ok_or_else(|| {
                    ScheduleError::new(ScheduleErrorKind::WrongNodeKind, OP, "expected a mapping filter")
                })?;
                elem.filter = merged;
                elem.mapping_ids = Some(parent_ids.union(&child_ids).copied().collect());
                let pos = self.position_in_parent(f).unwrap_or(0);
                let grandchildren = self.detach_children(f);
                let spliced = self.detach_child(p, pos)?;
                self.discard(spliced);
                for (offset, grandchild) in grandchildren.into_iter().enumerate() {
                    self.insert_child(p, pos + offset, grandchild)?;
                }
                changed = true;
                break;
            }
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::{Point, UnionSet};
    use crate::schedule::elem::BandElem;
    use crate::polyhedral::{AffineExpr, MultiUnionPwAff};
    use std::collections::BTreeSet;

    fn ids(list: &[MappingId]) -> BTreeSet<MappingId> {
        list.iter().copied().collect()
    }

    fn stmts() -> UnionSet {
        UnionSet::rectangular(Id::new("A"), &[8])
    }

    /// domain -> mf(b0) -> mf(t0) -> band
    fn chain(outer: UnionSet, inner: UnionSet, inner_ids: &[MappingId]) -> (ScheduleTree, NodeId, NodeId, NodeId) {
        let mut tree = ScheduleTree::new(stmts());
        let mupa = MultiUnionPwAff::from_affine(&stmts(), &AffineExpr::identity(1));
        let band = tree.make_band(BandElem::from_mupa(mupa), vec![]);
        let band_id = band.id();
        let inner = tree.make_mapping_filter(inner, ids(inner_ids), vec![band]);
        let inner_id = inner.id();
        let outer = tree.make_mapping_filter(outer, ids(&[MappingId::block(0)]), vec![inner]);
        let root = tree.root();
        let outer_id = tree.append_child(root, outer);
        (tree, outer_id, inner_id, band_id)
    }

    #[test]
    fn test_ids() {
        assert_eq!(MappingId::block(1).to_string(), "b1");
        assert_eq!(MappingId::thread(0), MappingId::new("t0"));
    }

    #[test]
    fn test_merge_chain() {
        let half = UnionSet::rectangular(Id::new("A"), &[4]);
        let (mut tree, outer, inner, band) = chain(stmts(), half.clone(), &[MappingId::thread(0)]);
        let root = tree.root();
        tree.merge_consecutive_mapping_filters(root, root).unwrap();

        assert!(!tree.contains(inner));
        assert_eq!(tree.children(outer), &[band]);
        let merged = tree.elem(outer).as_mapping_filter().unwrap();
        assert_eq!(merged.filter, half);
        assert_eq!(merged.mapping_ids, Some(ids(&[MappingId::block(0), MappingId::thread(0)])));
    }

    #[test]
    fn test_merge_keeps_siblings_active() {
        let (mut tree, outer, inner, _) = chain(stmts(), UnionSet::rectangular(Id::new("A"), &[2]), &[MappingId::thread(0)]);
        let root = tree.root();
        let mupa = MultiUnionPwAff::from_affine(&stmts(), &AffineExpr::identity(1));
        let sibling = tree.make_band(BandElem::from_mupa(mupa), vec![]);
        let sibling = tree.append_child(outer, sibling);
        let before = tree.active_domain(root, sibling).unwrap();

        tree.merge_consecutive_mapping_filters(root, root).unwrap();
        assert_eq!(tree.children(outer), &[inner, sibling]);
        assert_eq!(tree.active_domain(root, sibling).unwrap(), before);
        assert_eq!(before.len(), 8);
    }

    #[test]
    fn test_merge_skips_space_count_change() {
        let other = UnionSet::from_points([Point::new(Id::new("B"), vec![0])]);
        let (mut tree, outer, inner, _) = chain(stmts(), other, &[MappingId::thread(0)]);
        let root = tree.root();
        tree.merge_consecutive_mapping_filters(root, root).unwrap();
        assert_eq!(tree.children(outer), &[inner]);
    }

    #[test]
    fn test_merge_rejects_shared_id() {
        let (mut tree, outer, inner, _) = chain(stmts(), stmts(), &[MappingId::block(0)]);
        let root = tree.root();
        let err = tree.merge_consecutive_mapping_filters(root, root).unwrap_err();
        assert_eq!(err.kind, ScheduleErrorKind::MappingIdCollision);
        // Nothing was changed before the collision was detected.
        assert_eq!(tree.children(outer), &[inner]);
    }

    #[test]
    fn test_merge_requires_domain_or_extension_root() {
        let (mut tree, outer, _, _) = chain(stmts(), stmts(), &[MappingId::thread(0)]);
        let err = tree.merge_consecutive_mapping_filters(outer, outer).unwrap_err();
        assert_eq!(err.kind, ScheduleErrorKind::WrongNodeKind);
    }
}
