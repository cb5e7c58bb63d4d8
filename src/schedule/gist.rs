//! Context simplification of subtrees and filter-based reordering.

use crate::polyhedral::UnionSet;
use crate::schedule::elem::ScheduleElem;
use crate::schedule::tree::{Detached, NodeId, ScheduleTree};
use crate::utils::ScheduleResult;
use log::trace;

impl ScheduleTree {
    /// Simplify the subtree at `node` inside `context`.
    ///
    /// Band functions and filters are restricted to the context. A filter
    /// that becomes empty loses its children, and sequence children whose
    /// filter became empty are removed.
    pub fn gist(&mut self, node: NodeId, context: &UnionSet) -> ScheduleResult<()> {
        let emptied = match self.elem_mut(node) {
            ScheduleElem::Band(band) => {
                band.mupa = band.mupa.gist(context);
                false
            }
            ScheduleElem::Filter(filter) => {
                filter.filter = filter.filter.gist(context);
                filter.filter.is_empty()
            }
            _ => false,
        };
        if emptied {
            trace!("filter {} is empty in context, dropping its subtree", node);
            for child in self.detach_children(node) {
                self.discard(child);
            }
        }

        for child in self.children(node).to_vec() {
            self.gist(child, context)?;
        }

        if self.elem(node).is_sequence() {
            for pos in (0..self.n_children(node)).rev() {
                let child = self.children(node)[pos];
                let empty = self.elem(child).as_filter().map_or(false, |f| f.filter.is_empty());
                if empty {
                    let dead = self.detach_child(node, pos)?;
                    self.discard(dead);
                }
            }
        }
        Ok(())
    }

    /// A filter over `child`, the child being simplified in that filter.
    fn gisted_filter(&mut self, filter: UnionSet, child: Detached) -> ScheduleResult<Detached> {
        self.gist(child.id(), &filter)?;
        Ok(self.make_filter(filter, vec![child]))
    }

    fn order(&mut self, root: NodeId, node: NodeId, filter: UnionSet, filter_first: bool, operation: &'static str) -> ScheduleResult<NodeId> {
        let other = self.active_domain(root, node)?.subtract(&filter);
        let (parent, pos, subtree) = self.detach_at(root, node, operation)?;
        let copy = self.deep_copy(subtree.id());
        let matching = self.gisted_filter(filter, copy)?;
        let rest = self.gisted_filter(other, subtree)?;
        let children = if filter_first { vec![matching, rest] } else { vec![rest, matching] };
        let seq = self.make_sequence(children);
        self.insert_child(parent, pos, seq)
    }

    /// Replace `node` by a two-element sequence that executes the instances
    /// in `filter` first and the remaining active instances afterwards.
    /// Returns the sequence.
    pub fn order_before(&mut self, root: NodeId, node: NodeId, filter: UnionSet) -> ScheduleResult<NodeId> {
        self.order(root, node, filter, true, "order_before")
    }

    /// Like [`ScheduleTree::order_before`], with the instances in `filter`
    /// executed last.
    pub fn order_after(&mut self, root: NodeId, node: NodeId, filter: UnionSet) -> ScheduleResult<NodeId> {
        self.order(root, node, filter, false, "order_after")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::{AffineExpr, MultiUnionPwAff, Point};
    use crate::schedule::elem::{BandElem, NodeType};
    use crate::utils::Id;

    fn stmt(name: &str, extent: i64) -> UnionSet {
        UnionSet::rectangular(Id::new(name), &[extent])
    }

    /// domain A ∪ B -> sequence -> [filter A -> band, filter B -> band]
    fn two_statements() -> (ScheduleTree, NodeId, Vec<NodeId>) {
        let dom = stmt("A", 4).unite(&stmt("B", 4));
        let mut tree = ScheduleTree::new(dom.clone());
        let mupa = MultiUnionPwAff::from_affine(&dom, &AffineExpr::identity(1));
        let band_a = tree.make_band(BandElem::from_mupa(mupa.clone()), vec![]);
        let band_b = tree.make_band(BandElem::from_mupa(mupa), vec![]);
        let (band_a_id, band_b_id) = (band_a.id(), band_b.id());
        let fa = tree.make_filter(stmt("A", 4), vec![band_a]);
        let fb = tree.make_filter(stmt("B", 4), vec![band_b]);
        let (fa_id, fb_id) = (fa.id(), fb.id());
        let seq = tree.make_sequence(vec![fa, fb]);
        let root = tree.root();
        let seq_id = tree.append_child(root, seq);
        (tree, seq_id, vec![fa_id, band_a_id, fb_id, band_b_id])
    }

    #[test]
    fn test_gist_prunes_empty_sequence_children() {
        let (mut tree, seq, ids) = two_statements();
        tree.gist(seq, &stmt("B", 2)).unwrap();
        assert_eq!(tree.children(seq), &[ids[2]]);
        assert!(!tree.contains(ids[0]));
        assert!(!tree.contains(ids[1]));
        assert_eq!(tree.elem(ids[2]).as_filter().unwrap().filter, stmt("B", 2));
        assert_eq!(tree.elem(ids[3]).as_band().unwrap().mupa.domain(), stmt("B", 2));
    }

    #[test]
    fn test_gist_keeps_everything_in_full_context() {
        let (mut tree, seq, _) = two_statements();
        let before = tree.len();
        let dom = tree.active_domain(tree.root(), seq).unwrap();
        tree.gist(seq, &dom).unwrap();
        assert_eq!(tree.len(), before);
        assert_eq!(tree.n_children(seq), 2);
    }

    #[test]
    fn test_gist_of_empty_filter_outside_sequence_drops_children() {
        let (mut tree, _, ids) = two_statements();
        tree.gist(ids[0], &stmt("B", 4)).unwrap();
        assert!(tree.contains(ids[0]));
        assert_eq!(tree.n_children(ids[0]), 0);
    }

    #[test]
    fn test_order_before() {
        let (mut tree, _, ids) = two_statements();
        let root = tree.root();
        let band = ids[1];
        let first_half = stmt("A", 2);
        let seq = tree.order_before(root, band, first_half.clone()).unwrap();

        assert_eq!(tree.parent(seq), Some(ids[0]));
        let children = tree.children(seq).to_vec();
        assert_eq!(children.len(), 2);
        assert_eq!(tree.elem(children[0]).as_filter().unwrap().filter, first_half);
        assert_eq!(
            tree.elem(children[1]).as_filter().unwrap().filter,
            UnionSet::from_points([Point::new(Id::new("A"), vec![2]), Point::new(Id::new("A"), vec![3])]),
        );
        // The original band sits in the complementary branch, simplified.
        assert_eq!(tree.children(children[1]), &[band]);
        assert_eq!(tree.elem(band).as_band().unwrap().mupa.domain().len(), 2);
        let copy = tree.child(children[0], 0).unwrap();
        assert_eq!(tree.node_type(copy), NodeType::Band);
        assert_ne!(copy, band);
    }

    #[test]
    fn test_order_after_puts_filter_last() {
        let (mut tree, _, ids) = two_statements();
        let root = tree.root();
        let seq = tree.order_after(root, ids[1], stmt("A", 1)).unwrap();
        let last = tree.child(seq, 1).unwrap();
        assert_eq!(tree.elem(last).as_filter().unwrap().filter, stmt("A", 1));
        let first = tree.child(seq, 0).unwrap();
        assert_eq!(tree.children(first), &[ids[1]]);
    }
}
