//! Schedule accumulation along the ancestor chain.
//!
//! The prefix schedule of a node maps every active statement instance to the
//! schedule coordinates contributed by the bands above it. The active domain
//! is the set of statement instances that reach the node after all filters
//! and extensions above it.

use crate::polyhedral::{MultiUnionPwAff, UnionMap, UnionSet};
use crate::schedule::elem::ScheduleElem;
use crate::schedule::tree::{NodeId, ScheduleTree};
use crate::utils::{ScheduleError, ScheduleErrorKind, ScheduleResult};

impl ScheduleTree {
    fn root_domain(&self, root: NodeId, operation: &'static str) -> ScheduleResult<&UnionSet> {
        self.elem(root).as_domain().ok_or_else(|| {
            ScheduleError::new(
                ScheduleErrorKind::RootNotDomain,
                operation,
                format!("root must be a domain node, got {}", self.node_type(root)),
            )
        })
    }

    /// Fold the contribution of `node` into `schedule`.
    fn extend_schedule(&self, node: NodeId, schedule: UnionMap) -> UnionMap {
        match self.elem(node) {
            ScheduleElem::Domain(domain) => UnionMap::from_domain(domain),
            ScheduleElem::Band(band) if band.n_member() > 0 => {
                schedule.flat_range_product(&UnionMap::from_mupa(&band.mupa))
            }
            ScheduleElem::Filter(filter) => schedule.intersect_domain(&filter.filter),
            ScheduleElem::Extension(extension) => {
                let introduced = extension.reverse().intersect_range(&schedule.range());
                schedule.unite(&introduced)
            }
            _ => schedule,
        }
    }

    fn accumulate_schedule(
        &self,
        root: NodeId,
        node: NodeId,
        include_node: bool,
        operation: &'static str,
    ) -> ScheduleResult<UnionMap> {
        let domain = self.root_domain(root, operation)?;
        let mut nodes = self.ancestors(root, node)?;
        if include_node || node == root {
            nodes.push(node);
        }
        let seed = UnionMap::from_domain(domain);
        Ok(nodes.into_iter().fold(seed, |schedule, anc| self.extend_schedule(anc, schedule)))
    }

    /// Schedule contributed by the strict ancestors of `node`, starting from
    /// the Domain `root`. At the root itself this is the zero-dimensional
    /// schedule of the domain.
    pub fn prefix_schedule(&self, root: NodeId, node: NodeId) -> ScheduleResult<UnionMap> {
        self.accumulate_schedule(root, node, false, "prefix_schedule")
    }

    /// Like [`ScheduleTree::prefix_schedule`], including `node` itself.
    pub fn partial_schedule(&self, root: NodeId, node: NodeId) -> ScheduleResult<UnionMap> {
        self.accumulate_schedule(root, node, true, "partial_schedule")
    }

    /// The flat range product of the band functions above `node`, starting
    /// from a zero-member function over the domain.
    pub fn prefix_schedule_mupa(&self, root: NodeId, node: NodeId) -> ScheduleResult<MultiUnionPwAff> {
        let domain = self.root_domain(root, "prefix_schedule_mupa")?;
        let zero = MultiUnionPwAff::zero(domain, 0);
        let prefix = self.ancestors(root, node)?
            .into_iter()
            .filter_map(|anc| self.elem(anc).as_band())
            .fold(zero, |prefix, band| prefix.flat_range_product(&band.mupa));
        Ok(prefix)
    }

    /// Statement instances active at `node`.
    ///
    /// Filters above `node` restrict the root domain; an Extension above it
    /// adds the points its relation attaches to the prefix schedule of the
    /// instances active at the extension.
    pub fn active_domain(&self, root: NodeId, node: NodeId) -> ScheduleResult<UnionSet> {
        let mut domain = self.root_domain(root, "active_domain")?.clone();
        if node == root {
            return Ok(domain);
        }
        for anc in self.ancestors(root, node)? {
            match self.elem(anc) {
                ScheduleElem::Filter(filter) => {
                    domain = domain.intersect(&filter.filter);
                }
                ScheduleElem::Extension(extension) => {
                    // Without a band above, the extension hangs off the
                    // zero-dimensional schedule and introduces its whole range.
                    let introduced = if self.prefix_schedule_mupa(root, anc)?.n_member() == 0 {
                        extension.range()
                    } else {
                        let parent_schedule = self.prefix_schedule(root, anc)?.intersect_domain(&domain);
                        parent_schedule.range().apply(extension)
                    };
                    domain = domain.unite(&introduced);
                }
                _ => {}
            }
        }
        Ok(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::{AffineExpr, Point};
    use crate::schedule::elem::BandElem;
    use crate::utils::Id;

    fn a(i: i64) -> Point {
        Point::new(Id::new("A"), vec![i])
    }

    fn sched(coords: &[i64]) -> Point {
        Point::anonymous(coords.to_vec())
    }

    /// domain A[0..4] -> band [i] -> filter A[0..2] -> band [2i]
    fn two_bands() -> (ScheduleTree, NodeId, NodeId, NodeId) {
        let dom = UnionSet::rectangular(Id::new("A"), &[4]);
        let mut tree = ScheduleTree::new(dom.clone());
        let inner_mupa = MultiUnionPwAff::from_affine(&dom, &[AffineExpr::var(0, 1, 0).scale(2)]);
        let inner = tree.make_band(BandElem::from_mupa(inner_mupa), vec![]);
        let inner_id = inner.id();
        let filter = tree.make_filter(UnionSet::rectangular(Id::new("A"), &[2]), vec![inner]);
        let filter_id = filter.id();
        let outer_mupa = MultiUnionPwAff::from_affine(&dom, &AffineExpr::identity(1));
        let outer = tree.make_band(BandElem::from_mupa(outer_mupa), vec![filter]);
        let root = tree.root();
        let outer_id = tree.append_child(root, outer);
        (tree, outer_id, filter_id, inner_id)
    }

    #[test]
    fn test_prefix_and_partial_schedule() {
        let (tree, outer, filter, inner) = two_bands();
        let root = tree.root();

        let at_root = tree.prefix_schedule(root, root).unwrap();
        assert_eq!(at_root, UnionMap::from_domain(&UnionSet::rectangular(Id::new("A"), &[4])));

        let at_outer = tree.prefix_schedule(root, outer).unwrap();
        assert_eq!(at_outer.range(), UnionSet::from_points([sched(&[])]));

        let at_filter = tree.prefix_schedule(root, filter).unwrap();
        assert!(at_filter.contains(&a(3), &sched(&[3])));

        let at_inner = tree.prefix_schedule(root, inner).unwrap();
        assert_eq!(at_inner.len(), 2);
        assert!(at_inner.contains(&a(1), &sched(&[1])));

        let partial = tree.partial_schedule(root, inner).unwrap();
        assert!(partial.contains(&a(1), &sched(&[1, 2])));
        assert!(!partial.contains(&a(3), &sched(&[3, 6])));
    }

    #[test]
    fn test_prefix_schedule_mupa_skips_filters() {
        let (tree, _, _, inner) = two_bands();
        let root = tree.root();
        let mupa = tree.prefix_schedule_mupa(root, inner).unwrap();
        assert_eq!(mupa.n_member(), 1);
        assert_eq!(mupa.domain().len(), 4);
        assert_eq!(tree.prefix_schedule_mupa(root, root).unwrap().n_member(), 0);
    }

    #[test]
    fn test_active_domain_filters() {
        let (tree, outer, _, inner) = two_bands();
        let root = tree.root();
        assert_eq!(tree.active_domain(root, outer).unwrap().len(), 4);
        assert_eq!(tree.active_domain(root, inner).unwrap(), UnionSet::rectangular(Id::new("A"), &[2]));
    }

    #[test]
    fn test_active_domain_through_extension() {
        let dom = UnionSet::rectangular(Id::new("A"), &[4]);
        let mut tree = ScheduleTree::new(dom.clone());
        let label = Point::label(Id::new("sync"));
        let ext = UnionMap::from_pairs([(sched(&[0]), label.clone()), (sched(&[7]), Point::label(Id::new("never")))]);
        let seq = tree.make_sequence(vec![]);
        let seq_id = seq.id();
        let extension = tree.make_extension(ext, vec![seq]);
        let mupa = MultiUnionPwAff::from_fn(&dom, 1, |_| vec![0]);
        let band = tree.make_band(BandElem::from_mupa(mupa), vec![extension]);
        let root = tree.root();
        tree.append_child(root, band);

        let active = tree.active_domain(root, seq_id).unwrap();
        assert_eq!(active, dom.unite(&UnionSet::from_points([label.clone()])));

        let prefix = tree.prefix_schedule(root, seq_id).unwrap();
        assert!(prefix.contains(&label, &sched(&[0])));
    }

    #[test]
    fn test_extension_without_band_introduces_range() {
        let dom = UnionSet::rectangular(Id::new("A"), &[2]);
        let mut tree = ScheduleTree::new(dom.clone());
        let label = UnionSet::label(Id::new("sync"));
        let ext = UnionMap::universe_between(&UnionSet::from_points([sched(&[])]), &label);
        let seq = tree.make_sequence(vec![]);
        let seq_id = seq.id();
        let extension = tree.make_extension(ext, vec![seq]);
        let root = tree.root();
        tree.append_child(root, extension);
        assert_eq!(tree.active_domain(root, seq_id).unwrap(), dom.unite(&label));
    }

    #[test]
    fn test_root_must_be_domain() {
        let (tree, outer, _, inner) = two_bands();
        let err = tree.active_domain(outer, inner).unwrap_err();
        assert_eq!(err.kind, ScheduleErrorKind::RootNotDomain);
        let err = tree.prefix_schedule(outer, inner).unwrap_err();
        assert_eq!(err.kind, ScheduleErrorKind::RootNotDomain);
    }
}
