//! Finite binary relations between integer points.
//!
//! Schedules (statement instance -> schedule point) and extension relations
//! (schedule point -> introduced instance) are [`UnionMap`]s.

use crate::polyhedral::aff::MultiUnionPwAff;
use crate::polyhedral::point::Point;
use crate::polyhedral::union_set::UnionSet;
use serde::{Serialize, Deserialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A finite relation: a set of `(source, target)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnionMap {
    pairs: BTreeSet<(Point, Point)>,
}

impl UnionMap {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (Point, Point)>) -> Self {
        Self { pairs: pairs.into_iter().collect() }
    }

    /// Map every point of `domain` to the anonymous zero-dimensional point.
    pub fn from_domain(domain: &UnionSet) -> Self {
        Self::from_pairs(domain.iter().map(|p| (p.clone(), Point::anonymous(Vec::new()))))
    }

    /// The graph of a multi-member function, targets being anonymous points.
    pub fn from_mupa(mupa: &MultiUnionPwAff) -> Self {
        Self::from_pairs(mupa.iter().map(|(p, v)| (p.clone(), Point::anonymous(v.to_vec()))))
    }

    /// Every point of `domain` related to every point of `range`.
    pub fn universe_between(domain: &UnionSet, range: &UnionSet) -> Self {
        Self::from_pairs(
            domain.iter()
                .flat_map(|d| range.iter().map(move |r| (d.clone(), r.clone()))),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn contains(&self, src: &Point, dst: &Point) -> bool {
        self.pairs.contains(&(src.clone(), dst.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Point, &Point)> {
        self.pairs.iter().map(|(s, d)| (s, d))
    }

    pub fn domain(&self) -> UnionSet {
        self.pairs.iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn range(&self) -> UnionSet {
        self.pairs.iter().map(|(_, d)| d.clone()).collect()
    }

    pub fn reverse(&self) -> UnionMap {
        Self::from_pairs(self.pairs.iter().map(|(s, d)| (d.clone(), s.clone())))
    }

    pub fn intersect_domain(&self, set: &UnionSet) -> UnionMap {
        Self::from_pairs(self.pairs.iter().filter(|(s, _)| set.contains(s)).cloned())
    }

    pub fn intersect_range(&self, set: &UnionSet) -> UnionMap {
        Self::from_pairs(self.pairs.iter().filter(|(_, d)| set.contains(d)).cloned())
    }

    pub fn unite(&self, other: &UnionMap) -> UnionMap {
        Self { pairs: self.pairs.union(&other.pairs).cloned().collect() }
    }

    /// `{ x -> [y, z] : x -> y in self and x -> z in other }`
    ///
    /// Sources present in only one operand are dropped.
    pub fn flat_range_product(&self, other: &UnionMap) -> UnionMap {
        let mut by_source: BTreeMap<&Point, Vec<&Point>> = BTreeMap::new();
        for (src, right) in &other.pairs {
            by_source.entry(src).or_default().push(right);
        }
        let mut pairs = BTreeSet::new();
        for (src, left) in &self.pairs {
            for right in by_source.get(src).into_iter().flatten() {
                pairs.insert((src.clone(), left.flat_product(&right.coords)));
            }
        }
        Self { pairs }
    }
}

impl fmt::Display for UnionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pairs.is_empty() {
            return write!(f, "{{  }}");
        }
        let parts: Vec<String> = self.pairs.iter()
            .map(|(s, d)| format!("{} -> {}", s, d))
            .collect();
        write!(f, "{{ {} }}", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Id;

    fn a(i: i64) -> Point {
        Point::new(Id::new("A"), vec![i])
    }

    #[test]
    fn test_from_domain() {
        let dom = UnionSet::rectangular(Id::new("A"), &[3]);
        let map = UnionMap::from_domain(&dom);
        assert_eq!(map.len(), 3);
        assert_eq!(map.domain(), dom);
        assert_eq!(map.range(), UnionSet::from_points([Point::anonymous(vec![])]));
    }

    #[test]
    fn test_reverse_and_restrict() {
        let map = UnionMap::from_pairs([
            (a(0), Point::anonymous(vec![0])),
            (a(1), Point::anonymous(vec![0])),
            (a(2), Point::anonymous(vec![1])),
        ]);
        let rev = map.reverse();
        assert!(rev.contains(&Point::anonymous(vec![1]), &a(2)));
        let only_zero = map.intersect_range(&UnionSet::from_points([Point::anonymous(vec![0])]));
        assert_eq!(only_zero.domain(), UnionSet::from_points([a(0), a(1)]));
        let only_a2 = map.intersect_domain(&UnionSet::from_points([a(2)]));
        assert_eq!(only_a2.len(), 1);
    }

    #[test]
    fn test_flat_range_product() {
        let left = UnionMap::from_pairs([
            (a(0), Point::anonymous(vec![0])),
            (a(5), Point::anonymous(vec![1])),
        ]);
        let right = UnionMap::from_pairs([
            (a(0), Point::anonymous(vec![7, 8])),
            (a(9), Point::anonymous(vec![1, 1])),
        ]);
        let product = left.flat_range_product(&right);
        assert_eq!(product.len(), 1);
        assert!(product.contains(&a(0), &Point::anonymous(vec![0, 7, 8])));
    }

    #[test]
    fn test_apply_set() {
        let label = Point::label(Id::new("sync0"));
        let ext = UnionMap::from_pairs([(Point::anonymous(vec![1]), label.clone())]);
        let sched = UnionSet::from_points([Point::anonymous(vec![1]), Point::anonymous(vec![2])]);
        assert_eq!(sched.apply(&ext), UnionSet::from_points([label]));
        assert!(UnionSet::from_points([Point::anonymous(vec![2])]).apply(&ext).is_empty());
    }

    #[test]
    fn test_universe_between() {
        let dom = UnionSet::from_points([Point::anonymous(vec![0]), Point::anonymous(vec![1])]);
        let ran = UnionSet::label(Id::new("sync1"));
        let map = UnionMap::universe_between(&dom, &ran);
        assert_eq!(map.len(), 2);
        assert_eq!(map.range(), ran);
    }
}
