//! Finite unions of integer points across several spaces.
//!
//! Statement-instance sets, filters and active domains are all
//! [`UnionSet`]s. Points are kept in a `BTreeSet`, so every operation is
//! exact and iteration order is deterministic.

use crate::polyhedral::point::Point;
use crate::polyhedral::set::IntegerSet;
use crate::polyhedral::space::Space;
use crate::polyhedral::union_map::UnionMap;
use crate::utils::Id;
use serde::{Serialize, Deserialize};
use std::collections::BTreeSet;
use std::fmt;

/// A finite set of tagged integer points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnionSet {
    points: BTreeSet<Point>,
}

impl UnionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        Self { points: points.into_iter().collect() }
    }

    /// The set containing the single zero-dimensional point `id[]`.
    pub fn label(id: Id) -> Self {
        Self::from_points([Point::label(id)])
    }

    /// `{ tuple[x] : 0 <= x_k < extents[k] }`
    pub fn rectangular(tuple: Id, extents: &[i64]) -> Self {
        let bounds: Vec<(i64, i64)> = extents.iter().map(|&e| (0, e)).collect();
        Self::from_integer_set(tuple, &IntegerSet::rectangular(extents), &bounds, &[])
    }

    /// Enumerate the points of a constraint-defined set inside `bounds` for
    /// the given parameter values, tagging each with `tuple`.
    pub fn from_integer_set(tuple: Id, set: &IntegerSet, bounds: &[(i64, i64)], params: &[i64]) -> Self {
        Self::from_points(
            set.enumerate(bounds, params)
                .into_iter()
                .map(|coords| Point::new(tuple, coords)),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.points.contains(point)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    pub fn insert(&mut self, point: Point) -> bool {
        self.points.insert(point)
    }

    /// The distinct spaces the points live in.
    pub fn spaces(&self) -> BTreeSet<Space> {
        self.points.iter().map(Point::space).collect()
    }

    /// Number of distinct spaces (element tuples) in the set.
    pub fn n_set(&self) -> usize {
        self.spaces().len()
    }

    /// Points of the given space only.
    pub fn extract_space(&self, space: &Space) -> UnionSet {
        Self::from_points(self.points.iter().filter(|p| p.space() == *space).cloned())
    }

    pub fn intersect(&self, other: &UnionSet) -> UnionSet {
        Self { points: self.points.intersection(&other.points).cloned().collect() }
    }

    pub fn unite(&self, other: &UnionSet) -> UnionSet {
        Self { points: self.points.union(&other.points).cloned().collect() }
    }

    pub fn subtract(&self, other: &UnionSet) -> UnionSet {
        Self { points: self.points.difference(&other.points).cloned().collect() }
    }

    pub fn is_subset(&self, other: &UnionSet) -> bool {
        self.points.is_subset(&other.points)
    }

    /// Simplify with respect to `context`.
    ///
    /// For explicit sets the restriction to the context is the exact gist:
    /// it coincides with `self` on the context and is empty exactly when
    /// `self` does not meet the context.
    pub fn gist(&self, context: &UnionSet) -> UnionSet {
        self.intersect(context)
    }

    /// The image of this set under `map`.
    pub fn apply(&self, map: &UnionMap) -> UnionSet {
        Self::from_points(
            map.iter()
                .filter(|(src, _)| self.points.contains(src))
                .map(|(_, dst)| dst.clone()),
        )
    }
}

impl FromIterator<Point> for UnionSet {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::from_points(iter)
    }
}

impl fmt::Display for UnionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.points.is_empty() {
            return write!(f, "{{  }}");
        }
        let parts: Vec<String> = self.points.iter().map(|p| p.to_string()).collect();
        write!(f, "{{ {} }}", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(name: &str, coords: &[i64]) -> Point {
        Point::new(Id::new(name), coords.to_vec())
    }

    #[test]
    fn test_rectangular() {
        let set = UnionSet::rectangular(Id::new("A"), &[2, 3]);
        assert_eq!(set.len(), 6);
        assert!(set.contains(&stmt("A", &[1, 2])));
        assert!(!set.contains(&stmt("A", &[2, 0])));
    }

    #[test]
    fn test_boolean_operations() {
        let a = UnionSet::rectangular(Id::new("A"), &[4]);
        let b = UnionSet::from_points([stmt("A", &[2]), stmt("A", &[7])]);
        assert_eq!(a.intersect(&b), UnionSet::from_points([stmt("A", &[2])]));
        assert_eq!(a.unite(&b).len(), 5);
        assert_eq!(a.subtract(&b).len(), 3);
        assert!(a.intersect(&b).is_subset(&a));
    }

    #[test]
    fn test_n_set_counts_spaces() {
        let set = UnionSet::rectangular(Id::new("A"), &[3])
            .unite(&UnionSet::rectangular(Id::new("B"), &[2, 2]))
            .unite(&UnionSet::label(Id::new("sync0")));
        assert_eq!(set.n_set(), 3);
        assert_eq!(UnionSet::empty().n_set(), 0);
        let b = set.extract_space(&Space::set(Id::new("B"), 2));
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn test_gist_restricts_to_context() {
        let a = UnionSet::rectangular(Id::new("A"), &[4]);
        let ctx = UnionSet::rectangular(Id::new("A"), &[2]);
        assert_eq!(a.gist(&ctx), ctx);
        assert!(a.gist(&UnionSet::label(Id::new("other"))).is_empty());
    }

    #[test]
    fn test_display() {
        let set = UnionSet::from_points([stmt("A", &[0]), stmt("A", &[1])]);
        assert_eq!(set.to_string(), "{ A[0]; A[1] }");
        assert_eq!(UnionSet::empty().to_string(), "{  }");
    }
}
