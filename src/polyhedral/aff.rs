//! Schedule functions: single coordinates and multi-member band functions.
//!
//! A band member maps every statement instance it covers to one integer
//! coordinate. The functions are kept as explicit graphs, so quasi-affine
//! operations such as `floor(x / t)` are exact and composition is pointwise.

use crate::polyhedral::expr::AffineExpr;
use crate::polyhedral::point::Point;
use crate::polyhedral::union_set::UnionSet;
use num_integer::Integer;
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt;

/// One schedule coordinate defined on a finite set of points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionPwAff {
    values: BTreeMap<Point, i64>,
}

impl UnionPwAff {
    pub fn from_values(values: impl IntoIterator<Item = (Point, i64)>) -> Self {
        Self { values: values.into_iter().collect() }
    }

    pub fn domain(&self) -> UnionSet {
        self.values.keys().cloned().collect()
    }

    pub fn eval(&self, point: &Point) -> Option<i64> {
        self.values.get(point).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Point, i64)> {
        self.values.iter().map(|(p, &v)| (p, v))
    }

    fn map_values(&self, f: impl Fn(i64) -> i64) -> Self {
        Self { values: self.values.iter().map(|(p, &v)| (p.clone(), f(v))).collect() }
    }

    /// `floor(self / divisor)`; the divisor must be positive.
    pub fn scale_down_floor(&self, divisor: i64) -> Self {
        assert!(divisor > 0, "tile divisor must be positive");
        self.map_values(|v| v.div_floor(&divisor))
    }

    pub fn scale(&self, factor: i64) -> Self {
        self.map_values(|v| v * factor)
    }

    /// Pointwise difference on the common domain.
    pub fn sub(&self, other: &UnionPwAff) -> Self {
        Self {
            values: self.values.iter()
                .filter_map(|(p, &v)| other.eval(p).map(|w| (p.clone(), v - w)))
                .collect(),
        }
    }
}

/// A band function: `n_member` coordinates per point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiUnionPwAff {
    n_member: usize,
    values: BTreeMap<Point, Vec<i64>>,
}

impl MultiUnionPwAff {
    /// The constant zero function with `n_member` members on `domain`.
    pub fn zero(domain: &UnionSet, n_member: usize) -> Self {
        Self::from_fn(domain, n_member, |_| vec![0; n_member])
    }

    /// One member per expression, evaluated on the coordinates of each point.
    pub fn from_affine(domain: &UnionSet, exprs: &[AffineExpr]) -> Self {
        Self::from_affine_with_params(domain, exprs, &[])
    }

    pub fn from_affine_with_params(domain: &UnionSet, exprs: &[AffineExpr], params: &[i64]) -> Self {
        Self::from_fn(domain, exprs.len(), |p| {
            exprs.iter().map(|e| e.evaluate(&p.coords, params)).collect()
        })
    }

    pub fn from_fn(domain: &UnionSet, n_member: usize, f: impl Fn(&Point) -> Vec<i64>) -> Self {
        let values = domain.iter()
            .map(|p| {
                let v = f(p);
                assert_eq!(v.len(), n_member, "function arity mismatch at {}", p);
                (p.clone(), v)
            })
            .collect();
        Self { n_member, values }
    }

    /// Union of two functions with the same number of members, typically
    /// defined on different statements.
    pub fn unite(&self, other: &MultiUnionPwAff) -> Self {
        assert_eq!(self.n_member, other.n_member);
        let mut values = self.values.clone();
        values.extend(other.values.iter().map(|(p, v)| (p.clone(), v.clone())));
        Self { n_member: self.n_member, values }
    }

    pub fn n_member(&self) -> usize {
        self.n_member
    }

    pub fn domain(&self) -> UnionSet {
        self.values.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn eval(&self, point: &Point) -> Option<&[i64]> {
        self.values.get(point).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Point, &[i64])> {
        self.values.iter().map(|(p, v)| (p, v.as_slice()))
    }

    /// The set of anonymous schedule points reached by the function.
    pub fn range(&self) -> UnionSet {
        self.values.values().map(|v| Point::anonymous(v.clone())).collect()
    }

    /// Member `pos` as a single-coordinate function.
    pub fn member(&self, pos: usize) -> UnionPwAff {
        assert!(pos < self.n_member, "member {} out of range", pos);
        UnionPwAff::from_values(self.values.iter().map(|(p, v)| (p.clone(), v[pos])))
    }

    /// Replace member `pos`; points on which `upa` is undefined are dropped.
    pub fn set_member(&self, pos: usize, upa: &UnionPwAff) -> Self {
        assert!(pos < self.n_member, "member {} out of range", pos);
        let values = self.values.iter()
            .filter_map(|(p, v)| {
                upa.eval(p).map(|value| {
                    let mut v = v.clone();
                    v[pos] = value;
                    (p.clone(), v)
                })
            })
            .collect();
        Self { n_member: self.n_member, values }
    }

    /// Concatenate the members of `other` after those of `self`, on the
    /// common domain.
    pub fn flat_range_product(&self, other: &MultiUnionPwAff) -> Self {
        let values = self.values.iter()
            .filter_map(|(p, v)| {
                other.eval(p).map(|w| {
                    let mut v = v.clone();
                    v.extend_from_slice(w);
                    (p.clone(), v)
                })
            })
            .collect();
        Self { n_member: self.n_member + other.n_member, values }
    }

    /// Remove members `first..first + n`.
    pub fn drop_members(&self, first: usize, n: usize) -> Self {
        assert!(first + n <= self.n_member, "dropping members past the end");
        let values = self.values.iter()
            .map(|(p, v)| {
                let mut v = v.clone();
                v.drain(first..first + n);
                (p.clone(), v)
            })
            .collect();
        Self { n_member: self.n_member - n, values }
    }

    /// Restrict the domain to `context`.
    pub fn gist(&self, context: &UnionSet) -> Self {
        let values = self.values.iter()
            .filter(|(p, _)| context.contains(p))
            .map(|(p, v)| (p.clone(), v.clone()))
            .collect();
        Self { n_member: self.n_member, values }
    }

    /// Multiply member `i` by `factors[i]`.
    pub fn scale_members(&self, factors: &[i64]) -> Self {
        assert_eq!(factors.len(), self.n_member);
        let values = self.values.iter()
            .map(|(p, v)| (p.clone(), v.iter().zip(factors).map(|(a, f)| a * f).collect()))
            .collect();
        Self { n_member: self.n_member, values }
    }

    /// Pointwise difference on the common domain.
    pub fn sub(&self, other: &MultiUnionPwAff) -> Self {
        assert_eq!(self.n_member, other.n_member);
        let values = self.values.iter()
            .filter_map(|(p, v)| {
                other.eval(p).map(|w| (p.clone(), v.iter().zip(w).map(|(a, b)| a - b).collect()))
            })
            .collect();
        Self { n_member: self.n_member, values }
    }
}

impl fmt::Display for MultiUnionPwAff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return write!(f, "[{}] {{  }}", self.n_member);
        }
        let parts: Vec<String> = self.values.iter()
            .map(|(p, v)| {
                let coords: Vec<String> = v.iter().map(|c| c.to_string()).collect();
                format!("{} -> [{}]", p, coords.join(", "))
            })
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
    fn test_floor_division_rounds_down() {
        let upa = UnionPwAff::from_values([(a(0), -5), (a(1), 7)]);
        let tiled = upa.scale_down_floor(4);
        assert_eq!(tiled.eval(&a(0)), Some(-2));
        assert_eq!(tiled.eval(&a(1)), Some(1));
    }

    #[test]
    fn test_members() {
        let dom = UnionSet::rectangular(Id::new("A"), &[4]);
        let exprs = vec![AffineExpr::var(0, 1, 0), AffineExpr::var(0, 1, 0).scale(2)];
        let mupa = MultiUnionPwAff::from_affine(&dom, &exprs);
        assert_eq!(mupa.n_member(), 2);
        assert_eq!(mupa.eval(&a(3)), Some(&[3, 6][..]));

        let second = mupa.member(1).scale(10);
        let updated = mupa.set_member(1, &second);
        assert_eq!(updated.eval(&a(3)), Some(&[3, 60][..]));

        let dropped = updated.drop_members(0, 1);
        assert_eq!(dropped.n_member(), 1);
        assert_eq!(dropped.eval(&a(3)), Some(&[60][..]));
    }

    #[test]
    fn test_flat_range_product_and_sub() {
        let dom = UnionSet::rectangular(Id::new("A"), &[3]);
        let id = MultiUnionPwAff::from_affine(&dom, &AffineExpr::identity(1));
        let product = id.flat_range_product(&id);
        assert_eq!(product.n_member(), 2);
        assert_eq!(product.eval(&a(2)), Some(&[2, 2][..]));

        let diff = product.sub(&product.scale_members(&[1, 0]));
        assert_eq!(diff.eval(&a(2)), Some(&[0, 2][..]));
    }

    #[test]
    fn test_gist_and_range() {
        let dom = UnionSet::rectangular(Id::new("A"), &[8]);
        let quarter = MultiUnionPwAff::from_fn(&dom, 1, |p| vec![p.coords[0] / 4]);
        assert_eq!(quarter.range().len(), 2);
        let first_half = quarter.gist(&UnionSet::rectangular(Id::new("A"), &[4]));
        assert_eq!(first_half.domain().len(), 4);
        assert_eq!(first_half.range().len(), 1);
    }

    #[test]
    fn test_zero_member_function_keeps_domain() {
        let dom = UnionSet::rectangular(Id::new("A"), &[2]);
        let zero = MultiUnionPwAff::zero(&dom, 0);
        assert_eq!(zero.domain(), dom);
        assert_eq!(zero.range(), UnionSet::from_points([Point::anonymous(vec![])]));
    }
}
