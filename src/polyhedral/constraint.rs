//! Linear constraints over tuple dimensions and parameters.
//!
//! A constraint is a linear inequality or equality:
//! - Inequality: expr >= 0
//! - Equality: expr = 0

use crate::polyhedral::expr::AffineExpr;
use serde::{Serialize, Deserialize};
use std::fmt;

/// A linear constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// The affine expression (constraint is: expr >= 0 or expr = 0)
    pub expr: AffineExpr,
    /// Kind of constraint
    pub kind: ConstraintKind,
}

/// Kind of constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Greater than or equal: expr >= 0
    Inequality,
    /// Equal: expr = 0
    Equality,
}

impl Constraint {
    /// Create an inequality constraint: expr >= 0
    pub fn ge_zero(expr: AffineExpr) -> Self {
        Self { expr, kind: ConstraintKind::Inequality }
    }

    /// Create an equality constraint: expr = 0
    pub fn eq_zero(expr: AffineExpr) -> Self {
        Self { expr, kind: ConstraintKind::Equality }
    }

    /// Create a constraint: lhs >= rhs
    pub fn ge(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        Self::ge_zero(lhs - rhs)
    }

    /// Create a constraint: lhs <= rhs
    pub fn le(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        Self::ge_zero(rhs - lhs)
    }

    /// Create a constraint: lhs = rhs
    pub fn eq(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        Self::eq_zero(lhs - rhs)
    }

    /// Create a lower bound constraint: var >= lower
    pub fn lower_bound(dim: usize, lower: i64, n_dim: usize, n_param: usize) -> Self {
        let mut expr = AffineExpr::var(dim, n_dim, n_param);
        expr.constant = -lower;
        Self::ge_zero(expr)
    }

    /// Create a strict upper bound constraint: var < upper
    pub fn strict_upper_bound(dim: usize, upper: i64, n_dim: usize, n_param: usize) -> Self {
        let mut expr = -AffineExpr::var(dim, n_dim, n_param);
        expr.constant = upper - 1;
        Self::ge_zero(expr)
    }

    /// Check if this constraint is satisfied by the given point.
    pub fn is_satisfied(&self, dim_values: &[i64], param_values: &[i64]) -> bool {
        let value = self.expr.evaluate(dim_values, param_values);
        match self.kind {
            ConstraintKind::Inequality => value >= 0,
            ConstraintKind::Equality => value == 0,
        }
    }

    pub fn n_dim(&self) -> usize {
        self.expr.n_dim()
    }

    pub fn n_param(&self) -> usize {
        self.expr.n_param()
    }

    /// Convert to string with given names.
    pub fn to_string_with_names(&self, dim_names: &[String], param_names: &[String]) -> String {
        let expr_str = self.expr.to_string_with_names(dim_names, param_names);
        match self.kind {
            ConstraintKind::Inequality => format!("{} >= 0", expr_str),
            ConstraintKind::Equality => format!("{} = 0", expr_str),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_names(&[], &[]))
    }
}

/// A conjunction of constraints over a fixed number of dimensions and parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSystem {
    pub constraints: Vec<Constraint>,
    pub n_dim: usize,
    pub n_param: usize,
}

impl ConstraintSystem {
    /// Create an unconstrained system.
    pub fn new(n_dim: usize, n_param: usize) -> Self {
        Self {
            constraints: Vec::new(),
            n_dim,
            n_param,
        }
    }

    /// Add a constraint.
    pub fn add(&mut self, constraint: Constraint) {
        assert_eq!(constraint.n_dim(), self.n_dim);
        assert_eq!(constraint.n_param(), self.n_param);
        self.constraints.push(constraint);
    }

    /// Check if a point satisfies all constraints.
    pub fn is_satisfied(&self, dim_values: &[i64], param_values: &[i64]) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(dim_values, param_values))
    }

    /// Check if the system has no constraints.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let lo = Constraint::lower_bound(0, 0, 2, 0);
        let hi = Constraint::strict_upper_bound(0, 10, 2, 0);
        assert!(lo.is_satisfied(&[0, 0], &[]));
        assert!(!lo.is_satisfied(&[-1, 0], &[]));
        assert!(hi.is_satisfied(&[9, 0], &[]));
        assert!(!hi.is_satisfied(&[10, 0], &[]));
    }

    #[test]
    fn test_equality() {
        // i = 5
        let c = Constraint::eq(AffineExpr::var(0, 1, 0), AffineExpr::constant(5, 1, 0));
        assert!(c.is_satisfied(&[5], &[]));
        assert!(!c.is_satisfied(&[4], &[]));
        assert_eq!(c.to_string(), "i0 - 5 = 0");
    }

    #[test]
    fn test_parametric_system() {
        // 0 <= i < N
        let mut sys = ConstraintSystem::new(1, 1);
        sys.add(Constraint::lower_bound(0, 0, 1, 1));
        sys.add(Constraint::le(
            AffineExpr::var(0, 1, 1),
            AffineExpr::param(0, 1, 1) - AffineExpr::constant(1, 1, 1),
        ));
        assert!(sys.is_satisfied(&[3], &[4]));
        assert!(!sys.is_satisfied(&[4], &[4]));
        assert_eq!(sys.len(), 2);
    }
}
