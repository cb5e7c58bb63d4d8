//! Constraint-defined integer sets.
//!
//! An [`IntegerSet`] is a conjunction of affine constraints over set
//! dimensions and symbolic parameters. It serves two purposes:
//! - parameter-space contexts (zero set dimensions, constraints on parameters
//!   only), carried by Context nodes;
//! - statement domains, which are enumerated into explicit points once the
//!   parameters are instantiated.

use crate::polyhedral::constraint::{Constraint, ConstraintSystem};
use serde::{Serialize, Deserialize};
use std::fmt;

/// An integer set defined by affine constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerSet {
    pub constraints: ConstraintSystem,
    /// Names of parameters (optional, for printing)
    pub param_names: Vec<String>,
}

impl IntegerSet {
    /// The unconstrained set over `n_dim` dimensions and `n_param` parameters.
    pub fn universe(n_dim: usize, n_param: usize) -> Self {
        Self {
            constraints: ConstraintSystem::new(n_dim, n_param),
            param_names: Vec::new(),
        }
    }

    /// The unconstrained parameter-space set.
    pub fn params(n_param: usize) -> Self {
        Self::universe(0, n_param)
    }

    /// `0 <= x_k < bounds[k]` for every dimension.
    pub fn rectangular(bounds: &[i64]) -> Self {
        let n_dim = bounds.len();
        let mut set = Self::universe(n_dim, 0);
        for (i, &bound) in bounds.iter().enumerate() {
            set.add_constraint(Constraint::lower_bound(i, 0, n_dim, 0));
            set.add_constraint(Constraint::strict_upper_bound(i, bound, n_dim, 0));
        }
        set
    }

    pub fn dim(&self) -> usize { self.constraints.n_dim }
    pub fn n_param(&self) -> usize { self.constraints.n_param }

    /// Whether this is a parameter-space set.
    pub fn is_params(&self) -> bool {
        self.dim() == 0
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.add(constraint);
    }

    /// Builder form of [`IntegerSet::add_constraint`].
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.add_constraint(constraint);
        self
    }

    pub fn with_param_names(mut self, names: Vec<String>) -> Self {
        self.param_names = names;
        self
    }

    pub fn contains(&self, point: &[i64], params: &[i64]) -> bool {
        point.len() == self.dim() && self.constraints.is_satisfied(point, params)
    }

    /// Conjunction of both constraint systems.
    pub fn intersect(&self, other: &IntegerSet) -> IntegerSet {
        assert_eq!(self.dim(), other.dim());
        assert_eq!(self.n_param(), other.n_param());
        let mut result = self.clone();
        for c in &other.constraints.constraints {
            result.add_constraint(c.clone());
        }
        if result.param_names.is_empty() {
            result.param_names = other.param_names.clone();
        }
        result
    }

    /// All points inside the box `bounds` (inclusive lower, exclusive upper)
    /// that satisfy the constraints for the given parameter values, in
    /// lexicographic order.
    pub fn enumerate(&self, bounds: &[(i64, i64)], params: &[i64]) -> Vec<Vec<i64>> {
        assert_eq!(bounds.len(), self.dim());
        let mut points = Vec::new();
        if bounds.iter().any(|&(lo, hi)| lo >= hi) {
            return points;
        }
        let mut current: Vec<i64> = bounds.iter().map(|&(lo, _)| lo).collect();
        loop {
            if self.constraints.is_satisfied(&current, params) {
                points.push(current.clone());
            }
            // Odometer increment, innermost dimension fastest.
            let mut d = current.len();
            loop {
                if d == 0 {
                    return points;
                }
                d -= 1;
                current[d] += 1;
                if current[d] < bounds[d].1 {
                    break;
                }
                current[d] = bounds[d].0;
            }
        }
    }

    fn names(&self) -> (Vec<String>, Vec<String>) {
        let dims = (0..self.dim()).map(|i| format!("i{}", i)).collect();
        let params = (0..self.n_param())
            .map(|i| self.param_names.get(i).cloned().unwrap_or_else(|| format!("p{}", i)))
            .collect();
        (dims, params)
    }
}

impl fmt::Display for IntegerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (dim_names, param_names) = self.names();
        if !param_names.is_empty() {
            write!(f, "[{}] -> ", param_names.join(", "))?;
        }
        write!(f, "{{ [{}]", dim_names.join(", "))?;
        if !self.constraints.is_empty() {
            let parts: Vec<String> = self.constraints.constraints.iter()
                .map(|c| c.to_string_with_names(&dim_names, &param_names))
                .collect();
            write!(f, " : {}", parts.join(" and "))?;
        }
        write!(f, " }}")
    }
}
