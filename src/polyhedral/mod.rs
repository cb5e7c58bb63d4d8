//! Polyhedral data structures and operations.
//!
//! This module provides the set algebra consumed by the schedule tree:
//! - Affine expressions and constraints
//! - Constraint-defined integer sets (parameter contexts, statement domains)
//! - Explicit unions of points and relations between them
//! - Band functions (multi-member piecewise schedules)

pub mod space;
pub mod expr;
pub mod constraint;
pub mod set;
pub mod point;
pub mod union_set;
pub mod union_map;
pub mod aff;

pub use space::Space;
pub use expr::AffineExpr;
pub use constraint::{Constraint, ConstraintKind, ConstraintSystem};
pub use set::IntegerSet;
pub use point::Point;
pub use union_set::UnionSet;
pub use union_map::UnionMap;
pub use aff::{UnionPwAff, MultiUnionPwAff};
