//! Tagged integer tuples: the elements of every set and relation.

use crate::polyhedral::space::Space;
use crate::utils::Id;
use serde::{Serialize, Deserialize};
use std::fmt;

/// A single integer point, e.g. the statement instance `A[3, 1]`, the label
/// `sync0[]` or the anonymous schedule point `[0, 3]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub tuple: Option<Id>,
    pub coords: Vec<i64>,
}

impl Point {
    pub fn new(tuple: Id, coords: Vec<i64>) -> Self {
        Self { tuple: Some(tuple), coords }
    }

    /// A point of an anonymous (schedule) space.
    pub fn anonymous(coords: Vec<i64>) -> Self {
        Self { tuple: None, coords }
    }

    /// The zero-dimensional point tagged `tuple`.
    pub fn label(tuple: Id) -> Self {
        Self::new(tuple, Vec::new())
    }

    pub fn space(&self) -> Space {
        Space { tuple: self.tuple, n_dim: self.coords.len() }
    }

    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    /// Concatenate the coordinates of `other` onto an anonymous copy of this point.
    pub fn flat_product(&self, other: &[i64]) -> Point {
        let mut coords = self.coords.clone();
        coords.extend_from_slice(other);
        Point::anonymous(coords)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tuple) = self.tuple {
            write!(f, "{}", tuple)?;
        }
        let coords: Vec<String> = self.coords.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", coords.join(", "))
    }
}
