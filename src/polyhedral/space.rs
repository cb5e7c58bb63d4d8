//! Spaces describe the shape of a tagged integer tuple.
//!
//! A space is a tuple identifier (the statement or label name) plus the
//! number of integer dimensions. Statement instances `A[i, j]` live in the
//! space `A[2]`, synchronization labels `sync0[]` in `sync0[0]`, and schedule
//! points produced by bands are anonymous (`[n]`).

use crate::utils::Id;
use serde::{Serialize, Deserialize};
use std::fmt;

/// The space of a tagged integer tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Space {
    /// Tuple identifier (`None` for anonymous schedule spaces)
    pub tuple: Option<Id>,
    /// Number of set dimensions
    pub n_dim: usize,
}

impl Space {
    /// Create a named set space.
    pub fn set(tuple: Id, n_dim: usize) -> Self {
        Self { tuple: Some(tuple), n_dim }
    }

    /// Create an anonymous space, as produced by schedule functions.
    pub fn anonymous(n_dim: usize) -> Self {
        Self { tuple: None, n_dim }
    }

    /// A zero-dimensional space tagged with `tuple`.
    pub fn label(tuple: Id) -> Self {
        Self::set(tuple, 0)
    }

    pub fn is_anonymous(&self) -> bool {
        self.tuple.is_none()
    }

    pub fn dim(&self) -> usize {
        self.n_dim
    }

    /// Default dimension names `i0, i1, ...`.
    pub fn dim_names(&self) -> Vec<String> {
        (0..self.n_dim).map(|i| format!("i{}", i)).collect()
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tuple) = self.tuple {
            write!(f, "{}", tuple)?;
        }
        write!(f, "[{}]", self.n_dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_space() {
        let space = Space::set(Id::new("S"), 3);
        assert!(!space.is_anonymous());
        assert_eq!(space.dim(), 3);
        assert_eq!(space.to_string(), "S[3]");
    }

    #[test]
    fn test_label_space() {
        let space = Space::label(Id::new("sync0"));
        assert_eq!(space.dim(), 0);
        assert_eq!(space.to_string(), "sync0[0]");
    }

    #[test]
    fn test_anonymous_space() {
        let space = Space::anonymous(2);
        assert!(space.is_anonymous());
        assert_eq!(space.dim_names(), vec!["i0".to_string(), "i1".to_string()]);
    }
}
