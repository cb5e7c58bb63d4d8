//! # PolySched - Schedule Tree Transformations
//!
//! The schedule-tree layer of a polyhedral loop-nest compiler:
//! - Explicit integer-point sets, relations and band functions
//! - An arena-backed schedule tree with Domain, Context, Filter, Mapping
//!   Filter, Band, Sequence and Extension nodes
//! - Schedule accumulation (prefix/partial schedules, active domains)
//! - Band editing (split, join, tile, scale)
//! - Structural insertion of bands, sequences, extensions and labels
//! - Context simplification and mapping-filter consolidation
//!
//! ## Architecture
//!
//! ```text
//! Domain → Schedule Tree → Transformations → Code generator (external)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use polysched::prelude::*;
//!
//! let domain = UnionSet::rectangular(Id::new("A"), &[8]);
//! let mut tree = ScheduleTree::new(domain.clone());
//! let mupa = MultiUnionPwAff::from_affine(&domain, &AffineExpr::identity(1));
//! let band = tree.make_band(BandElem::from_mupa(mupa).with_permutable(true), vec![]);
//! let root = tree.root();
//! let band = tree.append_child(root, band);
//!
//! tree.band_tile(band, &[4], TileOptions::shift_point_loops())?;
//! let point = tree.child(band, 0).expect("tiling adds a point band");
//! tree.insert_extension_label_before(root, point, Id::new("sync0"))?;
//! println!("{}", tree);
//! # Ok::<(), ScheduleError>(())
//! ```

#![warn(clippy::all)]

pub mod polyhedral;
pub mod schedule;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::polyhedral::{
        AffineExpr, Constraint, IntegerSet, MultiUnionPwAff, Point, Space, UnionMap, UnionPwAff, UnionSet,
    };
    pub use crate::schedule::{
        BandElem, Detached, FilterElem, MappingId, NodeId, NodeType, ScheduleElem, ScheduleTree, TileOptions,
    };
    pub use crate::utils::errors::*;
    pub use crate::utils::Id;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
