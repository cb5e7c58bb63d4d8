//! Schedule trees and the operators that rewrite them.
//!
//! A schedule tree describes the relative execution order of statement
//! instances: a Domain root introduces the instances, Filters select subsets,
//! Bands assign schedule coordinates, Sequences order their children and
//! Extensions introduce extra instances such as synchronization labels.
//!
//! All operators are methods on [`ScheduleTree`] and take explicit node ids;
//! operators that restructure the tree return the id of the node to continue
//! editing from.

pub mod elem;
pub mod tree;
pub mod accumulate;
pub mod band;
pub mod insert;
pub mod gist;
pub mod mapping;
pub mod print;

pub use elem::{BandElem, FilterElem, NodeType, ScheduleElem};
pub use tree::{Detached, NodeId, ScheduleTree};
pub use band::TileOptions;
pub use mapping::MappingId;
