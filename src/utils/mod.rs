//! Utility modules shared by the algebra and the schedule tree:
//! - Error types
//! - Identifier interning
//! - Indented text output

pub mod errors;
pub mod intern;
pub mod pretty;

// Re-exports
pub use errors::*;
pub use intern::Id;
pub use pretty::CodeFormatter;
