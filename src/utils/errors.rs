//! Error types for the schedule-tree engine.
//!
//! Every operator either completes or reports a violated precondition. There
//! is no partial-failure path: a [`ScheduleError`] means the tree was handed
//! to the operator in a shape it does not accept, and the calling pipeline is
//! expected to abort. Recoverable anomalies (resized tile-size vectors) are
//! logged instead and never surface here.

use thiserror::Error;

/// A violated operator precondition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} in {operation}")]
pub struct ScheduleError {
    /// The error message
    pub message: String,
    /// The kind of violation
    pub kind: ScheduleErrorKind,
    /// The operator that rejected its input
    pub operation: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleErrorKind {
    /// Operator applied to the wrong node variant
    WrongNodeKind,
    /// Schedule queries need a Domain root
    RootNotDomain,
    /// Split position or child position outside the valid range
    PositionOutOfBounds,
    /// Splitting a band without members
    EmptyBand,
    /// Tiling a band that is not permutable
    NonPermutableBand,
    /// Grafting at the relative root itself
    NotStrictRelativeRoot,
    /// Node is not below the given relative root
    NotADescendant,
    /// Inserting below a node with several children
    TooManyChildren,
    /// Two merged mapping filters share an identifier
    MappingIdCollision,
    /// Context parameter space does not match
    ContextSpaceMismatch,
}

impl ScheduleError {
    pub fn new(kind: ScheduleErrorKind, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            operation,
        }
    }
}

/// Result type using ScheduleError.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
