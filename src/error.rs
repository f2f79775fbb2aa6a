//! Error types for the positioning pipeline.
//!
//! Missing elements are deliberately NOT errors: the synchronization engine
//! treats an unresolved reference/floating pair as "cannot compute yet" and
//! skips the update. Errors here mean a computation that started could not
//! finish and its partial state must be discarded.

use thiserror::Error;

use crate::platform::ElementId;

/// Failure inside a platform query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The element handle does not resolve to a mounted element. Happens
    /// when an element is removed mid-computation.
    #[error("element {0:?} is not mounted")]
    Unmounted(ElementId),
}

/// Failure of one `compute_position` invocation.
#[derive(Debug, Error)]
pub enum PositionError {
    /// A middleware kept requesting pipeline resets past the cap. This is a
    /// pipeline misconfiguration (an oscillating middleware), not a
    /// recoverable condition.
    #[error("middleware reset limit exceeded ({0} resets); the pipeline is oscillating")]
    ResetLimit(u32),

    /// A platform query failed mid-computation.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// A middleware emitted a payload that could not be serialized.
    #[error("middleware data serialization failed: {0}")]
    Data(#[from] serde_json::Error),
}
