//! # tether-ui
//!
//! Reactive floating element positioning for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! fine-grained reactivity.
//!
//! ## Architecture
//!
//! Positioning is a pure pipeline over platform-supplied geometry:
//! ```text
//! Platform queries → anchor coords → middleware pipeline → ComputedPosition
//! ```
//! [`compute_position`] runs that pipeline once. [`create_floating`] wraps it
//! in a synchronization engine that commits each result into signals and
//! re-runs it when elements, options, or observed geometry change.
//!
//! The core never touches a document tree: all layout questions go through
//! the [`Platform`] trait, and [`HeadlessPlatform`] ships as a complete
//! synthetic-geometry implementation.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Placement, Rect, SideObject, etc.)
//! - [`geometry`] - Pure placement and axis arithmetic
//! - [`platform`] - The platform abstraction and the headless platform
//! - [`overflow`] - Boundary overflow detection
//! - [`middleware`] - The pipeline contract and the standard middleware
//! - [`compute`] - The computation core
//! - [`floating`] - The reactive synchronization engine

pub mod compute;
pub mod error;
pub mod floating;
pub mod geometry;
pub mod middleware;
pub mod overflow;
pub mod platform;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use compute::{compute_position, ComputePositionConfig, ComputedPosition, RESET_LIMIT};

pub use error::{PlatformError, PositionError};

pub use floating::{
    create_floating, round_by_dpr, Cleanup, FloatingHandle, FloatingOptions, FloatingStyles,
    MountObserver, UpdateFn,
};

pub use geometry::{
    alignment_sides, clamp, compute_coords_from_placement, expanded_placements,
    opposite_axis_placements,
};

pub use middleware::{
    arrow, flip, hide, offset, shift, ArrowData, ArrowOptions, Derivable, Elements,
    FallbackStrategy, FlipData, FlipOptions, HideData, HideOptions, HideStrategy, Middleware,
    MiddlewareData, MiddlewareReturn, MiddlewareState, OffsetData, OffsetValue, Reset,
    ShiftData, ShiftOptions,
};

pub use overflow::{detect_overflow, DetectOverflowOptions};

pub use platform::headless::{ElementConfig, HeadlessPlatform};
pub use platform::{
    Boundary, ElementContext, ElementId, OffsetParent, Platform, QueryCache, RootBoundary,
};
