//! Middleware pipeline contract.
//!
//! A middleware is a pluggable step in the positioning pipeline: it reads
//! the current coordinates and rects, and may return adjusted coordinates,
//! a data payload, and a reset request. The computation core runs middleware
//! strictly in list order and restarts from the first middleware after each
//! reset (see [`crate::compute`]).
//!
//! The standard collision-aware middleware ([`flip`], [`shift`], [`hide`])
//! all measure boundaries through one shared primitive,
//! [`crate::overflow::detect_overflow`], which keeps boundary semantics
//! consistent across strategies.

pub mod arrow;
pub mod flip;
pub mod hide;
pub mod offset;
pub mod shift;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PositionError;
use crate::platform::{ElementId, Platform, QueryCache};
use crate::types::{ElementRects, Placement, Strategy};

pub use arrow::{arrow, ArrowData, ArrowOptions};
pub use flip::{flip, FallbackStrategy, FlipData, FlipOptions, PlacementOverflow};
pub use hide::{hide, HideData, HideOptions, HideStrategy};
pub use offset::{offset, OffsetData, OffsetValue};
pub use shift::{shift, ShiftData, ShiftOptions};

// =============================================================================
// Pipeline state
// =============================================================================

/// The reference/floating pair one computation is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elements {
    pub reference: ElementId,
    pub floating: ElementId,
}

/// The computation context threaded through each pipeline step.
///
/// Steps receive it by value and return adjustments instead of mutating it
/// in place; the core owns the merge, which keeps the reset-and-restart
/// logic auditable.
pub struct MiddlewareState<'a> {
    pub x: f64,
    pub y: f64,
    /// The placement the computation was configured with.
    pub initial_placement: Placement,
    /// The placement currently in effect (may differ after resets).
    pub placement: Placement,
    pub strategy: Strategy,
    pub rects: ElementRects,
    pub elements: Elements,
    /// Data accumulated by earlier steps (and earlier passes, after resets).
    pub middleware_data: &'a MiddlewareData,
    pub platform: &'a dyn Platform,
    /// The per-computation query cache, shared across resets.
    pub cache: &'a RefCell<QueryCache>,
}

/// Adjustments returned by one middleware step. All fields optional;
/// `Default` is "no change".
#[derive(Default)]
pub struct MiddlewareReturn {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub data: Option<Value>,
    pub reset: Option<Reset>,
}

/// A request to restart the pipeline from the first middleware.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reset {
    /// Placement to continue with.
    pub placement: Option<Placement>,
    /// Re-derive the element rects before restarting.
    pub rects: bool,
}

impl Reset {
    pub fn placement(placement: Placement) -> Reset {
        Reset { placement: Some(placement), rects: false }
    }

    pub fn rects() -> Reset {
        Reset { placement: None, rects: true }
    }
}

/// A pluggable positioning step.
pub trait Middleware {
    /// Key under which the step's data is stored. Unique per pipeline run;
    /// a later result for the same name merges over the earlier one.
    fn name(&self) -> &'static str;

    fn compute(&self, state: MiddlewareState<'_>) -> Result<MiddlewareReturn, PositionError>;
}

// =============================================================================
// Middleware data
// =============================================================================

/// Payloads emitted by middleware during one computation, keyed by
/// middleware name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MiddlewareData(BTreeMap<String, Value>);

impl MiddlewareData {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Deserialize a payload into its typed form. Absent or mismatched
    /// payloads read as `None`.
    pub fn deserialize<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.0.get(name)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Merge a payload under a name. Two objects merge shallowly; anything
    /// else overwrites.
    pub fn merge(&mut self, name: &str, value: Value) {
        match (self.0.get_mut(name), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                existing.extend(incoming);
            }
            (_, value) => {
                self.0.insert(name.to_string(), value);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Derivable options
// =============================================================================

/// An option value that is either static or derived from the pipeline state
/// at the point of use.
///
/// This is the crate's "value or function" mechanism: any numeric option can
/// be supplied as a constant or as a function of the run-time context, with
/// no runtime type inspection.
pub enum Derivable<T> {
    Static(T),
    Computed(Rc<dyn Fn(&MiddlewareState<'_>) -> T>),
}

impl<T: Clone> Derivable<T> {
    /// Resolve the option against the current pipeline state.
    pub fn evaluate(&self, state: &MiddlewareState<'_>) -> T {
        match self {
            Derivable::Static(value) => value.clone(),
            Derivable::Computed(derive) => derive(state),
        }
    }
}

impl<T> From<T> for Derivable<T> {
    fn from(value: T) -> Self {
        Derivable::Static(value)
    }
}

impl<T: Clone> Clone for Derivable<T> {
    fn clone(&self) -> Self {
        match self {
            Derivable::Static(value) => Derivable::Static(value.clone()),
            Derivable::Computed(derive) => Derivable::Computed(derive.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Derivable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Derivable::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Derivable::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
