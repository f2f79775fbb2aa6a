//! Overflow detection - how far a rect exceeds its clipping region.
//!
//! [`detect_overflow`] is the single boundary primitive every
//! collision-aware middleware consumes. They must call it rather than
//! re-deriving overflow themselves, so all strategies agree on boundary
//! semantics.

use crate::error::PositionError;
use crate::middleware::MiddlewareState;
use crate::platform::{Boundary, ElementContext, OffsetParent, RootBoundary};
use crate::types::{Padding, Rect, SideObject, Strategy};

/// Boundary configuration for one overflow measurement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectOverflowOptions {
    /// What clips the element. Defaults to the clipping ancestor chain.
    pub boundary: Boundary,
    /// The outermost clipping region. Defaults to the viewport.
    pub root_boundary: RootBoundary,
    /// Which element overflow is measured for. Defaults to the floating
    /// element.
    pub element_context: ElementContext,
    /// Measure against the boundary of the *other* element instead.
    pub alt_boundary: bool,
    /// Virtual padding shrinking the clipping region.
    pub padding: Padding,
}

/// Signed per-side overflow of the context element against its effective
/// clipping rect: positive = overflowing, negative = clearance.
pub fn detect_overflow(
    state: &MiddlewareState<'_>,
    options: &DetectOverflowOptions,
) -> Result<SideObject, PositionError> {
    let padding = options.padding.expand();

    let context = if options.alt_boundary {
        options.element_context.opposite()
    } else {
        options.element_context
    };
    let boundary_element = match context {
        ElementContext::Floating => state.elements.floating,
        ElementContext::Reference => state.elements.reference,
    };

    let clipping = state.platform.clipping_rect(
        &mut state.cache.borrow_mut(),
        boundary_element,
        &options.boundary,
        options.root_boundary,
        state.strategy,
    )?;

    // The measured rect, in offset-parent space: for the floating context
    // this is the current coordinates, not the pre-middleware rect.
    let rect = match options.element_context {
        ElementContext::Floating => Rect::new(
            state.x,
            state.y,
            state.rects.floating.width,
            state.rects.floating.height,
        ),
        ElementContext::Reference => state.rects.reference,
    };

    let offset_parent = match state.strategy {
        Strategy::Fixed => OffsetParent::Window,
        Strategy::Absolute => state.platform.offset_parent(state.elements.floating)?,
    };
    let element = state
        .platform
        .convert_offset_parent_rect(rect, offset_parent, state.strategy)?
        .client_rect();

    Ok(SideObject {
        top: clipping.top - element.top + padding.top,
        bottom: element.bottom - clipping.bottom + padding.bottom,
        left: clipping.left - element.left + padding.left,
        right: element.right - clipping.right + padding.right,
    })
}

// =============================================================================
// Tests
// =============================================================================
