//! Platform abstraction - how the pipeline asks layout questions.
//!
//! The computation core never inspects a document tree itself. Every layout
//! fact it needs (rects, offset parents, clipping regions) is answered by a
//! [`Platform`] implementation. Any environment that can answer these
//! questions with synthetic or real geometry is a valid target; this crate
//! ships [`headless::HeadlessPlatform`] as its reference target.

pub mod headless;

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::PlatformError;
use crate::types::{ClientRect, Dimensions, ElementRects, Rect, Strategy};

// =============================================================================
// Element handles
// =============================================================================

/// Opaque handle to an element owned by a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub usize);

/// The ancestor establishing the coordinate space for positioned elements:
/// either a concrete element or the window/viewport itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetParent {
    Element(ElementId),
    Window,
}

// =============================================================================
// Boundaries
// =============================================================================

/// What clips the floating element, beyond the root boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    /// The element's scrollable/clipping ancestor chain. The default.
    ClippingAncestors,
    /// A specific element's rect.
    Element(ElementId),
    /// A fixed rect in viewport coordinates.
    Rect(Rect),
}

impl Default for Boundary {
    fn default() -> Self {
        Boundary::ClippingAncestors
    }
}

/// The outermost clipping region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RootBoundary {
    /// The visual viewport. The default.
    #[default]
    Viewport,
    /// The whole document rect.
    Document,
    /// A fixed rect in viewport coordinates.
    Rect(Rect),
}

/// Which of the two elements overflow is measured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementContext {
    #[default]
    Floating,
    Reference,
}

impl ElementContext {
    pub const fn opposite(self) -> ElementContext {
        match self {
            ElementContext::Floating => ElementContext::Reference,
            ElementContext::Reference => ElementContext::Floating,
        }
    }
}

// =============================================================================
// Per-computation cache
// =============================================================================

/// Scratch space owned by exactly one `compute_position` invocation.
///
/// Clipping-ancestor walks are the expensive platform query; resets within a
/// single computation re-use the memoized chains. The cache is created by
/// the caller of one top-level computation and dropped with it, so results
/// never leak across calls.
#[derive(Debug, Default)]
pub struct QueryCache {
    clipping_ancestors: HashMap<ElementId, Rc<[ElementId]>>,
}

impl QueryCache {
    pub fn clipping_ancestors(&self, element: ElementId) -> Option<Rc<[ElementId]>> {
        self.clipping_ancestors.get(&element).cloned()
    }

    pub fn store_clipping_ancestors(
        &mut self,
        element: ElementId,
        ancestors: Rc<[ElementId]>,
    ) {
        self.clipping_ancestors.insert(element, ancestors);
    }
}

// =============================================================================
// Platform trait
// =============================================================================

/// Capability interface the computation core depends on.
///
/// Contract: every method is a pure function of current platform state at
/// call time. No state may be retained across calls except via the
/// explicitly passed [`QueryCache`], whose lifetime is one computation.
pub trait Platform {
    /// The reference rect relative to the floating element's offset parent
    /// (or the viewport for the fixed strategy), plus the floating element's
    /// dimensions anchored at the origin.
    fn element_rects(
        &self,
        cache: &mut QueryCache,
        reference: ElementId,
        floating: ElementId,
        strategy: Strategy,
    ) -> Result<ElementRects, PlatformError>;

    /// The effective clipping rect for `element`, in viewport coordinates:
    /// the intersection of the root boundary with the configured boundary.
    fn clipping_rect(
        &self,
        cache: &mut QueryCache,
        element: ElementId,
        boundary: &Boundary,
        root_boundary: RootBoundary,
        strategy: Strategy,
    ) -> Result<ClientRect, PlatformError>;

    /// The ancestor establishing `element`'s positioning coordinate space.
    fn offset_parent(&self, element: ElementId) -> Result<OffsetParent, PlatformError>;

    /// Width and height of an element.
    fn dimensions(&self, element: ElementId) -> Result<Dimensions, PlatformError>;

    /// Convert a rect expressed relative to `offset_parent` into viewport
    /// coordinates, accounting for the offset parent's scroll.
    fn convert_offset_parent_rect(
        &self,
        rect: Rect,
        offset_parent: OffsetParent,
        strategy: Strategy,
    ) -> Result<Rect, PlatformError>;

    /// Whether the element lives in a right-to-left writing context.
    fn is_rtl(&self, _element: ElementId) -> Result<bool, PlatformError> {
        Ok(false)
    }

    /// Device pixel ratio at the element, for style rounding.
    fn device_pixel_ratio(&self, _element: ElementId) -> f64 {
        1.0
    }
}
