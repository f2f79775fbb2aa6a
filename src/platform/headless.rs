//! Headless platform - synthetic geometry for non-browser targets.
//!
//! A complete [`Platform`] implementation backed by an element registry
//! instead of a document: each element is a rect in viewport coordinates
//! plus scroll offsets, a clipping flag, and parent/offset-parent links.
//! Tests, virtualized layouts, and terminal renderers position against it
//! exactly the way a browser adapter would.
//!
//! Every mutation bumps a generation signal, which is what the
//! [`HeadlessPlatform::while_mounted`] observer subscribes to: any geometry
//! change re-runs the synchronization engine's update function.

use std::cell::RefCell;
use std::rc::Rc;

use spark_signals::{effect, signal, Signal};

use super::{Boundary, ElementId, OffsetParent, Platform, QueryCache, RootBoundary};
use crate::error::PlatformError;
use crate::floating::{Cleanup, MountObserver, UpdateFn};
use crate::types::{ClientRect, Coords, Dimensions, ElementRects, Rect, Strategy};

// =============================================================================
// Element configuration
// =============================================================================

/// Geometry of one synthetic element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementConfig {
    /// Bounding box in viewport coordinates.
    pub rect: Rect,
    /// Scroll offsets applied to this element's content.
    pub scroll: Coords,
    /// Whether this element clips descendants (overflow hidden/scroll).
    pub clips_content: bool,
    /// Containment parent, for the clipping ancestor chain.
    pub parent: Option<ElementId>,
    /// Positioning ancestor. `None` means the window.
    pub offset_parent: Option<ElementId>,
    /// Right-to-left writing context.
    pub rtl: bool,
    /// Device pixel ratio reported for this element.
    pub device_pixel_ratio: f64,
}

impl Default for ElementConfig {
    fn default() -> Self {
        ElementConfig {
            rect: Rect::default(),
            scroll: Coords::default(),
            clips_content: false,
            parent: None,
            offset_parent: None,
            rtl: false,
            device_pixel_ratio: 1.0,
        }
    }
}

impl ElementConfig {
    pub fn with_rect(rect: Rect) -> ElementConfig {
        ElementConfig { rect, ..Default::default() }
    }
}

// =============================================================================
// Registry
// =============================================================================

#[derive(Debug, Default)]
struct Registry {
    elements: Vec<Option<ElementConfig>>,
    viewport: Rect,
    document: Rect,
}

impl Registry {
    fn get(&self, id: ElementId) -> Result<&ElementConfig, PlatformError> {
        self.elements
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(PlatformError::Unmounted(id))
    }

    fn get_mut(&mut self, id: ElementId) -> Result<&mut ElementConfig, PlatformError> {
        self.elements
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(PlatformError::Unmounted(id))
    }
}

// =============================================================================
// Headless platform
// =============================================================================

/// Synthetic-geometry platform. See the module docs.
pub struct HeadlessPlatform {
    registry: RefCell<Registry>,
    generation: Signal<u64>,
}

impl HeadlessPlatform {
    /// Create a platform with a viewport (and document) of the given size.
    pub fn new(width: f64, height: f64) -> Rc<HeadlessPlatform> {
        let viewport = Rect::new(0.0, 0.0, width, height);
        Rc::new(HeadlessPlatform {
            registry: RefCell::new(Registry {
                elements: Vec::new(),
                viewport,
                document: viewport,
            }),
            generation: signal(0u64),
        })
    }

    /// Mount an element. Freed slots are reused.
    pub fn insert(&self, config: ElementConfig) -> ElementId {
        let mut registry = self.registry.borrow_mut();
        let id = match registry.elements.iter().position(Option::is_none) {
            Some(slot) => {
                registry.elements[slot] = Some(config);
                ElementId(slot)
            }
            None => {
                registry.elements.push(Some(config));
                ElementId(registry.elements.len() - 1)
            }
        };
        drop(registry);
        self.bump();
        id
    }

    /// Unmount an element. Queries against it fail afterwards.
    pub fn remove(&self, id: ElementId) {
        if let Some(slot) = self.registry.borrow_mut().elements.get_mut(id.0) {
            *slot = None;
        }
        self.bump();
    }

    pub fn is_mounted(&self, id: ElementId) -> bool {
        self.registry
            .borrow()
            .elements
            .get(id.0)
            .is_some_and(Option::is_some)
    }

    pub fn set_rect(&self, id: ElementId, rect: Rect) -> Result<(), PlatformError> {
        self.registry.borrow_mut().get_mut(id)?.rect = rect;
        self.bump();
        Ok(())
    }

    pub fn set_scroll(&self, id: ElementId, scroll: Coords) -> Result<(), PlatformError> {
        self.registry.borrow_mut().get_mut(id)?.scroll = scroll;
        self.bump();
        Ok(())
    }

    pub fn set_viewport(&self, viewport: Rect) {
        self.registry.borrow_mut().viewport = viewport;
        self.bump();
    }

    pub fn set_document(&self, document: Rect) {
        self.registry.borrow_mut().document = document;
        self.bump();
    }

    /// The generation signal bumped on every mutation. Reading it inside an
    /// effect subscribes that effect to all geometry changes.
    pub fn generation(&self) -> Signal<u64> {
        self.generation.clone()
    }

    /// Mount observer wired to this platform's generation signal: performs
    /// an immediate update, then re-runs the update whenever any geometry
    /// changes. The returned cleanup stops the subscription.
    pub fn while_mounted(self: &Rc<Self>) -> MountObserver {
        let generation = self.generation.clone();
        Rc::new(move |_reference, _floating, update: UpdateFn| -> Cleanup {
            update();
            let generation = generation.clone();
            let stop = effect(move || {
                let _ = generation.get();
                update();
            });
            Box::new(stop)
        })
    }

    fn bump(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    /// Walk the parent chain collecting clipping ancestors, memoized in the
    /// per-computation cache.
    fn clipping_ancestors(
        &self,
        cache: &mut QueryCache,
        element: ElementId,
    ) -> Result<Rc<[ElementId]>, PlatformError> {
        if let Some(ancestors) = cache.clipping_ancestors(element) {
            return Ok(ancestors);
        }

        let registry = self.registry.borrow();
        let mut ancestors = Vec::new();
        let mut current = registry.get(element)?.parent;
        while let Some(id) = current {
            let config = registry.get(id)?;
            if config.clips_content {
                ancestors.push(id);
            }
            current = config.parent;
        }

        let ancestors: Rc<[ElementId]> = ancestors.into();
        cache.store_clipping_ancestors(element, ancestors.clone());
        Ok(ancestors)
    }

    /// An element's rect re-expressed relative to an offset parent.
    fn rect_relative_to(
        &self,
        element: ElementId,
        offset_parent: OffsetParent,
    ) -> Result<Rect, PlatformError> {
        let registry = self.registry.borrow();
        let rect = registry.get(element)?.rect;
        match offset_parent {
            OffsetParent::Window => Ok(rect),
            OffsetParent::Element(parent) => {
                let parent = registry.get(parent)?;
                Ok(Rect::new(
                    rect.x - parent.rect.x + parent.scroll.x,
                    rect.y - parent.rect.y + parent.scroll.y,
                    rect.width,
                    rect.height,
                ))
            }
        }
    }
}

fn intersect(a: ClientRect, b: ClientRect) -> ClientRect {
    // Deliberately unguarded min/max: a disjoint pair yields a negative-size
    // region, which overflow math handles.
    let top = a.top.max(b.top);
    let left = a.left.max(b.left);
    let right = a.right.min(b.right);
    let bottom = a.bottom.min(b.bottom);
    Rect::new(left, top, right - left, bottom - top).client_rect()
}

impl Platform for HeadlessPlatform {
    fn element_rects(
        &self,
        _cache: &mut QueryCache,
        reference: ElementId,
        floating: ElementId,
        strategy: Strategy,
    ) -> Result<ElementRects, PlatformError> {
        let offset_parent = match strategy {
            Strategy::Fixed => OffsetParent::Window,
            Strategy::Absolute => self.offset_parent(floating)?,
        };
        let reference = self.rect_relative_to(reference, offset_parent)?;
        let dimensions = self.dimensions(floating)?;
        Ok(ElementRects {
            reference,
            floating: Rect::new(0.0, 0.0, dimensions.width, dimensions.height),
        })
    }

    fn clipping_rect(
        &self,
        cache: &mut QueryCache,
        element: ElementId,
        boundary: &Boundary,
        root_boundary: RootBoundary,
        _strategy: Strategy,
    ) -> Result<ClientRect, PlatformError> {
        let root = {
            let registry = self.registry.borrow();
            match root_boundary {
                RootBoundary::Viewport => registry.viewport,
                RootBoundary::Document => registry.document,
                RootBoundary::Rect(rect) => rect,
            }
        };

        let mut clipping = root.client_rect();
        match boundary {
            Boundary::ClippingAncestors => {
                for ancestor in self.clipping_ancestors(cache, element)?.iter() {
                    let rect = self.registry.borrow().get(*ancestor)?.rect;
                    clipping = intersect(clipping, rect.client_rect());
                }
            }
            Boundary::Element(id) => {
                let rect = self.registry.borrow().get(*id)?.rect;
                clipping = intersect(clipping, rect.client_rect());
            }
            Boundary::Rect(rect) => {
                clipping = intersect(clipping, rect.client_rect());
            }
        }

        Ok(clipping)
    }

    fn offset_parent(&self, element: ElementId) -> Result<OffsetParent, PlatformError> {
        let registry = self.registry.borrow();
        Ok(match registry.get(element)?.offset_parent {
            Some(parent) => OffsetParent::Element(parent),
            None => OffsetParent::Window,
        })
    }

    fn dimensions(&self, element: ElementId) -> Result<Dimensions, PlatformError> {
        let registry = self.registry.borrow();
        let rect = registry.get(element)?.rect;
        Ok(Dimensions { width: rect.width, height: rect.height })
    }

    fn convert_offset_parent_rect(
        &self,
        rect: Rect,
        offset_parent: OffsetParent,
        _strategy: Strategy,
    ) -> Result<Rect, PlatformError> {
        match offset_parent {
            OffsetParent::Window => Ok(rect),
            OffsetParent::Element(parent) => {
                let registry = self.registry.borrow();
                let parent = registry.get(parent)?;
                Ok(Rect::new(
                    rect.x + parent.rect.x - parent.scroll.x,
                    rect.y + parent.rect.y - parent.scroll.y,
                    rect.width,
                    rect.height,
                ))
            }
        }
    }

    fn is_rtl(&self, element: ElementId) -> Result<bool, PlatformError> {
        Ok(self.registry.borrow().get(element)?.rtl)
    }

    fn device_pixel_ratio(&self, element: ElementId) -> f64 {
        self.registry
            .borrow()
            .get(element)
            .map(|config| config.device_pixel_ratio)
            .unwrap_or(1.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
