//! Synchronization engine - keeps reactive position state in sync.
//!
//! [`create_floating`] binds a reference/floating element pair to a set of
//! position signals. Every update runs [`compute_position`] and commits the
//! result; consumers read the signals (or [`FloatingHandle::floating_styles`])
//! from their own reactive scopes and re-render when they change.
//!
//! Updates are explicit: setters that change what is being positioned
//! trigger one, and an optional [`MountObserver`] (such as
//! [`HeadlessPlatform::while_mounted`](crate::platform::headless::HeadlessPlatform::while_mounted))
//! re-triggers them while both elements stay mounted. A failed update keeps
//! the previously committed state.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::compute::{compute_position, ComputePositionConfig};
use crate::middleware::{Middleware, MiddlewareData};
use crate::platform::{ElementId, Platform};
use crate::types::{Placement, Strategy};

// =============================================================================
// Observer contract
// =============================================================================

/// Tears down one observer subscription.
pub type Cleanup = Box<dyn FnOnce()>;

/// Re-runs the position update for the handle that created it. Holds only a
/// weak reference: calling it after the handle is gone is a no-op.
pub type UpdateFn = Rc<dyn Fn()>;

/// Subscribes to geometry changes for a mounted element pair and calls the
/// update function whenever the position may be stale. Invoked each time
/// both elements are set; the returned cleanup runs before re-subscribing
/// and on teardown.
pub type MountObserver = Rc<dyn Fn(ElementId, ElementId, UpdateFn) -> Cleanup>;

// =============================================================================
// Options
// =============================================================================

/// Configuration for [`create_floating`].
pub struct FloatingOptions {
    pub placement: Placement,
    pub strategy: Strategy,
    pub middleware: Vec<Rc<dyn Middleware>>,
    /// Whether [`FloatingHandle::floating_styles`] positions with a CSS
    /// transform instead of left/top. Defaults to true.
    pub transform: bool,
    /// Whether the floating element is conceptually visible. Positions are
    /// still computed and committed while closed, but `is_positioned` stays
    /// false.
    pub open: bool,
    pub while_mounted: Option<MountObserver>,
}

impl Default for FloatingOptions {
    fn default() -> Self {
        FloatingOptions {
            placement: Placement::default(),
            strategy: Strategy::default(),
            middleware: Vec::new(),
            transform: true,
            open: true,
            while_mounted: None,
        }
    }
}

// =============================================================================
// State
// =============================================================================

#[derive(Clone)]
struct StateSignals {
    x: Signal<f64>,
    y: Signal<f64>,
    placement: Signal<Placement>,
    strategy: Signal<Strategy>,
    middleware_data: Signal<MiddlewareData>,
    is_positioned: Signal<bool>,
}

struct Inner {
    platform: Rc<dyn Platform>,
    reference: Option<ElementId>,
    floating: Option<ElementId>,
    placement: Placement,
    strategy: Strategy,
    middleware: Vec<Rc<dyn Middleware>>,
    transform: bool,
    open: bool,
    while_mounted: Option<MountObserver>,
    cleanup: Option<Cleanup>,
    signals: StateSignals,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// Owning handle to one synchronized floating position.
///
/// Dropping the handle stops any active observer subscription.
pub struct FloatingHandle {
    inner: Rc<RefCell<Inner>>,
}

/// Bind a reference/floating pair to reactive position state.
///
/// Either element may start unset; updates are skipped until both resolve.
pub fn create_floating(
    platform: Rc<dyn Platform>,
    reference: Option<ElementId>,
    floating: Option<ElementId>,
    options: FloatingOptions,
) -> FloatingHandle {
    let signals = StateSignals {
        x: signal(0.0),
        y: signal(0.0),
        placement: signal(options.placement),
        strategy: signal(options.strategy),
        middleware_data: signal(MiddlewareData::default()),
        is_positioned: signal(false),
    };

    let inner = Rc::new(RefCell::new(Inner {
        platform,
        reference,
        floating,
        placement: options.placement,
        strategy: options.strategy,
        middleware: options.middleware,
        transform: options.transform,
        open: options.open,
        while_mounted: options.while_mounted,
        cleanup: None,
        signals,
    }));
    attach(&inner);

    FloatingHandle { inner }
}

// =============================================================================
// Update machinery
// =============================================================================

fn update_fn(inner: &Rc<RefCell<Inner>>) -> UpdateFn {
    let weak: Weak<RefCell<Inner>> = Rc::downgrade(inner);
    Rc::new(move || {
        if let Some(inner) = weak.upgrade() {
            update(&inner);
        }
    })
}

fn update(inner: &Rc<RefCell<Inner>>) {
    let (platform, reference, floating, config) = {
        let inner = inner.borrow();
        let (Some(reference), Some(floating)) = (inner.reference, inner.floating) else {
            return;
        };
        (
            inner.platform.clone(),
            reference,
            floating,
            ComputePositionConfig {
                placement: inner.placement,
                strategy: inner.strategy,
                middleware: inner.middleware.clone(),
            },
        )
    };

    match compute_position(&*platform, reference, floating, &config) {
        Ok(position) => {
            // `open` is read at commit time, not capture time.
            let (open, signals) = {
                let inner = inner.borrow();
                (inner.open, inner.signals.clone())
            };
            tracing::debug!(
                x = position.x,
                y = position.y,
                placement = %position.placement,
                "position committed"
            );
            signals.x.set(position.x);
            signals.y.set(position.y);
            signals.placement.set(position.placement);
            signals.strategy.set(position.strategy);
            signals.middleware_data.set(position.middleware_data);
            signals.is_positioned.set(open);
        }
        Err(error) => {
            // Previously committed state stays in place.
            tracing::warn!(%error, "position update failed");
        }
    }
}

fn run_cleanup(inner: &Rc<RefCell<Inner>>) {
    let cleanup = inner.borrow_mut().cleanup.take();
    if let Some(cleanup) = cleanup {
        cleanup();
    }
}

/// Re-establish observation for the current element pair, replacing any
/// prior subscription. Without an observer this degrades to a single update.
fn attach(inner: &Rc<RefCell<Inner>>) {
    run_cleanup(inner);

    let (elements, observer) = {
        let inner = inner.borrow();
        (
            inner.reference.zip(inner.floating),
            inner.while_mounted.clone(),
        )
    };

    match (elements, observer) {
        (Some((reference, floating)), Some(observer)) => {
            let cleanup = observer(reference, floating, update_fn(inner));
            inner.borrow_mut().cleanup = Some(cleanup);
        }
        _ => update(inner),
    }
}

// =============================================================================
// Handle
// =============================================================================

impl FloatingHandle {
    pub fn x(&self) -> Signal<f64> {
        self.inner.borrow().signals.x.clone()
    }

    pub fn y(&self) -> Signal<f64> {
        self.inner.borrow().signals.y.clone()
    }

    /// The placement in effect after the last committed update. May differ
    /// from the configured one when middleware changed it.
    pub fn placement(&self) -> Signal<Placement> {
        self.inner.borrow().signals.placement.clone()
    }

    pub fn strategy(&self) -> Signal<Strategy> {
        self.inner.borrow().signals.strategy.clone()
    }

    pub fn middleware_data(&self) -> Signal<MiddlewareData> {
        self.inner.borrow().signals.middleware_data.clone()
    }

    /// False until the first committed update while open; reset to false
    /// whenever `open` is cleared.
    pub fn is_positioned(&self) -> Signal<bool> {
        self.inner.borrow().signals.is_positioned.clone()
    }

    /// Recompute and commit the position now.
    pub fn update(&self) {
        update(&self.inner);
    }

    pub fn set_reference(&self, reference: Option<ElementId>) {
        if self.inner.borrow().reference == reference {
            return;
        }
        self.inner.borrow_mut().reference = reference;
        attach(&self.inner);
    }

    pub fn set_floating(&self, floating: Option<ElementId>) {
        if self.inner.borrow().floating == floating {
            return;
        }
        self.inner.borrow_mut().floating = floating;
        attach(&self.inner);
    }

    pub fn set_elements(&self, reference: Option<ElementId>, floating: Option<ElementId>) {
        {
            let inner = self.inner.borrow();
            if inner.reference == reference && inner.floating == floating {
                return;
            }
        }
        {
            let mut inner = self.inner.borrow_mut();
            inner.reference = reference;
            inner.floating = floating;
        }
        attach(&self.inner);
    }

    pub fn set_placement(&self, placement: Placement) {
        self.inner.borrow_mut().placement = placement;
        update(&self.inner);
    }

    pub fn set_strategy(&self, strategy: Strategy) {
        self.inner.borrow_mut().strategy = strategy;
        update(&self.inner);
    }

    pub fn set_middleware(&self, middleware: Vec<Rc<dyn Middleware>>) {
        self.inner.borrow_mut().middleware = middleware;
        update(&self.inner);
    }

    /// Affects only how [`Self::floating_styles`] expresses coordinates.
    pub fn set_transform(&self, transform: bool) {
        self.inner.borrow_mut().transform = transform;
    }

    pub fn set_open(&self, open: bool) {
        self.inner.borrow_mut().open = open;
        update(&self.inner);
        if !open {
            let is_positioned = self.inner.borrow().signals.is_positioned.clone();
            is_positioned.set(false);
        }
    }

    /// Positioning styles for the floating element, rounded to the device
    /// pixel grid. Reading this inside a reactive scope subscribes it to the
    /// coordinate and strategy signals.
    pub fn floating_styles(&self) -> FloatingStyles {
        let (signals, floating, transform, platform) = {
            let inner = self.inner.borrow();
            (
                inner.signals.clone(),
                inner.floating,
                inner.transform,
                inner.platform.clone(),
            )
        };

        let initial = FloatingStyles {
            position: signals.strategy.get(),
            left: "0".to_string(),
            top: "0".to_string(),
            transform: None,
            will_change: None,
        };
        let Some(floating) = floating else {
            return initial;
        };

        let dpr = platform.device_pixel_ratio(floating);
        let x = round_by_dpr(signals.x.get(), dpr);
        let y = round_by_dpr(signals.y.get(), dpr);

        if transform {
            FloatingStyles {
                transform: Some(format!("translate({x}px, {y}px)")),
                // Sub-pixel rounding only pays off when there are sub-pixels.
                will_change: (dpr >= 1.5).then(|| "transform".to_string()),
                ..initial
            }
        } else {
            FloatingStyles {
                left: format!("{x}px"),
                top: format!("{y}px"),
                ..initial
            }
        }
    }

    /// Stop observing without dropping the handle. Signals keep their last
    /// committed values; setters re-attach.
    pub fn detach(&self) {
        run_cleanup(&self.inner);
    }
}

// =============================================================================
// Styles
// =============================================================================

/// CSS positioning properties derived from the committed coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingStyles {
    pub position: Strategy,
    pub left: String,
    pub top: String,
    pub transform: Option<String>,
    pub will_change: Option<String>,
}

impl fmt::Display for FloatingStyles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "position: {}; left: {}; top: {};",
            self.position, self.left, self.top
        )?;
        if let Some(transform) = &self.transform {
            write!(f, " transform: {transform};")?;
        }
        if let Some(will_change) = &self.will_change {
            write!(f, " will-change: {will_change};")?;
        }
        Ok(())
    }
}

/// Round a coordinate to the device pixel grid so the element lands on a
/// physical pixel, whichever side of 1.0 the ratio falls on.
pub fn round_by_dpr(value: f64, dpr: f64) -> f64 {
    let dpr = if dpr > 0.0 { dpr } else { 1.0 };
    (value * dpr).round() / dpr
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use spark_signals::flush_sync;

    use super::*;
    use crate::platform::headless::{ElementConfig, HeadlessPlatform};
    use crate::types::Rect;

    fn setup() -> (Rc<HeadlessPlatform>, ElementId, ElementId) {
        let platform = HeadlessPlatform::new(800.0, 600.0);
        let reference = platform.insert(ElementConfig::with_rect(Rect::new(
            100.0, 100.0, 50.0, 20.0,
        )));
        let floating = platform.insert(ElementConfig::with_rect(Rect::new(
            0.0, 0.0, 80.0, 40.0,
        )));
        (platform, reference, floating)
    }

    #[test]
    fn test_initial_update_commits_position() {
        let (platform, reference, floating) = setup();
        let handle = create_floating(
            platform.clone(),
            Some(reference),
            Some(floating),
            FloatingOptions::default(),
        );

        assert_eq!(handle.x().get(), 85.0);
        assert_eq!(handle.y().get(), 120.0);
        assert_eq!(handle.placement().get(), Placement::BOTTOM);
        assert!(handle.is_positioned().get());
    }

    #[test]
    fn test_closed_commits_coords_but_not_positioned() {
        let (platform, reference, floating) = setup();
        let handle = create_floating(
            platform.clone(),
            Some(reference),
            Some(floating),
            FloatingOptions { open: false, ..Default::default() },
        );

        assert_eq!(handle.x().get(), 85.0);
        assert!(!handle.is_positioned().get());

        handle.set_open(true);
        assert!(handle.is_positioned().get());
        handle.set_open(false);
        assert!(!handle.is_positioned().get());
    }

    #[test]
    fn test_updates_skipped_until_both_elements_set() {
        let (platform, reference, floating) = setup();
        let handle = create_floating(
            platform.clone(),
            Some(reference),
            None,
            FloatingOptions::default(),
        );

        assert_eq!(handle.x().get(), 0.0);
        assert!(!handle.is_positioned().get());

        handle.set_floating(Some(floating));
        assert_eq!(handle.x().get(), 85.0);
        assert!(handle.is_positioned().get());
    }

    #[test]
    fn test_setters_retrigger_updates() {
        let (platform, reference, floating) = setup();
        let handle = create_floating(
            platform.clone(),
            Some(reference),
            Some(floating),
            FloatingOptions::default(),
        );

        handle.set_placement(Placement::TOP_START);
        assert_eq!(handle.placement().get(), Placement::TOP_START);
        assert_eq!(handle.y().get(), 60.0);

        handle.set_strategy(Strategy::Fixed);
        assert_eq!(handle.strategy().get(), Strategy::Fixed);
    }

    #[test]
    fn test_failed_update_preserves_state() {
        let (platform, reference, floating) = setup();
        let handle = create_floating(
            platform.clone(),
            Some(reference),
            Some(floating),
            FloatingOptions::default(),
        );
        assert_eq!(handle.x().get(), 85.0);

        platform.remove(reference);
        handle.update();

        // Last committed position survives the failed query.
        assert_eq!(handle.x().get(), 85.0);
        assert!(handle.is_positioned().get());
    }

    #[test]
    fn test_while_mounted_tracks_geometry() {
        let (platform, reference, floating) = setup();
        let handle = create_floating(
            platform.clone(),
            Some(reference),
            Some(floating),
            FloatingOptions {
                while_mounted: Some(platform.while_mounted()),
                ..Default::default()
            },
        );
        assert_eq!(handle.x().get(), 85.0);

        platform
            .set_rect(reference, Rect::new(200.0, 100.0, 50.0, 20.0))
            .unwrap();
        flush_sync();
        assert_eq!(handle.x().get(), 185.0);
    }

    #[test]
    fn test_observer_cleanup_runs_once_per_detach() {
        let (platform, reference, floating) = setup();
        let cleanups = Rc::new(Cell::new(0u32));
        let observer: MountObserver = {
            let cleanups = cleanups.clone();
            Rc::new(move |_, _, update: UpdateFn| -> Cleanup {
                update();
                let cleanups = cleanups.clone();
                Box::new(move || cleanups.set(cleanups.get() + 1))
            })
        };

        let handle = create_floating(
            platform.clone(),
            Some(reference),
            Some(floating),
            FloatingOptions { while_mounted: Some(observer), ..Default::default() },
        );
        assert_eq!(cleanups.get(), 0);

        // Clearing an element tears the subscription down without
        // establishing a new one.
        handle.set_floating(None);
        assert_eq!(cleanups.get(), 1);

        // Restoring it re-subscribes; dropping the handle cleans that up.
        handle.set_floating(Some(floating));
        drop(handle);
        assert_eq!(cleanups.get(), 2);
    }

    #[test]
    fn test_round_by_dpr() {
        assert_eq!(round_by_dpr(10.3, 1.0), 10.0);
        assert_eq!(round_by_dpr(10.3, 2.0), 10.5);
        // A ratio below 1 coarsens the grid: physical pixels are 2 CSS
        // pixels wide at 0.5, so 10.7 snaps down to 10, not up to 11.
        assert_eq!(round_by_dpr(10.3, 0.5), 10.0);
        assert_eq!(round_by_dpr(10.7, 0.5), 10.0);
        assert_eq!(round_by_dpr(11.2, 0.5), 12.0);
        // A degenerate ratio falls back to whole CSS pixels.
        assert_eq!(round_by_dpr(10.7, 0.0), 11.0);
    }

    #[test]
    fn test_floating_styles() {
        let (platform, reference, floating) = setup();
        let handle = create_floating(
            platform.clone(),
            Some(reference),
            Some(floating),
            FloatingOptions::default(),
        );

        let styles = handle.floating_styles();
        assert_eq!(styles.left, "0");
        assert_eq!(styles.top, "0");
        assert_eq!(styles.transform.as_deref(), Some("translate(85px, 120px)"));
        assert_eq!(styles.will_change, None);
        assert_eq!(
            styles.to_string(),
            "position: absolute; left: 0; top: 0; transform: translate(85px, 120px);"
        );

        handle.set_transform(false);
        let styles = handle.floating_styles();
        assert_eq!(styles.left, "85px");
        assert_eq!(styles.top, "120px");
        assert_eq!(styles.transform, None);
    }

    #[test]
    fn test_floating_styles_high_dpr() {
        let platform = HeadlessPlatform::new(800.0, 600.0);
        let reference = platform.insert(ElementConfig::with_rect(Rect::new(
            100.0, 100.0, 50.0, 21.0,
        )));
        let floating = platform.insert(ElementConfig {
            rect: Rect::new(0.0, 0.0, 80.0, 40.0),
            device_pixel_ratio: 2.0,
            ..Default::default()
        });

        let handle = create_floating(
            platform.clone(),
            Some(reference),
            Some(floating),
            FloatingOptions::default(),
        );

        let styles = handle.floating_styles();
        assert_eq!(styles.transform.as_deref(), Some("translate(85px, 121px)"));
        assert_eq!(styles.will_change.as_deref(), Some("transform"));
    }
}
