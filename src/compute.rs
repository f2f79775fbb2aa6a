//! Computation core - one placement computation from start to finish.
//!
//! [`compute_position`] derives the anchor coordinates for the configured
//! placement, then runs the middleware pipeline strictly in list order.
//! A middleware may request a reset, which restarts the pipeline from the
//! first step under a new placement (optionally with re-derived rects).
//! Resets are bounded; exceeding the bound is an error, never a silently
//! truncated run.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::PositionError;
use crate::geometry::compute_coords_from_placement;
use crate::middleware::{Elements, Middleware, MiddlewareData, MiddlewareState};
use crate::platform::{ElementId, Platform, QueryCache};
use crate::types::{Placement, Strategy};

/// Upper bound on pipeline resets within one computation. A well-behaved
/// middleware set converges in a handful; hitting the bound means a cycle.
pub const RESET_LIMIT: u32 = 50;

/// Configuration for one computation.
#[derive(Default)]
pub struct ComputePositionConfig {
    /// Desired placement. Middleware may change the final one.
    pub placement: Placement,
    pub strategy: Strategy,
    /// Pipeline steps, run in order.
    pub middleware: Vec<Rc<dyn Middleware>>,
}

/// The result of one computation.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedPosition {
    /// Coordinates of the floating element relative to its offset parent.
    pub x: f64,
    pub y: f64,
    /// The placement actually in effect after middleware ran.
    pub placement: Placement,
    /// Echo of the configured strategy, for the style generator.
    pub strategy: Strategy,
    pub middleware_data: MiddlewareData,
}

/// Compute where the floating element should be placed right now.
///
/// Pure with respect to the platform: all layout questions go through
/// `platform`, scratch queries are memoized in a cache scoped to this one
/// call, and nothing is retained afterwards.
pub fn compute_position(
    platform: &dyn Platform,
    reference: ElementId,
    floating: ElementId,
    config: &ComputePositionConfig,
) -> Result<ComputedPosition, PositionError> {
    let cache = RefCell::new(QueryCache::default());
    let elements = Elements { reference, floating };

    let rtl = platform.is_rtl(floating)?;
    let mut rects =
        platform.element_rects(&mut cache.borrow_mut(), reference, floating, config.strategy)?;
    let mut placement = config.placement;
    let mut coords = compute_coords_from_placement(&rects, placement, rtl);
    let mut middleware_data = MiddlewareData::default();

    let mut reset_count = 0u32;
    let mut index = 0;
    while let Some(middleware) = config.middleware.get(index) {
        let result = middleware.compute(MiddlewareState {
            x: coords.x,
            y: coords.y,
            initial_placement: config.placement,
            placement,
            strategy: config.strategy,
            rects,
            elements,
            middleware_data: &middleware_data,
            platform,
            cache: &cache,
        })?;

        coords.x = result.x.unwrap_or(coords.x);
        coords.y = result.y.unwrap_or(coords.y);
        if let Some(data) = result.data {
            middleware_data.merge(middleware.name(), data);
        }

        if let Some(reset) = result.reset {
            reset_count += 1;
            if reset_count > RESET_LIMIT {
                return Err(PositionError::ResetLimit(RESET_LIMIT));
            }
            tracing::trace!(
                middleware = middleware.name(),
                reset_count,
                placement = ?reset.placement,
                rects = reset.rects,
                "pipeline reset"
            );

            if let Some(next) = reset.placement {
                placement = next;
            }
            if reset.rects {
                rects = platform.element_rects(
                    &mut cache.borrow_mut(),
                    reference,
                    floating,
                    config.strategy,
                )?;
            }
            coords = compute_coords_from_placement(&rects, placement, rtl);
            index = 0;
            continue;
        }

        index += 1;
    }

    Ok(ComputedPosition {
        x: coords.x,
        y: coords.y,
        placement,
        strategy: config.strategy,
        middleware_data,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::middleware::{MiddlewareReturn, Reset};
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
    fn test_default_placement_coords() {
        let (platform, reference, floating) = setup();
        let position = compute_position(
            &*platform,
            reference,
            floating,
            &ComputePositionConfig::default(),
        )
        .unwrap();

        assert_eq!(position.x, 85.0);
        assert_eq!(position.y, 120.0);
        assert_eq!(position.placement, Placement::BOTTOM);
        assert_eq!(position.strategy, Strategy::Absolute);
        assert!(position.middleware_data.is_empty());
    }

    struct Nudge {
        dx: f64,
    }

    impl Middleware for Nudge {
        fn name(&self) -> &'static str {
            "nudge"
        }

        fn compute(
            &self,
            state: MiddlewareState<'_>,
        ) -> Result<MiddlewareReturn, PositionError> {
            Ok(MiddlewareReturn {
                x: Some(state.x + self.dx),
                data: Some(json!({ "applied": self.dx })),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_middleware_run_in_order_and_accumulate() {
        let (platform, reference, floating) = setup();
        let config = ComputePositionConfig {
            middleware: vec![Rc::new(Nudge { dx: 3.0 }), Rc::new(Nudge { dx: 4.0 })],
            ..Default::default()
        };
        let position = compute_position(&*platform, reference, floating, &config).unwrap();

        assert_eq!(position.x, 92.0);
        // Same name: the later write merges over the earlier one.
        assert_eq!(
            position.middleware_data.get("nudge"),
            Some(&json!({ "applied": 4.0 }))
        );
    }

    struct FlipOnce {
        target: Placement,
    }

    impl Middleware for FlipOnce {
        fn name(&self) -> &'static str {
            "flip_once"
        }

        fn compute(
            &self,
            state: MiddlewareState<'_>,
        ) -> Result<MiddlewareReturn, PositionError> {
            if state.placement == state.initial_placement {
                Ok(MiddlewareReturn {
                    reset: Some(Reset::placement(self.target)),
                    ..Default::default()
                })
            } else {
                Ok(MiddlewareReturn::default())
            }
        }
    }

    #[test]
    fn test_reset_restarts_from_first_middleware() {
        let (platform, reference, floating) = setup();
        let runs = Rc::new(Cell::new(0u32));

        struct CountRuns(Rc<Cell<u32>>);
        impl Middleware for CountRuns {
            fn name(&self) -> &'static str {
                "count"
            }
            fn compute(
                &self,
                _state: MiddlewareState<'_>,
            ) -> Result<MiddlewareReturn, PositionError> {
                self.0.set(self.0.get() + 1);
                Ok(MiddlewareReturn::default())
            }
        }

        let config = ComputePositionConfig {
            middleware: vec![
                Rc::new(CountRuns(runs.clone())),
                Rc::new(FlipOnce { target: Placement::TOP }),
            ],
            ..Default::default()
        };
        let position = compute_position(&*platform, reference, floating, &config).unwrap();

        assert_eq!(position.placement, Placement::TOP);
        assert_eq!(position.y, 60.0);
        // Once before the reset, once after the restart.
        assert_eq!(runs.get(), 2);
    }

    struct AlwaysReset;

    impl Middleware for AlwaysReset {
        fn name(&self) -> &'static str {
            "always_reset"
        }

        fn compute(
            &self,
            _state: MiddlewareState<'_>,
        ) -> Result<MiddlewareReturn, PositionError> {
            Ok(MiddlewareReturn {
                reset: Some(Reset::rects()),
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_reset_limit_is_an_error() {
        let (platform, reference, floating) = setup();
        let config = ComputePositionConfig {
            middleware: vec![Rc::new(AlwaysReset)],
            ..Default::default()
        };
        let result = compute_position(&*platform, reference, floating, &config);
        assert!(matches!(result, Err(PositionError::ResetLimit(RESET_LIMIT))));
    }

    #[test]
    fn test_unmounted_reference_is_an_error() {
        let (platform, reference, floating) = setup();
        platform.remove(reference);
        let result = compute_position(
            &*platform,
            reference,
            floating,
            &ComputePositionConfig::default(),
        );
        assert!(matches!(result, Err(PositionError::Platform(_))));
    }
}
