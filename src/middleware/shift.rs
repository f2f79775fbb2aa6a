//! Shift middleware - slides the floating element to keep it in view.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{Middleware, MiddlewareReturn, MiddlewareState};
use crate::error::PositionError;
use crate::geometry::clamp;
use crate::overflow::{detect_overflow, DetectOverflowOptions};
use crate::types::{Axis, Coords, Side};

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftOptions {
    /// Shift along the axis the element slides on (perpendicular to the
    /// placement side). Enabled by default.
    pub main_axis: bool,
    /// Also shift along the placement side's own axis, letting the element
    /// overlap the reference to stay visible.
    pub cross_axis: bool,
    pub detect: DetectOverflowOptions,
}

impl Default for ShiftOptions {
    fn default() -> Self {
        ShiftOptions { main_axis: true, cross_axis: false, detect: DetectOverflowOptions::default() }
    }
}

/// Payload stored under `"shift"`: the applied displacement and which axes
/// were eligible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftData {
    pub x: f64,
    pub y: f64,
    pub enabled_x: bool,
    pub enabled_y: bool,
}

struct Shift {
    options: ShiftOptions,
}

pub fn shift(options: ShiftOptions) -> Rc<dyn Middleware> {
    Rc::new(Shift { options })
}

fn clamp_coord(coord: f64, overflow_min: f64, overflow_max: f64) -> f64 {
    let min = coord + overflow_min;
    let max = coord - overflow_max;
    clamp(min, coord, max)
}

impl Middleware for Shift {
    fn name(&self) -> &'static str {
        "shift"
    }

    fn compute(&self, state: MiddlewareState<'_>) -> Result<MiddlewareReturn, PositionError> {
        let overflow = detect_overflow(&state, &self.options.detect)?;

        // The "main" shift axis is perpendicular to the placement side:
        // a top/bottom placement shifts horizontally.
        let cross_axis = state.placement.side_axis();
        let main_axis = cross_axis.opposite();

        let mut coords = Coords::new(state.x, state.y);
        if self.options.main_axis {
            let (min_side, max_side) = match main_axis {
                Axis::Y => (Side::Top, Side::Bottom),
                Axis::X => (Side::Left, Side::Right),
            };
            let coord = coords.axis_mut(main_axis);
            *coord = clamp_coord(*coord, overflow.side(min_side), overflow.side(max_side));
        }
        if self.options.cross_axis {
            let (min_side, max_side) = match cross_axis {
                Axis::Y => (Side::Top, Side::Bottom),
                Axis::X => (Side::Left, Side::Right),
            };
            let coord = coords.axis_mut(cross_axis);
            *coord = clamp_coord(*coord, overflow.side(min_side), overflow.side(max_side));
        }

        let (enabled_x, enabled_y) = match main_axis {
            Axis::X => (self.options.main_axis, self.options.cross_axis),
            Axis::Y => (self.options.cross_axis, self.options.main_axis),
        };
        Ok(MiddlewareReturn {
            x: Some(coords.x),
            y: Some(coords.y),
            data: Some(serde_json::to_value(ShiftData {
                x: coords.x - state.x,
                y: coords.y - state.y,
                enabled_x,
                enabled_y,
            })?),
            reset: None,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{compute_position, ComputePositionConfig};
    use crate::platform::headless::{ElementConfig, HeadlessPlatform};
    use crate::types::{Placement, Rect, Strategy};

    #[test]
    fn test_shift_main_axis_keeps_element_in_view() {
        let platform = HeadlessPlatform::new(800.0, 600.0);
        // Centered floating would start at x = -5.
        let reference = platform.insert(ElementConfig::with_rect(Rect::new(
            10.0, 100.0, 50.0, 20.0,
        )));
        let floating = platform.insert(ElementConfig::with_rect(Rect::new(
            0.0, 0.0, 80.0, 40.0,
        )));

        let position = compute_position(
            &*platform,
            reference,
            floating,
            &ComputePositionConfig {
                placement: Placement::BOTTOM,
                strategy: Strategy::Absolute,
                middleware: vec![shift(ShiftOptions::default())],
            },
        )
        .unwrap();

        assert_eq!(position.x, 0.0);
        assert_eq!(position.y, 120.0);
        let data = position
            .middleware_data
            .deserialize::<ShiftData>("shift")
            .unwrap();
        assert_eq!(data.x, 5.0);
        assert_eq!(data.y, 0.0);
        assert!(data.enabled_x);
        assert!(!data.enabled_y);
    }

    #[test]
    fn test_shift_cross_axis_disabled_by_default() {
        let platform = HeadlessPlatform::new(800.0, 600.0);
        // Reference near the bottom; the floating element hangs 30 below
        // the viewport.
        let reference = platform.insert(ElementConfig::with_rect(Rect::new(
            100.0, 570.0, 50.0, 20.0,
        )));
        let floating = platform.insert(ElementConfig::with_rect(Rect::new(
            0.0, 0.0, 80.0, 40.0,
        )));

        let config = ComputePositionConfig {
            placement: Placement::BOTTOM,
            strategy: Strategy::Absolute,
            middleware: vec![shift(ShiftOptions::default())],
        };
        let position = compute_position(&*platform, reference, floating, &config).unwrap();
        assert_eq!(position.y, 590.0);

        let config = ComputePositionConfig {
            placement: Placement::BOTTOM,
            strategy: Strategy::Absolute,
            middleware: vec![shift(ShiftOptions { cross_axis: true, ..Default::default() })],
        };
        let position = compute_position(&*platform, reference, floating, &config).unwrap();
        assert_eq!(position.y, 560.0);
    }

    #[test]
    fn test_shift_no_overflow_is_identity() {
        let platform = HeadlessPlatform::new(800.0, 600.0);
        let reference = platform.insert(ElementConfig::with_rect(Rect::new(
            300.0, 200.0, 50.0, 20.0,
        )));
        let floating = platform.insert(ElementConfig::with_rect(Rect::new(
            0.0, 0.0, 80.0, 40.0,
        )));

        let position = compute_position(
            &*platform,
            reference,
            floating,
            &ComputePositionConfig {
                placement: Placement::BOTTOM,
                strategy: Strategy::Absolute,
                middleware: vec![shift(ShiftOptions::default())],
            },
        )
        .unwrap();

        assert_eq!(position.x, 285.0);
        assert_eq!(position.y, 220.0);
        let data = position
            .middleware_data
            .deserialize::<ShiftData>("shift")
            .unwrap();
        assert_eq!(data.x, 0.0);
        assert_eq!(data.y, 0.0);
    }
}
