//! Arrow middleware - positions an arrow element to point at the reference.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{Middleware, MiddlewareReturn, MiddlewareState, Reset};
use crate::error::PositionError;
use crate::geometry::clamp;
use crate::platform::{ElementId, OffsetParent};
use crate::types::{Axis, Coords, Dimensions, Padding};

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowOptions {
    /// The arrow element, owned by the same platform as the floating
    /// element.
    pub element: ElementId,
    /// Minimum distance the arrow keeps from the floating element's corners.
    pub padding: Padding,
}

impl ArrowOptions {
    pub fn new(element: ElementId) -> ArrowOptions {
        ArrowOptions { element, padding: Padding::default() }
    }
}

/// Payload stored under `"arrow"`: the arrow offset along the alignment
/// axis, and how far the ideal center was out of reach.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrowData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    pub center_offset: f64,
    /// Set when an aligned placement had to slide the floating element so
    /// the arrow still points at the reference. Later passes of offset and
    /// flip treat the placement as settled when this is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_offset: Option<f64>,
}

struct Arrow {
    options: ArrowOptions,
}

pub fn arrow(options: ArrowOptions) -> Rc<dyn Middleware> {
    Rc::new(Arrow { options })
}

fn axis_length(dimensions: Dimensions, axis: Axis) -> f64 {
    match axis {
        Axis::X => dimensions.width,
        Axis::Y => dimensions.height,
    }
}

impl Middleware for Arrow {
    fn name(&self) -> &'static str {
        "arrow"
    }

    fn compute(&self, state: MiddlewareState<'_>) -> Result<MiddlewareReturn, PositionError> {
        let padding = self.options.padding.expand();
        let coords = Coords::new(state.x, state.y);
        let axis = state.placement.alignment_axis();
        let arrow_length = axis_length(state.platform.dimensions(self.options.element)?, axis);

        let (padding_min, padding_max) = match axis {
            Axis::Y => (padding.top, padding.bottom),
            Axis::X => (padding.left, padding.right),
        };

        let end_diff = state.rects.reference.length(axis) + state.rects.reference.coord(axis)
            - coords.axis(axis)
            - state.rects.floating.length(axis);
        let start_diff = coords.axis(axis) - state.rects.reference.coord(axis);

        // Size of the coordinate space the arrow slides in. An arrow mounted
        // under a sized offset parent uses that; otherwise the floating rect.
        let mut client_size = match state.platform.offset_parent(self.options.element)? {
            OffsetParent::Element(parent) => {
                axis_length(state.platform.dimensions(parent)?, axis)
            }
            OffsetParent::Window => 0.0,
        };
        if client_size == 0.0 {
            client_size = state.rects.floating.length(axis);
        }

        let center_to_reference = end_diff / 2.0 - start_diff / 2.0;

        // Never let padding push the arrow outside the floating element.
        let largest_possible_padding = client_size / 2.0 - arrow_length / 2.0 - 1.0;
        let padding_min = padding_min.min(largest_possible_padding);
        let padding_max = padding_max.min(largest_possible_padding);

        let min = padding_min;
        let max = client_size - arrow_length - padding_max;
        let center = client_size / 2.0 - arrow_length / 2.0 + center_to_reference;
        let offset = clamp(min, center, max);

        // A small reference with an aligned placement can leave the clamped
        // arrow pointing past it entirely. Slide the floating element once
        // (re-deriving rects) so the arrow connects.
        let should_add_offset = state.middleware_data.get("arrow").is_none()
            && state.placement.alignment.is_some()
            && center != offset
            && state.rects.reference.length(axis) / 2.0
                - (if center < min { padding_min } else { padding_max })
                - arrow_length / 2.0
                < 0.0;
        let alignment_offset = if should_add_offset {
            if center < min { center - min } else { center - max }
        } else {
            0.0
        };

        let mut data = ArrowData {
            center_offset: center - offset - alignment_offset,
            ..Default::default()
        };
        match axis {
            Axis::X => data.x = Some(offset),
            Axis::Y => data.y = Some(offset),
        }
        if should_add_offset {
            data.alignment_offset = Some(alignment_offset);
        }

        let mut adjusted = coords;
        *adjusted.axis_mut(axis) += alignment_offset;

        Ok(MiddlewareReturn {
            x: Some(adjusted.x),
            y: Some(adjusted.y),
            data: Some(serde_json::to_value(data)?),
            reset: should_add_offset.then(Reset::rects),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
