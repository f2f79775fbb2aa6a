//! Offset middleware - displaces the floating element from its placement.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{Derivable, Middleware, MiddlewareReturn, MiddlewareState};
use crate::error::PositionError;
use crate::middleware::arrow::ArrowData;
use crate::types::{Alignment, Axis, Coords, Placement};

/// Displacement along the placement's axes.
///
/// `main_axis` pushes away from the reference, `cross_axis` slides along
/// the side, and `alignment_axis` replaces `cross_axis` for aligned
/// placements (its sign follows the alignment, so `start` and `end` mirror).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OffsetValue {
    pub main_axis: f64,
    pub cross_axis: f64,
    pub alignment_axis: Option<f64>,
}

impl OffsetValue {
    pub const fn main(value: f64) -> OffsetValue {
        OffsetValue { main_axis: value, cross_axis: 0.0, alignment_axis: None }
    }
}

impl From<f64> for OffsetValue {
    fn from(value: f64) -> Self {
        OffsetValue::main(value)
    }
}

impl From<f64> for Derivable<OffsetValue> {
    fn from(value: f64) -> Self {
        Derivable::Static(OffsetValue::main(value))
    }
}

/// Payload stored under `"offset"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetData {
    pub x: f64,
    pub y: f64,
    pub placement: Placement,
}

struct Offset {
    value: Derivable<OffsetValue>,
}

/// Create the offset middleware. Accepts a number (main axis only), an
/// [`OffsetValue`], or a derivable of either.
pub fn offset(value: impl Into<Derivable<OffsetValue>>) -> Rc<dyn Middleware> {
    Rc::new(Offset { value: value.into() })
}

fn convert_value_to_coords(
    state: &MiddlewareState<'_>,
    value: &Derivable<OffsetValue>,
) -> Result<Coords, PositionError> {
    let rtl = state.platform.is_rtl(state.elements.floating)?;
    let side = state.placement.side;
    let alignment = state.placement.alignment;
    let is_vertical = state.placement.side_axis() == Axis::Y;

    let main_axis_sign = if side.is_origin_side() { -1.0 } else { 1.0 };
    let cross_axis_sign = if rtl && is_vertical { -1.0 } else { 1.0 };

    let value = value.evaluate(state);
    let main_axis = value.main_axis;
    let mut cross_axis = value.cross_axis;
    if let (Some(alignment), Some(alignment_axis)) = (alignment, value.alignment_axis) {
        cross_axis = match alignment {
            Alignment::End => -alignment_axis,
            Alignment::Start => alignment_axis,
        };
    }

    Ok(if is_vertical {
        Coords::new(cross_axis * cross_axis_sign, main_axis * main_axis_sign)
    } else {
        Coords::new(main_axis * main_axis_sign, cross_axis * cross_axis_sign)
    })
}

impl Middleware for Offset {
    fn name(&self) -> &'static str {
        "offset"
    }

    fn compute(&self, state: MiddlewareState<'_>) -> Result<MiddlewareReturn, PositionError> {
        let diff = convert_value_to_coords(&state, &self.value)?;

        // If the placement is unchanged since the last pass and the arrow
        // middleware already compensated the alignment, re-applying the
        // offset would double it.
        let previous = state.middleware_data.deserialize::<OffsetData>("offset");
        let arrow_compensated = state
            .middleware_data
            .deserialize::<ArrowData>("arrow")
            .and_then(|arrow| arrow.alignment_offset)
            .is_some();
        if arrow_compensated
            && previous.is_some_and(|data| data.placement == state.placement)
        {
            return Ok(MiddlewareReturn::default());
        }

        Ok(MiddlewareReturn {
            x: Some(state.x + diff.x),
            y: Some(state.y + diff.y),
            data: Some(serde_json::to_value(OffsetData {
                x: diff.x,
                y: diff.y,
                placement: state.placement,
            })?),
            reset: None,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
