//! Flip middleware - changes placement to the side with the most room.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{Middleware, MiddlewareReturn, MiddlewareState, Reset};
use crate::error::PositionError;
use crate::geometry::{alignment_sides, expanded_placements, opposite_axis_placements};
use crate::middleware::arrow::ArrowData;
use crate::overflow::{detect_overflow, DetectOverflowOptions};
use crate::types::{Alignment, Axis, Placement};

/// What to do when no candidate placement fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackStrategy {
    /// Keep the candidate whose total positive overflow is smallest.
    #[default]
    BestFit,
    /// Give up and restore the initial placement.
    InitialPlacement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlipOptions {
    /// Consider overflow on the placement side itself. Enabled by default.
    pub main_axis: bool,
    /// Also consider overflow on the alignment sides. Enabled by default.
    pub cross_axis: bool,
    /// Candidate placements to try, in order. When unset the candidates are
    /// derived from the initial placement (opposite side, then opposite
    /// alignments when `flip_alignment` is set).
    pub fallback_placements: Option<Vec<Placement>>,
    pub fallback_strategy: FallbackStrategy,
    /// When set, also try the perpendicular axis, preferring this alignment
    /// direction first.
    pub fallback_axis_side_direction: Option<Alignment>,
    /// Whether derived candidates include alignment flips of the initial
    /// placement.
    pub flip_alignment: bool,
    pub detect: DetectOverflowOptions,
}

impl Default for FlipOptions {
    fn default() -> Self {
        FlipOptions {
            main_axis: true,
            cross_axis: true,
            fallback_placements: None,
            fallback_strategy: FallbackStrategy::default(),
            fallback_axis_side_direction: None,
            flip_alignment: true,
            detect: DetectOverflowOptions::default(),
        }
    }
}

/// One evaluated candidate: the per-side overflows observed while it was the
/// active placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementOverflow {
    pub placement: Placement,
    pub overflows: Vec<f64>,
}

/// Payload stored under `"flip"`. Accumulates across resets within one
/// computation, so the final pass can pick the best candidate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlipData {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub overflows: Vec<PlacementOverflow>,
}

struct Flip {
    options: FlipOptions,
}

pub fn flip(options: FlipOptions) -> Rc<dyn Middleware> {
    Rc::new(Flip { options })
}

impl Middleware for Flip {
    fn name(&self) -> &'static str {
        "flip"
    }

    fn compute(&self, state: MiddlewareState<'_>) -> Result<MiddlewareReturn, PositionError> {
        // An arrow alignment-offset reset means the current placement was
        // already settled by an earlier flip pass.
        if state
            .middleware_data
            .deserialize::<ArrowData>("arrow")
            .and_then(|arrow| arrow.alignment_offset)
            .is_some()
        {
            return Ok(MiddlewareReturn::default());
        }

        let side = state.placement.side;
        let initial_side_axis = state.initial_placement.side_axis();
        let is_base_placement = state.initial_placement.alignment.is_none();
        let rtl = state.platform.is_rtl(state.elements.floating)?;

        let mut fallback_placements = match &self.options.fallback_placements {
            Some(placements) => placements.clone(),
            None => {
                if is_base_placement || !self.options.flip_alignment {
                    vec![state.initial_placement.opposite()]
                } else {
                    expanded_placements(state.initial_placement).to_vec()
                }
            }
        };
        if self.options.fallback_placements.is_none() {
            if let Some(direction) = self.options.fallback_axis_side_direction {
                fallback_placements.extend(opposite_axis_placements(
                    state.initial_placement,
                    self.options.flip_alignment,
                    direction,
                    rtl,
                ));
            }
        }
        let mut placements = vec![state.initial_placement];
        placements.extend(fallback_placements);

        let overflow = detect_overflow(&state, &self.options.detect)?;

        let mut overflows = Vec::new();
        if self.options.main_axis {
            overflows.push(overflow.side(side));
        }
        if self.options.cross_axis {
            let (main_side, cross_side) = alignment_sides(state.placement, &state.rects, rtl);
            overflows.push(overflow.side(main_side));
            overflows.push(overflow.side(cross_side));
        }

        let previous = state
            .middleware_data
            .deserialize::<FlipData>("flip")
            .unwrap_or_default();
        let mut overflows_data = previous.overflows;
        overflows_data.push(PlacementOverflow {
            placement: state.placement,
            overflows: overflows.clone(),
        });

        if overflows.iter().all(|value| *value <= 0.0) {
            return Ok(MiddlewareReturn::default());
        }

        // Try the next candidate in list order first.
        let next_index = previous.index + 1;
        if let Some(&next_placement) = placements.get(next_index) {
            return Ok(MiddlewareReturn {
                data: Some(serde_json::to_value(FlipData {
                    index: next_index,
                    overflows: overflows_data,
                })?),
                reset: Some(Reset::placement(next_placement)),
                ..Default::default()
            });
        }

        // All candidates overflowed. Prefer any that at least fit on the
        // main axis, ordered by least cross-axis overflow.
        let mut reset_placement = overflows_data
            .iter()
            .filter(|entry| entry.overflows.first().is_some_and(|main| *main <= 0.0))
            .min_by(|a, b| {
                let a_cross = a.overflows.get(1).copied().unwrap_or(0.0);
                let b_cross = b.overflows.get(1).copied().unwrap_or(0.0);
                a_cross.total_cmp(&b_cross)
            })
            .map(|entry| entry.placement);

        if reset_placement.is_none() {
            reset_placement = match self.options.fallback_strategy {
                FallbackStrategy::BestFit => overflows_data
                    .iter()
                    .filter(|entry| {
                        // With axis fallbacks, vertical candidates stay
                        // eligible alongside the initial axis.
                        if self.options.fallback_axis_side_direction.is_some() {
                            let axis = entry.placement.side_axis();
                            axis == initial_side_axis || axis == Axis::Y
                        } else {
                            true
                        }
                    })
                    .min_by(|a, b| {
                        let sum = |entry: &PlacementOverflow| {
                            entry
                                .overflows
                                .iter()
                                .filter(|value| **value > 0.0)
                                .sum::<f64>()
                        };
                        sum(a).total_cmp(&sum(b))
                    })
                    .map(|entry| entry.placement),
                FallbackStrategy::InitialPlacement => Some(state.initial_placement),
            };
        }

        match reset_placement {
            Some(placement) if placement != state.placement => Ok(MiddlewareReturn {
                reset: Some(Reset::placement(placement)),
                ..Default::default()
            }),
            _ => Ok(MiddlewareReturn::default()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
