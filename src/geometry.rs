//! Geometry algebra - pure placement and axis arithmetic.
//!
//! Everything in this module is a total function over the types in
//! [`crate::types`]: no state, no platform queries. The computation core and
//! the collision middleware are built entirely from these primitives.

use crate::types::{Alignment, Axis, Coords, ElementRects, Placement, Side};

// =============================================================================
// Scalar helpers
// =============================================================================

/// Three-argument clamp: `start <= result <= end`.
pub fn clamp(start: f64, value: f64, end: f64) -> f64 {
    start.max(value.min(end))
}

// =============================================================================
// Placement derivations
// =============================================================================

/// The two sides relevant to a placement's alignment, main side first.
///
/// When the reference is larger than the floating element along the
/// alignment axis the main side is flipped, so a larger reference does not
/// visually hide the intended alignment edge.
pub fn alignment_sides(placement: Placement, rects: &ElementRects, rtl: bool) -> (Side, Side) {
    let alignment = placement.alignment;
    let alignment_axis = placement.alignment_axis();

    let mut main_side = match alignment_axis {
        Axis::X => {
            let start = if rtl { Alignment::End } else { Alignment::Start };
            if alignment == Some(start) { Side::Right } else { Side::Left }
        }
        Axis::Y => {
            if alignment == Some(Alignment::Start) {
                Side::Bottom
            } else {
                Side::Top
            }
        }
    };

    if rects.reference.length(alignment_axis) > rects.floating.length(alignment_axis) {
        main_side = main_side.opposite();
    }

    (main_side, main_side.opposite())
}

/// The canonical fallback order used by auto-flip strategies, in decreasing
/// similarity to the original placement: opposite alignment, opposite side,
/// then both.
pub fn expanded_placements(placement: Placement) -> [Placement; 3] {
    let opposite = placement.opposite();
    [
        placement.opposite_alignment(),
        opposite,
        opposite.opposite_alignment(),
    ]
}

fn side_list(side: Side, is_start: bool, rtl: bool) -> [Side; 2] {
    match side {
        Side::Top | Side::Bottom => {
            // RTL inverts the horizontal preference only.
            if rtl != is_start {
                [Side::Left, Side::Right]
            } else {
                [Side::Right, Side::Left]
            }
        }
        Side::Left | Side::Right => {
            if is_start {
                [Side::Top, Side::Bottom]
            } else {
                [Side::Bottom, Side::Top]
            }
        }
    }
}

/// The two placements perpendicular to a placement's side, ordered by
/// `direction` and `rtl`. When `flip_alignment` is set and the placement is
/// aligned, the list is doubled with alignment-swapped duplicates.
pub fn opposite_axis_placements(
    placement: Placement,
    flip_alignment: bool,
    direction: Alignment,
    rtl: bool,
) -> Vec<Placement> {
    let sides = side_list(placement.side, direction == Alignment::Start, rtl);

    let mut list: Vec<Placement> = sides
        .into_iter()
        .map(|side| Placement::new(side, placement.alignment))
        .collect();

    if placement.alignment.is_some() && flip_alignment {
        let swapped: Vec<Placement> = list
            .iter()
            .map(|placement| placement.opposite_alignment())
            .collect();
        list.extend(swapped);
    }

    list
}

// =============================================================================
// Placement -> coordinates
// =============================================================================

/// The anchor coordinates for a placement, given the reference and floating
/// rects in the offset-parent coordinate space.
///
/// This is the seed position every pipeline pass starts from; middleware
/// adjust it afterwards.
pub fn compute_coords_from_placement(
    rects: &ElementRects,
    placement: Placement,
    rtl: bool,
) -> Coords {
    let reference = rects.reference;
    let floating = rects.floating;

    let common_x = reference.x + reference.width / 2.0 - floating.width / 2.0;
    let common_y = reference.y + reference.height / 2.0 - floating.height / 2.0;

    let mut coords = match placement.side {
        Side::Top => Coords::new(common_x, reference.y - floating.height),
        Side::Bottom => Coords::new(common_x, reference.y + reference.height),
        Side::Right => Coords::new(reference.x + reference.width, common_y),
        Side::Left => Coords::new(reference.x - floating.width, common_y),
    };

    if let Some(alignment) = placement.alignment {
        let alignment_axis = placement.alignment_axis();
        let length = alignment_axis;
        let common_align =
            reference.length(length) / 2.0 - floating.length(length) / 2.0;
        let is_vertical = placement.side_axis() == Axis::Y;
        let sign = if rtl && is_vertical { -1.0 } else { 1.0 };

        match alignment {
            Alignment::Start => *coords.axis_mut(alignment_axis) -= common_align * sign,
            Alignment::End => *coords.axis_mut(alignment_axis) += common_align * sign,
        }
    }

    coords
}

// =============================================================================
// Tests
// =============================================================================
