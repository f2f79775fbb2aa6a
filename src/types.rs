//! Core types for tether-ui.
//!
//! These types define the geometry vocabulary everything builds on.
//! They flow through the positioning pipeline and define what the
//! synchronization engine commits back into reactive state.

use std::fmt;
use std::str::FromStr;

use serde::de::{Deserialize, Deserializer, Error as DeError};
use serde::ser::{Serialize, Serializer};
use thiserror::Error;

// =============================================================================
// Sides, alignments, axes
// =============================================================================

/// One of the four sides of the reference element a floating element can
/// attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// All four sides, in CSS order.
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// The mirrored side: top <-> bottom, left <-> right.
    pub const fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// The axis the side sits on: top/bottom -> y, left/right -> x.
    pub const fn axis(self) -> Axis {
        match self {
            Side::Top | Side::Bottom => Axis::Y,
            Side::Left | Side::Right => Axis::X,
        }
    }

    /// Whether this side points toward the coordinate origin.
    ///
    /// Placing on an origin side moves the floating element in the negative
    /// direction along the side's axis.
    pub const fn is_origin_side(self) -> bool {
        matches!(self, Side::Top | Side::Left)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alignment of the floating element along the side it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Start,
    End,
}

impl Alignment {
    pub const fn opposite(self) -> Alignment {
        match self {
            Alignment::Start => Alignment::End,
            Alignment::End => Alignment::Start,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Alignment::Start => "start",
            Alignment::End => "end",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A screen axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const fn opposite(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

// =============================================================================
// Placement
// =============================================================================

/// Named position of the floating element relative to the reference:
/// a side plus an optional alignment along that side.
///
/// Encodes as `"<side>"` or `"<side>-<alignment>"`, e.g. `"bottom"` or
/// `"top-start"`. There are exactly 12 placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub side: Side,
    pub alignment: Option<Alignment>,
}

impl Placement {
    pub const TOP: Placement = Placement::new(Side::Top, None);
    pub const TOP_START: Placement = Placement::new(Side::Top, Some(Alignment::Start));
    pub const TOP_END: Placement = Placement::new(Side::Top, Some(Alignment::End));
    pub const RIGHT: Placement = Placement::new(Side::Right, None);
    pub const RIGHT_START: Placement = Placement::new(Side::Right, Some(Alignment::Start));
    pub const RIGHT_END: Placement = Placement::new(Side::Right, Some(Alignment::End));
    pub const BOTTOM: Placement = Placement::new(Side::Bottom, None);
    pub const BOTTOM_START: Placement = Placement::new(Side::Bottom, Some(Alignment::Start));
    pub const BOTTOM_END: Placement = Placement::new(Side::Bottom, Some(Alignment::End));
    pub const LEFT: Placement = Placement::new(Side::Left, None);
    pub const LEFT_START: Placement = Placement::new(Side::Left, Some(Alignment::Start));
    pub const LEFT_END: Placement = Placement::new(Side::Left, Some(Alignment::End));

    /// All 12 placements.
    pub const ALL: [Placement; 12] = [
        Placement::TOP,
        Placement::TOP_START,
        Placement::TOP_END,
        Placement::RIGHT,
        Placement::RIGHT_START,
        Placement::RIGHT_END,
        Placement::BOTTOM,
        Placement::BOTTOM_START,
        Placement::BOTTOM_END,
        Placement::LEFT,
        Placement::LEFT_START,
        Placement::LEFT_END,
    ];

    pub const fn new(side: Side, alignment: Option<Alignment>) -> Placement {
        Placement { side, alignment }
    }

    /// The axis of the placement's side (top/bottom -> y, left/right -> x).
    pub const fn side_axis(self) -> Axis {
        self.side.axis()
    }

    /// The axis the alignment runs along. Always perpendicular to the side
    /// axis.
    pub const fn alignment_axis(self) -> Axis {
        self.side.axis().opposite()
    }

    /// Mirrors the side, preserving the alignment.
    pub const fn opposite(self) -> Placement {
        Placement::new(self.side.opposite(), self.alignment)
    }

    /// Swaps start <-> end, preserving the side. Placements without an
    /// alignment are returned unchanged.
    pub const fn opposite_alignment(self) -> Placement {
        match self.alignment {
            Some(alignment) => Placement::new(self.side, Some(alignment.opposite())),
            None => self,
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Placement::BOTTOM
    }
}

impl From<Side> for Placement {
    fn from(side: Side) -> Self {
        Placement::new(side, None)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.alignment {
            Some(alignment) => write!(f, "{}-{}", self.side, alignment),
            None => write!(f, "{}", self.side),
        }
    }
}

/// Error returned when parsing a malformed placement string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid placement: {0:?}")]
pub struct InvalidPlacement(pub String);

impl FromStr for Side {
    type Err = InvalidPlacement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Side::Top),
            "right" => Ok(Side::Right),
            "bottom" => Ok(Side::Bottom),
            "left" => Ok(Side::Left),
            _ => Err(InvalidPlacement(s.to_string())),
        }
    }
}

impl FromStr for Placement {
    type Err = InvalidPlacement;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (side, alignment) = match s.split_once('-') {
            Some((side, alignment)) => (side, Some(alignment)),
            None => (s, None),
        };
        let side = side.parse::<Side>()?;
        let alignment = match alignment {
            Some("start") => Some(Alignment::Start),
            Some("end") => Some(Alignment::End),
            Some(_) => return Err(InvalidPlacement(s.to_string())),
            None => None,
        };
        Ok(Placement::new(side, alignment))
    }
}

impl Serialize for Placement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Placement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

// =============================================================================
// Strategy
// =============================================================================

/// CSS positioning scheme for the floating element.
///
/// A pass-through value: the pipeline forwards it to the platform and the
/// style generator but never interprets it itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    #[default]
    Absolute,
    Fixed,
}

impl Strategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Strategy::Absolute => "absolute",
            Strategy::Fixed => "fixed",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Coordinates and rectangles
// =============================================================================

/// A top-left-anchored offset in the strategy's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

impl Coords {
    pub const fn new(x: f64, y: f64) -> Coords {
        Coords { x, y }
    }

    pub const fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }
}

/// Width and height of an element, without a position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// An axis-aligned bounding box. Degenerate zero-size rects are valid and
/// represent fully-collapsed elements.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Rect {
        Rect { x, y, width, height }
    }

    /// The rect's extent along an axis (x -> width, y -> height).
    pub const fn length(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    /// The rect's position along an axis.
    pub const fn coord(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Derive the edge view of this rect.
    pub fn client_rect(&self) -> ClientRect {
        ClientRect::from(*self)
    }
}

/// A [`Rect`] carrying its derived edges. Always recomputed from a `Rect`,
/// never stored independently, so the two views cannot diverge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl From<Rect> for ClientRect {
    fn from(rect: Rect) -> Self {
        ClientRect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            top: rect.y,
            left: rect.x,
            right: rect.x + rect.width,
            bottom: rect.y + rect.height,
        }
    }
}

impl ClientRect {
    /// Back to the plain rect. Uses the edge fields, which may describe a
    /// negative-size region after an empty intersection.
    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.right - self.left, self.bottom - self.top)
    }
}

/// The reference and floating rects one computation operates on.
///
/// The reference rect is expressed relative to the floating element's offset
/// parent; the floating rect carries only dimensions (positioned at origin).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElementRects {
    pub reference: Rect,
    pub floating: Rect,
}

// =============================================================================
// Side objects and padding
// =============================================================================

/// A numeric value per side. Used both for padding and for signed overflow
/// (positive = overflowing, negative = clearance).
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct SideObject {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl SideObject {
    pub const fn splat(value: f64) -> SideObject {
        SideObject { top: value, right: value, bottom: value, left: value }
    }

    pub const fn side(&self, side: Side) -> f64 {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }
}

/// A side object with optional entries. Missing sides default to 0 when
/// expanded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PartialSideObject {
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
}

impl PartialSideObject {
    pub fn expand(&self) -> SideObject {
        SideObject {
            top: self.top.unwrap_or(0.0),
            right: self.right.unwrap_or(0.0),
            bottom: self.bottom.unwrap_or(0.0),
            left: self.left.unwrap_or(0.0),
        }
    }
}

/// Padding applied when detecting overflow: either uniform on all four sides
/// or given per side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Padding {
    All(f64),
    PerSide(PartialSideObject),
}

impl Padding {
    /// Normalize to a full [`SideObject`].
    pub fn expand(&self) -> SideObject {
        match self {
            Padding::All(value) => SideObject::splat(*value),
            Padding::PerSide(partial) => partial.expand(),
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Padding::All(0.0)
    }
}

impl From<f64> for Padding {
    fn from(value: f64) -> Self {
        Padding::All(value)
    }
}

impl From<PartialSideObject> for Padding {
    fn from(partial: PartialSideObject) -> Self {
        Padding::PerSide(partial)
    }
}

// =============================================================================
// Tests
// =============================================================================
