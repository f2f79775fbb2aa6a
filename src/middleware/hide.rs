//! Hide middleware - reports when the floating element should be hidden.
//!
//! Purely observational: it never moves the element, it only attaches data
//! the consumer can map to visibility styles.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{Middleware, MiddlewareReturn, MiddlewareState};
use crate::error::PositionError;
use crate::overflow::{detect_overflow, DetectOverflowOptions};
use crate::platform::ElementContext;
use crate::types::{Rect, Side, SideObject};

/// Which visibility condition to detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HideStrategy {
    /// The reference is fully clipped on at least one side, so the floating
    /// element appears detached from anything.
    #[default]
    ReferenceHidden,
    /// The floating element has fully escaped the reference's clipping
    /// region.
    Escaped,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HideOptions {
    pub strategy: HideStrategy,
    pub detect: DetectOverflowOptions,
}

/// Payload stored under `"hide"`. Only the fields for the configured
/// strategy are present; both sets accumulate when two hide steps run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HideData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_hidden_offsets: Option<SideObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escaped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escaped_offsets: Option<SideObject>,
}

struct Hide {
    options: HideOptions,
}

pub fn hide(options: HideOptions) -> Rc<dyn Middleware> {
    Rc::new(Hide { options })
}

/// Overflow re-expressed as "how far past fully clipped": a side at 0 or
/// above means the rect is entirely outside on that side.
fn side_offsets(overflow: SideObject, rect: Rect) -> SideObject {
    SideObject {
        top: overflow.top - rect.height,
        right: overflow.right - rect.width,
        bottom: overflow.bottom - rect.height,
        left: overflow.left - rect.width,
    }
}

fn any_side_fully_clipped(offsets: SideObject) -> bool {
    Side::ALL.iter().any(|side| offsets.side(*side) >= 0.0)
}

impl Middleware for Hide {
    fn name(&self) -> &'static str {
        "hide"
    }

    fn compute(&self, state: MiddlewareState<'_>) -> Result<MiddlewareReturn, PositionError> {
        let data = match self.options.strategy {
            HideStrategy::ReferenceHidden => {
                let overflow = detect_overflow(
                    &state,
                    &DetectOverflowOptions {
                        element_context: ElementContext::Reference,
                        ..self.options.detect.clone()
                    },
                )?;
                let offsets = side_offsets(overflow, state.rects.reference);
                HideData {
                    reference_hidden: Some(any_side_fully_clipped(offsets)),
                    reference_hidden_offsets: Some(offsets),
                    ..Default::default()
                }
            }
            HideStrategy::Escaped => {
                let overflow = detect_overflow(
                    &state,
                    &DetectOverflowOptions {
                        alt_boundary: true,
                        ..self.options.detect.clone()
                    },
                )?;
                let offsets = side_offsets(overflow, state.rects.floating);
                HideData {
                    escaped: Some(any_side_fully_clipped(offsets)),
                    escaped_offsets: Some(offsets),
                    ..Default::default()
                }
            }
        };

        Ok(MiddlewareReturn {
            data: Some(serde_json::to_value(data)?),
            ..Default::default()
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
