#![forbid(unsafe_code)]

//! Output events consumed by UI widgets.
//!
//! A frame produces a [`FrameOutput`]: the ordered list of events that
//! changed since the previous frame. Pointer and gesture updates are only
//! present when their value changed, so an idle hand produces an empty
//! output.
//!
//! # Invariants
//!
//! 1. Every drag is well-formed: `DragStart` → zero or more `DragMove` →
//!    `DragEnd`.
//! 2. `EditEnd` for a target is only emitted after an `EditStart` for it.
//! 3. `StrokeCommit` carries at least two points, and all `StrokeAppend`s
//!    since the last commit or discard belong to it.

use crate::classifier::GestureState;
use crate::geometry::{Point, TargetId, ToolbarAction};
use crate::stroke::{Color, StrokePoint};

/// What a pinch does when it is not over a toolbar control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InteractionMode {
    /// Pinch clicks buttons and holds notes.
    #[default]
    Pointer,
    /// Pinch draws freehand strokes.
    Draw,
}

/// One discrete change emitted to the UI layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum InteractionEvent {
    /// Stabilized pointer moved or changed visibility.
    PointerUpdate { position: Point, visible: bool },
    /// Gesture classification changed.
    GestureUpdate {
        is_pinching: bool,
        is_fist: bool,
        pinch_strength: f32,
    },
    /// The hovered target changed (`None` = nothing hovered).
    HoverChanged { target: Option<TargetId> },
    Click { target: TargetId },
    /// A fist grabbed a note. `offset` is pointer minus note origin.
    DragStart { target: TargetId, offset: Point },
    /// New absolute origin of the dragged note.
    DragMove { target: TargetId, position: Point },
    DragEnd { target: TargetId },
    EditStart { target: TargetId },
    EditEnd { target: TargetId },
    StrokeAppend { point: StrokePoint },
    StrokeCommit {
        points: Vec<StrokePoint>,
        color: Color,
        width: f32,
    },
    Toolbar {
        target: TargetId,
        action: ToolbarAction,
    },
    CanvasCleared,
    ModeChanged { mode: InteractionMode },
}

impl InteractionEvent {
    /// Event for a gesture snapshot; all-false when no hand is present.
    #[must_use]
    pub fn gesture(state: Option<&GestureState>) -> Self {
        match state {
            Some(g) => Self::GestureUpdate {
                is_pinching: g.pinch_active(),
                is_fist: g.is_fist,
                pinch_strength: g.pinch_strength,
            },
            None => Self::GestureUpdate {
                is_pinching: false,
                is_fist: false,
                pinch_strength: 0.0,
            },
        }
    }

    /// Short snake_case name, used for log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PointerUpdate { .. } => "pointer_update",
            Self::GestureUpdate { .. } => "gesture_update",
            Self::HoverChanged { .. } => "hover_changed",
            Self::Click { .. } => "click",
            Self::DragStart { .. } => "drag_start",
            Self::DragMove { .. } => "drag_move",
            Self::DragEnd { .. } => "drag_end",
            Self::EditStart { .. } => "edit_start",
            Self::EditEnd { .. } => "edit_end",
            Self::StrokeAppend { .. } => "stroke_append",
            Self::StrokeCommit { .. } => "stroke_commit",
            Self::Toolbar { .. } => "toolbar",
            Self::CanvasCleared => "canvas_cleared",
            Self::ModeChanged { .. } => "mode_changed",
        }
    }
}

/// Everything that changed during one processed frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    pub events: Vec<InteractionEvent>,
}

impl FrameOutput {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events with the given [`InteractionEvent::name`].
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a InteractionEvent> + 'a {
        self.events.iter().filter(move |e| e.name() == name)
    }

    /// Targets that received a `Click`, in order.
    #[must_use]
    pub fn clicks(&self) -> Vec<&TargetId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                InteractionEvent::Click { target } => Some(target),
                _ => None,
            })
            .collect()
    }
}

impl IntoIterator for FrameOutput {
    type Item = InteractionEvent;
    type IntoIter = std::vec::IntoIter<InteractionEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gesture_event_applies_fist_precedence() {
        let g = GestureState {
            pinch_distance: 0.01,
            pinch_strength: 0.9,
            is_pinching: true,
            is_fist: true,
        };
        assert_eq!(
            InteractionEvent::gesture(Some(&g)),
            InteractionEvent::GestureUpdate {
                is_pinching: false,
                is_fist: true,
                pinch_strength: 0.9,
            }
        );
    }

    #[test]
    fn absent_gesture_is_all_false() {
        assert_eq!(
            InteractionEvent::gesture(None),
            InteractionEvent::GestureUpdate {
                is_pinching: false,
                is_fist: false,
                pinch_strength: 0.0,
            }
        );
    }

    #[test]
    fn clicks_filters_in_order() {
        let out = FrameOutput {
            events: vec![
                InteractionEvent::HoverChanged {
                    target: Some("a".into()),
                },
                InteractionEvent::Click { target: "a".into() },
                InteractionEvent::CanvasCleared,
                InteractionEvent::Click { target: "b".into() },
            ],
        };
        let ids: Vec<&str> = out.clicks().into_iter().map(TargetId::as_str).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(out.named("canvas_cleared").count(), 1);
    }
}
