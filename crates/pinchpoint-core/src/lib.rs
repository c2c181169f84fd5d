#![forbid(unsafe_code)]

//! Core: hand gestures, pointer stabilization, and interaction state.
//!
//! # Role in PinchPoint
//! `pinchpoint-core` turns per-frame hand keypoints from an external detector
//! into discrete UI events. It owns no camera, model, or renderer; the host
//! calls [`FramePipeline::process`] once per display frame and applies the
//! returned [`FrameOutput`].
//!
//! # Primary responsibilities
//! - **Classification**: pinch and fist from one frame's skeleton ([`classifier`]).
//! - **Stabilization**: moving average plus exponential smoothing of the
//!   index fingertip ([`stabilizer`]).
//! - **Interaction**: hover, drag-lock, click cooldown, hold-to-edit, and
//!   freehand strokes ([`interaction`]).
//! - **Deferred actions**: cancellable frame-clock timers ([`scheduler`]).
//!
//! # How it fits in the system
//! Everything runs synchronously on the host's frame callback. The
//! `pinchpoint-harness` crate replays recorded JSONL traces through the same
//! pipeline for offline testing.

pub mod classifier;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod hand;
pub mod interaction;
pub mod pipeline;
pub mod scheduler;
pub mod stabilizer;
pub mod stroke;

#[cfg(any(test, feature = "test-helpers"))]
pub mod fixtures;

pub use classifier::{GestureClassifier, GestureState};
pub use config::{ClassifierConfig, PointerConfig, StabilizerConfig, TimingConfig};
pub use error::{ConfigError, ObservationError};
pub use event::{FrameOutput, InteractionEvent, InteractionMode};
pub use geometry::{
    HitPolicy, Point, Rect, Target, TargetId, TargetKind, TargetSet, ToolbarAction, Viewport,
};
pub use hand::{HandLandmarks, HandObservation, Handedness, Keypoint};
pub use interaction::{FrameInput, InteractionMachine};
pub use pipeline::{FramePipeline, SharedPipeline};
pub use stabilizer::{PointerStabilizer, PointerState};
pub use stroke::{Brush, Canvas, Color, Stroke, StrokePoint};
