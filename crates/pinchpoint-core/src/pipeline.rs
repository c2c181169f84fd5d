#![forbid(unsafe_code)]

//! Per-frame driver: validation, classification, stabilization, interaction.
//!
//! [`FramePipeline::process`] is the whole core in one call. The host invokes
//! it once per rendered frame with whatever hands the detector produced and
//! receives a [`FrameOutput`] holding only what changed.
//!
//! ```
//! use pinchpoint_core::{FramePipeline, PointerConfig, Rect, Target, TargetSet};
//! use web_time::Instant;
//!
//! let mut pipeline = FramePipeline::new(PointerConfig::default());
//! pipeline.set_targets(TargetSet::new(vec![Target::button(
//!     "ok",
//!     Rect::new(50.0, 150.0, 160.0, 80.0),
//! )]));
//! let out = pipeline.process(&[], Instant::now());
//! assert!(out.is_empty());
//! ```
//!
//! # Failure Modes
//!
//! A malformed or low-confidence primary observation is discarded and the
//! frame proceeds as if no hand were present. Nothing here returns an error;
//! the most recent rejection is available via
//! [`last_rejection`](FramePipeline::last_rejection).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, TryLockError};

use tracing::{debug, trace};
use web_time::Instant;

use crate::classifier::{GestureClassifier, GestureState};
use crate::config::PointerConfig;
use crate::error::{ConfigError, ObservationError};
use crate::event::{FrameOutput, InteractionEvent, InteractionMode};
use crate::geometry::{TargetSet, Viewport};
use crate::hand::{HandLandmarks, HandObservation};
use crate::interaction::{FrameInput, InteractionMachine};
use crate::stabilizer::{PointerStabilizer, PointerState};
use crate::stroke::Brush;

/// Frame-driven gesture pipeline for the primary hand.
#[derive(Debug)]
pub struct FramePipeline {
    min_confidence: f32,
    classifier: GestureClassifier,
    stabilizer: PointerStabilizer,
    machine: InteractionMachine,
    last_pointer: PointerState,
    last_gesture: InteractionEvent,
    last_rejection: Option<ObservationError>,
    frames: u64,
    rejected: u64,
}

impl Default for FramePipeline {
    fn default() -> Self {
        Self::new(PointerConfig::default())
    }
}

impl FramePipeline {
    /// Build a pipeline from a configuration the caller has already checked.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if [`PointerConfig::validate`] reports any
    /// problem. Use [`try_new`](Self::try_new) for untrusted values.
    #[must_use]
    pub fn new(config: PointerConfig) -> Self {
        debug_assert!(
            config.validate().is_empty(),
            "invalid pointer config: {:?}",
            config.validate()
        );
        let PointerConfig {
            classifier,
            stabilizer,
            timing,
            min_confidence,
            hit_policy,
        } = config;
        Self {
            min_confidence,
            classifier: GestureClassifier::new(classifier),
            stabilizer: PointerStabilizer::new(stabilizer),
            machine: InteractionMachine::new(timing, hit_policy),
            last_pointer: PointerState::default(),
            last_gesture: InteractionEvent::gesture(None),
            last_rejection: None,
            frames: 0,
            rejected: 0,
        }
    }

    /// Validate `config`, then build the pipeline.
    pub fn try_new(config: PointerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.into_validated()?))
    }

    /// Process one frame. `hands` is in detector ranking order; only the
    /// first entry drives the pointer.
    pub fn process(&mut self, hands: &[HandObservation], now: Instant) -> FrameOutput {
        self.frames += 1;
        if hands.len() > 1 {
            trace!(count = hands.len(), "ignoring secondary hands");
        }

        let hand = hands.first().and_then(|obs| self.accept(obs));
        let gesture = hand.as_ref().map(|lm| self.classifier.classify(lm));
        let tip = hand.as_ref().map(|lm| {
            let k = lm.pointer_tip();
            (k.x, k.y)
        });
        let pointer = self.stabilizer.update(tip);

        let mut events = Vec::new();
        self.diff_outputs(pointer, gesture.as_ref(), &mut events);
        self.machine.update(&FrameInput { pointer, gesture }, now, &mut events);

        if !events.is_empty() {
            trace!(frame = self.frames, events = events.len(), "frame produced events");
        }
        FrameOutput { events }
    }

    /// Replace the hit-test targets.
    pub fn set_targets(&mut self, targets: TargetSet) -> FrameOutput {
        let mut events = Vec::new();
        self.machine.set_targets(targets, &mut events);
        FrameOutput { events }
    }

    pub fn set_mode(&mut self, mode: InteractionMode) -> FrameOutput {
        let mut events = Vec::new();
        self.machine.set_mode(mode, &mut events);
        FrameOutput { events }
    }

    /// End the current note edit session, if any.
    pub fn end_edit(&mut self) -> FrameOutput {
        let mut events = Vec::new();
        self.machine.end_edit(&mut events);
        FrameOutput { events }
    }

    pub fn set_brush(&mut self, brush: Brush) {
        self.machine.set_brush(brush);
    }

    /// Change the screen size the pointer is projected onto.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        debug!(width = viewport.width, height = viewport.height, "viewport changed");
        self.stabilizer.set_viewport(viewport);
    }

    /// Dispose of all interaction state. No timer fires afterwards, and the
    /// pointer is reported hidden.
    pub fn teardown(&mut self) -> FrameOutput {
        let mut events = Vec::new();
        self.machine.teardown(&mut events);
        let pointer = self.stabilizer.update(None);
        self.diff_outputs(pointer, None, &mut events);
        self.stabilizer.reset();
        FrameOutput { events }
    }

    // --- Accessors ---

    #[must_use]
    pub fn machine(&self) -> &InteractionMachine {
        &self.machine
    }

    #[must_use]
    pub fn pointer(&self) -> PointerState {
        self.last_pointer
    }

    /// Why the most recent discarded primary observation was rejected.
    #[must_use]
    pub fn last_rejection(&self) -> Option<&ObservationError> {
        self.last_rejection.as_ref()
    }

    /// Frames processed so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Primary observations discarded so far.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn accept(&mut self, obs: &HandObservation) -> Option<HandLandmarks> {
        let result = obs.landmarks().and_then(|lm| {
            if obs.score < self.min_confidence {
                Err(ObservationError::LowConfidence {
                    score: obs.score,
                    min: self.min_confidence,
                })
            } else {
                Ok(lm)
            }
        });
        match result {
            Ok(lm) => Some(lm),
            Err(err) => {
                debug!(reason = err.reason(), error = %err, "primary hand discarded");
                self.rejected += 1;
                self.last_rejection = Some(err);
                None
            }
        }
    }

    fn diff_outputs(
        &mut self,
        pointer: PointerState,
        gesture: Option<&GestureState>,
        events: &mut Vec<InteractionEvent>,
    ) {
        if pointer != self.last_pointer {
            self.last_pointer = pointer;
            events.push(InteractionEvent::PointerUpdate {
                position: pointer.position,
                visible: pointer.visible,
            });
        }
        let gesture = InteractionEvent::gesture(gesture);
        if gesture != self.last_gesture {
            self.last_gesture = gesture.clone();
            events.push(gesture);
        }
    }
}

// ---------------------------------------------------------------------------
// SharedPipeline
// ---------------------------------------------------------------------------

/// A [`FramePipeline`] shared with a frame callback that may re-enter.
///
/// At most one frame is in flight: [`try_process`](Self::try_process) skips
/// a frame whose predecessor still holds the pipeline.
#[derive(Debug, Clone)]
pub struct SharedPipeline {
    inner: Arc<Mutex<FramePipeline>>,
    skipped: Arc<AtomicU64>,
}

impl SharedPipeline {
    #[must_use]
    pub fn new(pipeline: FramePipeline) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pipeline)),
            skipped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Process a frame unless another frame is in flight.
    pub fn try_process(&self, hands: &[HandObservation], now: Instant) -> Option<FrameOutput> {
        match self.inner.try_lock() {
            Ok(mut pipeline) => Some(pipeline.process(hands, now)),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner().process(hands, now)),
            Err(TryLockError::WouldBlock) => {
                let skipped = self.skipped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(skipped, "frame skipped; previous frame still in flight");
                None
            }
        }
    }

    /// Run `f` with exclusive access, waiting for an in-flight frame.
    pub fn with<R>(&self, f: impl FnOnce(&mut FramePipeline) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Frames dropped because a previous frame was still being processed.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}
