#![forbid(unsafe_code)]

//! Interaction state machine: hover, drag-lock, click/select, and freehand
//! stroke capture driven by a stabilized pointer and per-frame gestures.
//!
//! [`InteractionMachine`] is re-evaluated once per frame via
//! [`update`](InteractionMachine::update). Gesture transitions are
//! edge-triggered: the current frame's pinch/fist booleans are compared with
//! the previous frame's, so holding a gesture never repeats an action.
//!
//! # State Machines
//!
//! - **Hover**: recomputed every frame by hit-testing the pointer. Not latched.
//! - **Drag-lock** (Idle, Dragging): a fist rising edge over a note grabs it;
//!   the note's origin tracks `pointer - grab_offset` exactly. A fist falling
//!   edge schedules the release after `drag_release_grace`; a fist within that
//!   window cancels the release.
//! - **Click** (per target: Idle, Cooldown): a pinch rising edge over a button
//!   fires `Click` and locks that button for `click_cooldown`.
//! - **Hold-to-edit**: a pinch rising edge over a note arms a
//!   `hold_to_edit` timer; releasing the pinch first cancels it.
//! - **Stroke** (Idle, Drawing): in draw mode a pinch rising edge away from
//!   toolbar controls starts a stroke, held frames append, the falling edge
//!   commits.
//!
//! # Invariants
//!
//! 1. A fist suppresses every pinch-driven action in the same frame.
//! 2. At most one drag, one edit session, and one in-progress stroke exist.
//! 3. Losing the hand ends a drag immediately (no release grace) and commits
//!    or discards the in-progress stroke.
//! 4. Deferred actions carry the session they were scheduled for and are
//!    no-ops if that session has ended.
//! 5. After [`teardown`](InteractionMachine::teardown), no timer fires.
//!
//! # Failure Modes
//!
//! - If the hand flickers out for less than `hand_loss_grace`, the previous
//!   frame's gesture booleans are kept, so a pinch that was held across the
//!   gap does not count as a new rising edge.
//! - If the UI removes a target mid-interaction via
//!   [`set_targets`](InteractionMachine::set_targets), the drag or edit on it
//!   ends and its cooldown is forgotten.

use ahash::AHashMap;
use tracing::{debug, trace};
use web_time::Instant;

use crate::classifier::GestureState;
use crate::config::TimingConfig;
use crate::event::{InteractionEvent, InteractionMode};
use crate::geometry::{HitPolicy, Point, Target, TargetId, TargetKind, TargetSet, ToolbarAction};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::stabilizer::PointerState;
use crate::stroke::{Brush, Canvas, StrokeAccumulator};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Per-frame input: the stabilized pointer and, if a usable hand was seen,
/// its gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    pub pointer: PointerState,
    pub gesture: Option<GestureState>,
}

impl FrameInput {
    /// Input for a frame with no usable hand.
    #[must_use]
    pub fn absent(last: Point) -> Self {
        Self {
            pointer: PointerState {
                position: last,
                visible: false,
            },
            gesture: None,
        }
    }

    /// Input for a visible hand at `position`.
    #[must_use]
    pub fn present(position: Point, gesture: GestureState) -> Self {
        Self {
            pointer: PointerState {
                position,
                visible: true,
            },
            gesture: Some(gesture),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// Deferred actions owned by the machine.
#[derive(Debug, Clone, PartialEq)]
enum Deferred {
    DragRelease { session: u64 },
    CooldownExpiry { target: TargetId },
    HoldToEdit { target: TargetId, session: u64 },
}

#[derive(Debug, Clone)]
struct DragSession {
    session: u64,
    target: TargetId,
    grab_offset: Point,
    origin: Point,
    release: Option<TimerHandle>,
}

#[derive(Debug, Clone)]
struct HoldArm {
    session: u64,
    target: TargetId,
    timer: TimerHandle,
}

/// Gesture booleans from the previous processed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EdgeMemory {
    pinch: bool,
    fist: bool,
}

// ---------------------------------------------------------------------------
// InteractionMachine
// ---------------------------------------------------------------------------

/// Turns pointer + gesture frames into discrete UI events.
pub struct InteractionMachine {
    timing: TimingConfig,
    hit_policy: HitPolicy,
    targets: TargetSet,
    mode: InteractionMode,

    prev: EdgeMemory,
    lost_since: Option<Instant>,
    hover: Option<TargetId>,

    drag: Option<DragSession>,
    hold: Option<HoldArm>,
    editing: Option<TargetId>,
    cooldowns: AHashMap<TargetId, TimerHandle>,

    stroke: StrokeAccumulator,
    canvas: Canvas,
    brush: Brush,

    timers: Scheduler<Deferred>,
    next_session: u64,
}

impl std::fmt::Debug for InteractionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionMachine")
            .field("mode", &self.mode)
            .field("hover", &self.hover)
            .field("dragging", &self.drag.as_ref().map(|d| &d.target))
            .field("editing", &self.editing)
            .field("drawing", &self.stroke.is_active())
            .field("pending_timers", &self.timers.len())
            .finish()
    }
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new(TimingConfig::default(), HitPolicy::default())
    }
}

impl InteractionMachine {
    #[must_use]
    pub fn new(timing: TimingConfig, hit_policy: HitPolicy) -> Self {
        Self {
            timing,
            hit_policy,
            targets: TargetSet::default(),
            mode: InteractionMode::Pointer,
            prev: EdgeMemory::default(),
            lost_since: None,
            hover: None,
            drag: None,
            hold: None,
            editing: None,
            cooldowns: AHashMap::new(),
            stroke: StrokeAccumulator::new(),
            canvas: Canvas::new(),
            brush: Brush::default(),
            timers: Scheduler::new(),
            next_session: 0,
        }
    }

    /// Process one frame.
    pub fn update(&mut self, input: &FrameInput, now: Instant, out: &mut Vec<InteractionEvent>) {
        let gesture = input.gesture.filter(|_| input.pointer.visible);
        let pinch = gesture.is_some_and(|g| g.pinch_active());
        let fist = gesture.is_some_and(|g| g.is_fist);

        // This frame's signals invalidate pending timers before any can fire.
        if fist
            && let Some(drag) = self.drag.as_mut()
            && let Some(handle) = drag.release.take()
        {
            self.timers.cancel(handle);
            trace!(id = %drag.target, "drag release cancelled by re-grab");
        }
        if !pinch {
            self.cancel_hold();
        }

        self.fire_due(now, out);

        if gesture.is_some() {
            // Frames may stop arriving while the hand is away, so the grace
            // is also measured on return.
            if let Some(since) = self.lost_since.take() {
                self.expire_loss_grace(since, now);
            }
            self.track(input.pointer.position, pinch, fist, now, out);
        } else {
            self.hand_lost(now, out);
        }
    }

    // --- Host-driven changes ---

    /// Replace the target set (layout changed). Drags, edits, hold arms, and
    /// cooldowns on targets that disappeared are ended.
    pub fn set_targets(&mut self, targets: TargetSet, out: &mut Vec<InteractionEvent>) {
        self.targets = targets;

        if let Some(drag) = &self.drag {
            match self.targets.get_mut(&drag.target) {
                Some(t) => t.rect = t.rect.with_origin(drag.origin),
                None => self.end_drag("target_removed", out),
            }
        }
        if let Some(id) = &self.editing
            && !self.targets.contains_id(id)
        {
            self.end_edit(out);
        }
        if let Some(hold) = &self.hold
            && !self.targets.contains_id(&hold.target)
        {
            self.cancel_hold();
        }
        let timers = &mut self.timers;
        let targets = &self.targets;
        self.cooldowns.retain(|id, handle| {
            let keep = targets.contains_id(id);
            if !keep {
                timers.cancel(*handle);
            }
            keep
        });
        if let Some(id) = &self.hover
            && !self.targets.contains_id(id)
        {
            self.hover = None;
            out.push(InteractionEvent::HoverChanged { target: None });
        }
    }

    /// Switch between pointer and draw mode. Leaving draw mode commits any
    /// in-progress stroke.
    pub fn set_mode(&mut self, mode: InteractionMode, out: &mut Vec<InteractionEvent>) {
        if self.mode == mode {
            return;
        }
        if self.mode == InteractionMode::Draw {
            self.finish_stroke(out);
        }
        debug!(from = ?self.mode, to = ?mode, "interaction mode changed");
        self.mode = mode;
        out.push(InteractionEvent::ModeChanged { mode });
    }

    /// End the current edit session, if any. Returns whether one was active.
    pub fn end_edit(&mut self, out: &mut Vec<InteractionEvent>) -> bool {
        match self.editing.take() {
            Some(target) => {
                debug!(id = %target, "edit ended");
                out.push(InteractionEvent::EditEnd { target });
                true
            }
            None => false,
        }
    }

    /// Replace the brush used for new strokes.
    pub fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    /// Remove every committed stroke and abandon the in-progress one.
    pub fn clear_canvas(&mut self, out: &mut Vec<InteractionEvent>) {
        self.stroke.discard();
        self.canvas.clear();
        out.push(InteractionEvent::CanvasCleared);
    }

    /// Dispose of all interaction state. Every pending timer is cancelled,
    /// an active drag or edit is ended, and an in-progress stroke is dropped.
    pub fn teardown(&mut self, out: &mut Vec<InteractionEvent>) {
        let cancelled = self.timers.cancel_all();
        self.cooldowns.clear();
        self.hold = None;
        self.end_drag("teardown", out);
        self.end_edit(out);
        self.stroke.discard();
        self.set_hover(None, out);
        self.prev = EdgeMemory::default();
        self.lost_since = None;
        debug!(cancelled, "interaction machine torn down");
    }

    // --- Accessors ---

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    #[must_use]
    pub fn hover(&self) -> Option<&TargetId> {
        self.hover.as_ref()
    }

    #[must_use]
    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[must_use]
    pub fn drag_target(&self) -> Option<&TargetId> {
        self.drag.as_ref().map(|d| &d.target)
    }

    /// Pointer minus note origin for the active drag.
    #[must_use]
    pub fn grab_offset(&self) -> Option<Point> {
        self.drag.as_ref().map(|d| d.grab_offset)
    }

    #[must_use]
    pub fn editing(&self) -> Option<&TargetId> {
        self.editing.as_ref()
    }

    #[must_use]
    pub fn is_cooling_down(&self, id: &TargetId) -> bool {
        self.cooldowns
            .get(id)
            .is_some_and(|handle| self.timers.is_pending(*handle))
    }

    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.stroke.is_active()
    }

    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[must_use]
    pub fn brush(&self) -> Brush {
        self.brush
    }

    /// Number of deferred actions not yet fired or cancelled.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// When the next deferred action falls due. A driver that stops
    /// delivering frames should still call [`update`](Self::update) by then.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    #[must_use]
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }
}

// ---------------------------------------------------------------------------
// Frame handling
// ---------------------------------------------------------------------------

impl InteractionMachine {
    fn track(
        &mut self,
        pos: Point,
        pinch: bool,
        fist: bool,
        now: Instant,
        out: &mut Vec<InteractionEvent>,
    ) {
        let pinch_rise = pinch && !self.prev.pinch;
        let pinch_fall = !pinch && self.prev.pinch;
        let fist_rise = fist && !self.prev.fist;
        let fist_fall = !fist && self.prev.fist;

        let hit = self
            .targets
            .hit_test(pos, self.hit_policy)
            .map(|t| t.id.clone());
        self.set_hover(hit, out);

        self.update_drag(pos, fist_rise, fist_fall, now, out);

        if pinch_rise {
            self.on_pinch_start(pos, now, out);
        } else if pinch && let Some(point) = self.stroke.push(pos) {
            out.push(InteractionEvent::StrokeAppend { point });
        }
        if pinch_fall {
            self.finish_stroke(out);
        }

        self.prev = EdgeMemory { pinch, fist };
    }

    fn hand_lost(&mut self, now: Instant, out: &mut Vec<InteractionEvent>) {
        let since = *self.lost_since.get_or_insert(now);
        self.set_hover(None, out);
        self.end_drag("hand_lost", out);
        self.finish_stroke(out);
        self.expire_loss_grace(since, now);
    }

    fn expire_loss_grace(&mut self, since: Instant, now: Instant) {
        if self.prev != EdgeMemory::default()
            && now.duration_since(since) >= self.timing.hand_loss_grace
        {
            trace!("hand loss grace expired; gestures re-armed");
            self.prev = EdgeMemory::default();
        }
    }

    fn set_hover(&mut self, hit: Option<TargetId>, out: &mut Vec<InteractionEvent>) {
        if hit != self.hover {
            trace!(from = ?self.hover, to = ?hit, "hover changed");
            self.hover = hit.clone();
            out.push(InteractionEvent::HoverChanged { target: hit });
        }
    }

    fn hovered(&self) -> Option<&Target> {
        self.hover.as_ref().and_then(|id| self.targets.get(id))
    }

    // --- Drag-lock ---

    fn update_drag(
        &mut self,
        pos: Point,
        fist_rise: bool,
        fist_fall: bool,
        now: Instant,
        out: &mut Vec<InteractionEvent>,
    ) {
        let Some(drag) = self.drag.as_mut() else {
            if fist_rise {
                self.try_start_drag(pos, out);
            }
            return;
        };

        if fist_fall && drag.release.is_none() {
            let deadline = now + self.timing.drag_release_grace;
            let handle = self.timers.schedule(
                deadline,
                Deferred::DragRelease {
                    session: drag.session,
                },
            );
            drag.release = Some(handle);
            trace!(id = %drag.target, "drag release scheduled");
        }

        let origin = pos - drag.grab_offset;
        if origin != drag.origin {
            drag.origin = origin;
            if let Some(t) = self.targets.get_mut(&drag.target) {
                t.rect = t.rect.with_origin(origin);
            }
            out.push(InteractionEvent::DragMove {
                target: drag.target.clone(),
                position: origin,
            });
        }
    }

    fn try_start_drag(&mut self, pos: Point, out: &mut Vec<InteractionEvent>) {
        let Some(target) = self.hovered() else {
            return;
        };
        if !target.is_draggable() || self.editing.as_ref() == Some(&target.id) {
            return;
        }
        let id = target.id.clone();
        let origin = target.rect.origin();
        let grab_offset = pos - origin;

        self.cancel_hold();
        let session = self.next_session();
        debug!(id = %id, session, "drag started");
        self.drag = Some(DragSession {
            session,
            target: id.clone(),
            grab_offset,
            origin,
            release: None,
        });
        out.push(InteractionEvent::DragStart {
            target: id,
            offset: grab_offset,
        });
    }

    fn end_drag(&mut self, reason: &'static str, out: &mut Vec<InteractionEvent>) {
        if let Some(drag) = self.drag.take() {
            if let Some(handle) = drag.release {
                self.timers.cancel(handle);
            }
            debug!(id = %drag.target, session = drag.session, reason, "drag ended");
            out.push(InteractionEvent::DragEnd {
                target: drag.target,
            });
        }
    }

    // --- Pinch actions ---

    fn on_pinch_start(&mut self, pos: Point, now: Instant, out: &mut Vec<InteractionEvent>) {
        let hovered = self.hovered().map(|t| (t.id.clone(), t.kind));

        if let Some(editing) = &self.editing
            && hovered.as_ref().map(|(id, _)| id) != Some(editing)
        {
            self.end_edit(out);
        }

        match hovered {
            Some((id, TargetKind::Toolbar(action))) => self.apply_toolbar(id, action, out),
            _ if self.mode == InteractionMode::Draw => {
                let point = self.stroke.begin(pos, self.brush);
                trace!(x = pos.x, y = pos.y, "stroke started");
                out.push(InteractionEvent::StrokeAppend { point });
            }
            Some((id, TargetKind::Button)) => self.click(id, now, out),
            Some((id, TargetKind::Note)) => self.arm_hold(id, now),
            None => {}
        }
    }

    fn click(&mut self, id: TargetId, now: Instant, out: &mut Vec<InteractionEvent>) {
        if self.is_cooling_down(&id) {
            debug!(id = %id, "click suppressed by cooldown");
            return;
        }
        let handle = self.timers.schedule(
            now + self.timing.click_cooldown,
            Deferred::CooldownExpiry { target: id.clone() },
        );
        self.cooldowns.insert(id.clone(), handle);
        debug!(id = %id, "click");
        out.push(InteractionEvent::Click { target: id });
    }

    fn arm_hold(&mut self, id: TargetId, now: Instant) {
        if self.editing.as_ref() == Some(&id) {
            return;
        }
        self.cancel_hold();
        let session = self.next_session();
        let timer = self.timers.schedule(
            now + self.timing.hold_to_edit,
            Deferred::HoldToEdit {
                target: id.clone(),
                session,
            },
        );
        trace!(id = %id, session, "hold-to-edit armed");
        self.hold = Some(HoldArm {
            session,
            target: id,
            timer,
        });
    }

    fn cancel_hold(&mut self) {
        if let Some(hold) = self.hold.take() {
            self.timers.cancel(hold.timer);
            trace!(id = %hold.target, "hold-to-edit cancelled");
        }
    }

    fn apply_toolbar(&mut self, id: TargetId, action: ToolbarAction, out: &mut Vec<InteractionEvent>) {
        debug!(id = %id, ?action, "toolbar action");
        out.push(InteractionEvent::Toolbar { target: id, action });
        match action {
            ToolbarAction::SetColor(color) => self.brush.color = color,
            ToolbarAction::SetWidth(width) => {
                if width.is_finite() && width > 0.0 {
                    self.brush.width = width;
                }
            }
            ToolbarAction::Clear => self.clear_canvas(out),
            ToolbarAction::Exit => self.set_mode(InteractionMode::Pointer, out),
        }
    }

    // --- Stroke ---

    fn finish_stroke(&mut self, out: &mut Vec<InteractionEvent>) {
        if !self.stroke.is_active() {
            return;
        }
        match self.stroke.finish() {
            Some(stroke) => {
                debug!(points = stroke.len(), "stroke committed");
                out.push(InteractionEvent::StrokeCommit {
                    points: stroke.points().to_vec(),
                    color: stroke.color(),
                    width: stroke.width(),
                });
                self.canvas.commit(stroke);
            }
            None => trace!("single-sample stroke discarded"),
        }
    }

    // --- Timers ---

    fn fire_due(&mut self, now: Instant, out: &mut Vec<InteractionEvent>) {
        for (handle, task) in self.timers.drain_due(now) {
            match task {
                Deferred::DragRelease { session } => {
                    let current = self
                        .drag
                        .as_ref()
                        .is_some_and(|d| d.session == session && d.release == Some(handle));
                    if current {
                        self.end_drag("released", out);
                    } else {
                        trace!(session, "stale drag release ignored");
                    }
                }
                Deferred::CooldownExpiry { target } => {
                    if self.cooldowns.get(&target) == Some(&handle) {
                        self.cooldowns.remove(&target);
                        trace!(id = %target, "cooldown expired");
                    }
                }
                Deferred::HoldToEdit { target, session } => {
                    if self.hold.as_ref().is_some_and(|h| h.session == session) {
                        self.hold = None;
                        if self.editing.is_some() {
                            self.end_edit(out);
                        }
                        debug!(id = %target, "edit started");
                        self.editing = Some(target.clone());
                        out.push(InteractionEvent::EditStart { target });
                    } else {
                        trace!(session, "stale hold-to-edit ignored");
                    }
                }
            }
        }
    }

    fn next_session(&mut self) -> u64 {
        self.next_session += 1;
        self.next_session
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
