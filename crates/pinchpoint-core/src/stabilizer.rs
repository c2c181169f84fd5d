#![forbid(unsafe_code)]

//! Two-stage pointer smoothing.
//!
//! Raw fingertip positions jitter from frame to frame. [`PointerStabilizer`]
//! smooths them in two stages:
//!
//! 1. A moving-average window (default 3 samples, oldest evicted) removes
//!    single-frame sensor noise.
//! 2. A one-pole exponential filter toward the window mean (default weight
//!    0.3 new / 0.7 old) damps the step between successive window means.
//!
//! # Hand loss
//!
//! `update(None)` marks the pointer invisible and clears the window, but the
//! smoothed position is retained. When the hand reappears, filtering resumes
//! from where the pointer was instead of jumping in from the origin.
//!
//! Interaction policy (grace windows, re-arming) is not handled here.

use std::collections::VecDeque;

use crate::config::StabilizerConfig;
use crate::geometry::{Point, Viewport};

/// Stabilized pointer output for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointerState {
    /// Last smoothed position. Meaningful only once a hand has been seen.
    pub position: Point,
    pub visible: bool,
}

/// Moving-average plus exponential smoothing of the pointer fingertip.
#[derive(Debug, Clone)]
pub struct PointerStabilizer {
    config: StabilizerConfig,
    window: VecDeque<Point>,
    smoothed: Option<Point>,
    visible: bool,
}

impl PointerStabilizer {
    #[must_use]
    pub fn new(config: StabilizerConfig) -> Self {
        let window = VecDeque::with_capacity(config.window.max(1));
        Self {
            config,
            window,
            smoothed: None,
            visible: false,
        }
    }

    /// Project a camera-normalized coordinate to screen pixels.
    #[must_use]
    pub fn to_screen(&self, x: f32, y: f32) -> Point {
        let Viewport { width, height } = self.config.viewport;
        let x = if self.config.mirror_x { 1.0 - x } else { x };
        Point::new(x * width, y * height)
    }

    /// Feed one frame. `raw` is the camera-normalized fingertip `(x, y)`, or
    /// `None` when no usable hand was observed.
    pub fn update(&mut self, raw: Option<(f32, f32)>) -> PointerState {
        let Some((x, y)) = raw else {
            self.window.clear();
            self.visible = false;
            return self.state();
        };

        if self.window.len() >= self.config.window.max(1) {
            self.window.pop_front();
        }
        self.window.push_back(self.to_screen(x, y));

        let mean = self.window_mean();
        let next = match self.smoothed {
            Some(prev) => {
                let a = self.config.smoothing;
                Point::new(prev.x + a * (mean.x - prev.x), prev.y + a * (mean.y - prev.y))
            }
            None => mean,
        };
        self.smoothed = Some(next);
        self.visible = true;
        self.state()
    }

    /// Current output without feeding a sample.
    #[must_use]
    pub fn state(&self) -> PointerState {
        PointerState {
            position: self.smoothed.unwrap_or(Point::ORIGIN),
            visible: self.visible,
        }
    }

    /// Change the projection target. Existing state is kept.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
    }

    #[must_use]
    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Forget everything, including the retained position.
    pub fn reset(&mut self) {
        self.window.clear();
        self.smoothed = None;
        self.visible = false;
    }

    fn window_mean(&self) -> Point {
        let n = self.window.len().max(1) as f32;
        let (sx, sy) = self
            .window
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / n, sy / n)
    }
}

impl Default for PointerStabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}
