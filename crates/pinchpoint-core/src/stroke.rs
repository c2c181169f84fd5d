#![forbid(unsafe_code)]

//! Freehand stroke capture.
//!
//! [`StrokeAccumulator`] collects pointer samples while a draw gesture is held.
//! When the gesture releases, [`StrokeAccumulator::finish`] yields an immutable
//! [`Stroke`] if at least two distinct samples were captured; shorter input is
//! noise and is dropped. [`Canvas`] only ever receives finished strokes, so a
//! stroke is appended exactly once.

use crate::geometry::Point;

/// Minimum samples for a stroke to be kept.
pub const MIN_STROKE_POINTS: usize = 2;

// ---------------------------------------------------------------------------
// Brush
// ---------------------------------------------------------------------------

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Self = Self::rgb(0xff, 0x3b, 0x30);
    pub const BLUE: Self = Self::rgb(0x00, 0x7a, 0xff);
    pub const GREEN: Self = Self::rgb(0x34, 0xc7, 0x59);
    pub const YELLOW: Self = Self::rgb(0xff, 0xcc, 0x00);
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// The color and width applied to new strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color,
    pub width: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Color::RED,
            width: 4.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Stroke
// ---------------------------------------------------------------------------

/// One captured sample, tagged with the brush active when it was taken.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
    pub color: Color,
    pub width: f32,
}

impl StrokePoint {
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A completed, immutable polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    points: Vec<StrokePoint>,
    color: Color,
    width: f32,
}

impl Stroke {
    #[must_use]
    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ---------------------------------------------------------------------------
// StrokeAccumulator
// ---------------------------------------------------------------------------

/// In-progress stroke buffer.
#[derive(Debug, Clone, Default)]
pub struct StrokeAccumulator {
    brush: Option<Brush>,
    points: Vec<StrokePoint>,
}

impl StrokeAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a stroke is currently being captured.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.brush.is_some()
    }

    /// Start a new stroke at `at`, dropping any unfinished one.
    pub fn begin(&mut self, at: Point, brush: Brush) -> StrokePoint {
        self.points.clear();
        self.brush = Some(brush);
        let sample = Self::sample(at, brush);
        self.points.push(sample);
        sample
    }

    /// Append a sample. Returns `None` when inactive or when `at` repeats the
    /// previous sample.
    pub fn push(&mut self, at: Point) -> Option<StrokePoint> {
        let brush = self.brush?;
        if self.points.last().is_some_and(|p| p.position() == at) {
            return None;
        }
        let sample = Self::sample(at, brush);
        self.points.push(sample);
        Some(sample)
    }

    /// End capture. Returns the stroke if it has enough samples; the buffer is
    /// cleared either way.
    pub fn finish(&mut self) -> Option<Stroke> {
        let brush = self.brush.take()?;
        let points = std::mem::take(&mut self.points);
        (points.len() >= MIN_STROKE_POINTS).then_some(Stroke {
            points,
            color: brush.color,
            width: brush.width,
        })
    }

    /// Abandon the in-progress stroke.
    pub fn discard(&mut self) {
        self.brush = None;
        self.points.clear();
    }

    /// Samples captured so far.
    #[must_use]
    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    fn sample(at: Point, brush: Brush) -> StrokePoint {
        StrokePoint {
            x: at.x,
            y: at.y,
            color: brush.color,
            width: brush.width,
        }
    }
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// Completed strokes in commit order.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    strokes: Vec<Stroke>,
}

impl Canvas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}
