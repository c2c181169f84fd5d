#![forbid(unsafe_code)]

//! Screen-space primitives, interaction targets, and hit testing.
//!
//! All coordinates are screen pixels with the origin at the top-left.
//! [`Rect::contains`] is inclusive on every edge, so a pointer resting exactly
//! on a border still counts as inside.
//!
//! # Overlap policy
//!
//! When several targets contain the pointer, [`TargetSet::hit_test`] resolves
//! the winner according to [`HitPolicy`]:
//!
//! - [`HitPolicy::DeclarationOrder`]: the first declared match wins.
//! - [`HitPolicy::ZOrder`]: the highest [`Target::z`] wins; equal `z` falls
//!   back to declaration order.

use std::fmt;

use crate::stroke::Color;

// ---------------------------------------------------------------------------
// Point / Viewport / Rect
// ---------------------------------------------------------------------------

/// A position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Size of the screen area normalized coordinates are projected onto.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    any(feature = "serde", feature = "config"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// An axis-aligned rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Right edge (inclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (inclusive).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if a point is inside the rectangle, borders included.
    #[inline]
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Same size, new top-left corner.
    #[inline]
    #[must_use]
    pub const fn with_origin(self, origin: Point) -> Self {
        Self::new(origin.x, origin.y, self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Stable identity of an interaction target, owned by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TargetId(String);

impl TargetId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Instantaneous action bound to a drawing-toolbar control.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ToolbarAction {
    SetColor(Color),
    SetWidth(f32),
    Clear,
    Exit,
}

/// What a target does when the pointer interacts with it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TargetKind {
    /// Fires `Click` on a pinch, then cools down.
    Button,
    /// Fist-draggable; a held pinch enters edit mode.
    Note,
    /// Drawing-toolbar control, no cooldown.
    Toolbar(ToolbarAction),
}

/// A rectangle the pointer can hover and act on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Target {
    pub id: TargetId,
    pub kind: TargetKind,
    pub rect: Rect,
    /// Stacking order under [`HitPolicy::ZOrder`]. Higher is on top.
    #[cfg_attr(feature = "serde", serde(default))]
    pub z: i32,
}

impl Target {
    #[must_use]
    pub fn new(id: impl Into<TargetId>, kind: TargetKind, rect: Rect) -> Self {
        Self {
            id: id.into(),
            kind,
            rect,
            z: 0,
        }
    }

    #[must_use]
    pub fn button(id: impl Into<TargetId>, rect: Rect) -> Self {
        Self::new(id, TargetKind::Button, rect)
    }

    #[must_use]
    pub fn note(id: impl Into<TargetId>, rect: Rect) -> Self {
        Self::new(id, TargetKind::Note, rect)
    }

    #[must_use]
    pub fn toolbar(id: impl Into<TargetId>, action: ToolbarAction, rect: Rect) -> Self {
        Self::new(id, TargetKind::Toolbar(action), rect)
    }

    /// Builder-style stacking order.
    #[must_use]
    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_draggable(&self) -> bool {
        matches!(self.kind, TargetKind::Note)
    }
}

// ---------------------------------------------------------------------------
// Hit testing
// ---------------------------------------------------------------------------

/// How overlapping targets are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    any(feature = "serde", feature = "config"),
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(
    any(feature = "serde", feature = "config"),
    serde(rename_all = "snake_case")
)]
pub enum HitPolicy {
    /// First declared match wins.
    #[default]
    DeclarationOrder,
    /// Highest `z` wins, ties go to the earlier declaration.
    ZOrder,
}

/// The current set of targets in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    targets: Vec<Target>,
}

impl TargetSet {
    #[must_use]
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    #[must_use]
    pub fn get(&self, id: &TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| &t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &TargetId) -> Option<&mut Target> {
        self.targets.iter_mut().find(|t| &t.id == id)
    }

    #[must_use]
    pub fn contains_id(&self, id: &TargetId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Resolve the target under `point`, if any.
    #[must_use]
    pub fn hit_test(&self, point: Point, policy: HitPolicy) -> Option<&Target> {
        let mut hits = self.targets.iter().filter(|t| t.rect.contains(point));
        match policy {
            HitPolicy::DeclarationOrder => hits.next(),
            // `max_by_key` keeps the last maximum; fold keeps the first.
            HitPolicy::ZOrder => hits.fold(None, |best: Option<&Target>, t| match best {
                Some(b) if b.z >= t.z => Some(b),
                _ => Some(t),
            }),
        }
    }
}

impl FromIterator<Target> for TargetSet {
    fn from_iter<I: IntoIterator<Item = Target>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive_on_all_edges() {
        let r = Rect::new(50.0, 150.0, 160.0, 80.0);
        assert!(r.contains(Point::new(50.0, 150.0)));
        assert!(r.contains(Point::new(210.0, 230.0)));
        assert!(r.contains(Point::new(210.0, 150.0)));
        assert!(r.contains(Point::new(50.0, 230.0)));
        assert!(r.contains(Point::new(100.0, 180.0)));
    }

    #[test]
    fn contains_rejects_outside() {
        let r = Rect::new(50.0, 150.0, 160.0, 80.0);
        assert!(!r.contains(Point::new(49.9, 180.0)));
        assert!(!r.contains(Point::new(210.1, 180.0)));
        assert!(!r.contains(Point::new(100.0, 149.9)));
        assert!(!r.contains(Point::new(100.0, 230.1)));
    }

    #[test]
    fn zero_size_rect_contains_only_its_origin() {
        let r = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(!r.contains(Point::new(10.5, 10.0)));
    }

    fn overlapping() -> TargetSet {
        TargetSet::new(vec![
            Target::note("a", Rect::new(0.0, 0.0, 100.0, 100.0)),
            Target::note("b", Rect::new(50.0, 50.0, 100.0, 100.0)).with_z(2),
            Target::note("c", Rect::new(60.0, 60.0, 100.0, 100.0)).with_z(2),
        ])
    }

    #[test]
    fn declaration_order_picks_first_match() {
        let set = overlapping();
        let hit = set.hit_test(Point::new(75.0, 75.0), HitPolicy::DeclarationOrder);
        assert_eq!(hit.map(|t| t.id.as_str()), Some("a"));
    }

    #[test]
    fn z_order_picks_highest_then_earliest() {
        let set = overlapping();
        let hit = set.hit_test(Point::new(75.0, 75.0), HitPolicy::ZOrder);
        assert_eq!(hit.map(|t| t.id.as_str()), Some("b"));
    }

    #[test]
    fn miss_returns_none() {
        let set = overlapping();
        assert!(
            set.hit_test(Point::new(500.0, 5.0), HitPolicy::ZOrder)
                .is_none()
        );
    }

    #[test]
    fn only_notes_are_draggable() {
        let r = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!(Target::note("n", r).is_draggable());
        assert!(!Target::button("b", r).is_draggable());
        assert!(!Target::toolbar("t", ToolbarAction::Clear, r).is_draggable());
    }
}
