#![forbid(unsafe_code)]

//! Per-frame hand observations produced by an external keypoint detector.
//!
//! A detector reports zero or more [`HandObservation`]s per frame. Each
//! observation is expected to carry exactly [`KEYPOINT_COUNT`] keypoints in
//! fixed anatomical order, but nothing upstream guarantees it. Consumers call
//! [`HandObservation::landmarks`] to obtain a validated [`HandLandmarks`]; an
//! observation that fails validation is treated as "no hand" for that slot.
//!
//! # Coordinate space
//!
//! `x` and `y` are normalized to `[0, 1]` in camera space (origin top-left of
//! the unmirrored camera image). `z` is relative depth whose sign and scale
//! depend on the detector; only differences between keypoints are meaningful.

use crate::error::ObservationError;

/// Number of keypoints in a complete hand skeleton.
pub const KEYPOINT_COUNT: usize = 21;

// ---------------------------------------------------------------------------
// Landmark indices
// ---------------------------------------------------------------------------

/// Anatomical landmark indices into a [`HandLandmarks`] array.
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// `(knuckle, tip)` pairs for the four non-thumb fingers.
    pub const FINGERS: [(usize, usize); 4] = [
        (INDEX_MCP, INDEX_TIP),
        (MIDDLE_MCP, MIDDLE_TIP),
        (RING_MCP, RING_TIP),
        (PINKY_MCP, PINKY_TIP),
    ];
}

// ---------------------------------------------------------------------------
// Keypoint
// ---------------------------------------------------------------------------

/// One tracked anatomical point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Keypoint {
    /// Create a keypoint.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance with the depth axis scaled by `depth_weight`.
    #[inline]
    #[must_use]
    pub fn weighted_distance(self, other: Self, depth_weight: f32) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = (self.z - other.z) * depth_weight;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Plain 3D Euclidean distance.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.weighted_distance(other, 1.0)
    }

    #[inline]
    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Keypoint {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

// ---------------------------------------------------------------------------
// Handedness
// ---------------------------------------------------------------------------

/// Which hand the detector believes it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Handedness {
    Left,
    #[default]
    Right,
}

// ---------------------------------------------------------------------------
// HandObservation
// ---------------------------------------------------------------------------

/// One hand as reported by the detector for a single frame.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandObservation {
    /// Keypoints in anatomical order. Should hold [`KEYPOINT_COUNT`] entries.
    pub keypoints: Vec<Keypoint>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub handedness: Handedness,
    /// Detection confidence in `[0, 1]`.
    pub score: f32,
}

impl HandObservation {
    /// Create an observation.
    #[must_use]
    pub fn new(keypoints: Vec<Keypoint>, handedness: Handedness, score: f32) -> Self {
        Self {
            keypoints,
            handedness,
            score,
        }
    }

    /// Validate the observation and return its fixed-size landmark array.
    ///
    /// # Errors
    ///
    /// Fails when the keypoint count is wrong, any coordinate is not finite,
    /// or the score lies outside `[0, 1]`.
    pub fn landmarks(&self) -> Result<HandLandmarks, ObservationError> {
        if !(0.0..=1.0).contains(&self.score) {
            return Err(ObservationError::ScoreOutOfRange { score: self.score });
        }
        let points: [Keypoint; KEYPOINT_COUNT] =
            self.keypoints
                .as_slice()
                .try_into()
                .map_err(|_| ObservationError::KeypointCount {
                    expected: KEYPOINT_COUNT,
                    found: self.keypoints.len(),
                })?;
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(ObservationError::NonFinite { index });
        }
        Ok(HandLandmarks(points))
    }
}

// ---------------------------------------------------------------------------
// HandLandmarks
// ---------------------------------------------------------------------------

/// A validated, complete hand skeleton.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks([Keypoint; KEYPOINT_COUNT]);

impl HandLandmarks {
    /// Wrap an already-complete keypoint array.
    #[must_use]
    pub const fn from_array(points: [Keypoint; KEYPOINT_COUNT]) -> Self {
        Self(points)
    }

    /// Keypoint at a [`landmark`] index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= KEYPOINT_COUNT`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Keypoint {
        self.0[index]
    }

    /// The fingertip that drives the pointer.
    #[inline]
    #[must_use]
    pub fn pointer_tip(&self) -> Keypoint {
        self.0[landmark::INDEX_TIP]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Keypoint] {
        &self.0
    }

    #[must_use]
    pub const fn into_array(self) -> [Keypoint; KEYPOINT_COUNT] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(score: f32) -> HandObservation {
        HandObservation::new(
            vec![Keypoint::new(0.5, 0.5, 0.0); KEYPOINT_COUNT],
            Handedness::Right,
            score,
        )
    }

    #[cfg(all(feature = "serde", feature = "config"))]
    #[test]
    fn handedness_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Handedness::Left).unwrap(), "\"left\"");
        let parsed: Handedness = serde_json::from_str("\"right\"").unwrap();
        assert_eq!(parsed, Handedness::Right);
    }

    #[test]
    fn complete_observation_validates() {
        let lm = full(0.9).landmarks().unwrap();
        assert_eq!(lm.as_slice().len(), KEYPOINT_COUNT);
        assert_eq!(lm.pointer_tip(), Keypoint::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn short_observation_is_rejected() {
        let mut obs = full(0.9);
        obs.keypoints.truncate(20);
        assert_eq!(
            obs.landmarks(),
            Err(ObservationError::KeypointCount {
                expected: 21,
                found: 20
            })
        );
    }

    #[test]
    fn long_observation_is_rejected() {
        let mut obs = full(0.9);
        obs.keypoints.push(Keypoint::default());
        assert!(matches!(
            obs.landmarks(),
            Err(ObservationError::KeypointCount { found: 22, .. })
        ));
    }

    #[test]
    fn nan_coordinate_is_rejected() {
        let mut obs = full(0.9);
        obs.keypoints[7].y = f32::NAN;
        assert_eq!(obs.landmarks(), Err(ObservationError::NonFinite { index: 7 }));
    }

    #[test]
    fn score_outside_unit_interval_is_rejected() {
        assert!(full(1.5).landmarks().is_err());
        assert!(full(-0.1).landmarks().is_err());
        assert!(full(f32::NAN).landmarks().is_err());
    }

    #[test]
    fn weighted_distance_scales_depth_only() {
        let a = Keypoint::new(0.0, 0.0, 0.0);
        let b = Keypoint::new(0.0, 0.0, 0.1);
        assert!((a.weighted_distance(b, 2.0) - 0.2).abs() < 1e-6);
        let c = Keypoint::new(0.3, 0.4, 0.0);
        assert!((a.weighted_distance(c, 5.0) - 0.5).abs() < 1e-6);
    }
}
