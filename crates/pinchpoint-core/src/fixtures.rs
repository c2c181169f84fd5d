#![forbid(unsafe_code)]

//! Synthetic hand skeletons for tests and benchmarks.
//!
//! Poses are built around the index fingertip so tests can place the pointer
//! precisely. With the default classifier thresholds:
//!
//! | Pose | `is_pinching` | `is_fist` |
//! |------|---------------|-----------|
//! | `Open` | false | false |
//! | `Pinch` | true | false |
//! | `Fist` | false | true |
//! | `FistPinching` | true | true |

use crate::geometry::{Point, Viewport};
use crate::hand::{HandLandmarks, HandObservation, Handedness, KEYPOINT_COUNT, Keypoint, landmark};

/// Canonical hand shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandPose {
    Open,
    Pinch,
    Fist,
    FistPinching,
}

/// Horizontal offset of each non-thumb finger from the wrist.
const FINGER_SPREAD: [f32; 4] = [-0.03, 0.0, 0.03, 0.06];
const KNUCKLE_RISE: f32 = 0.15;
const OPEN_REACH: f32 = 0.30;
const FIST_REACH: f32 = 0.12;

impl HandPose {
    fn curled(self) -> bool {
        matches!(self, Self::Fist | Self::FistPinching)
    }

    fn reach(self) -> f32 {
        if self.curled() { FIST_REACH } else { OPEN_REACH }
    }
}

/// Build a pose whose index fingertip sits at normalized `(tip_x, tip_y)`.
#[must_use]
pub fn pose_landmarks(pose: HandPose, tip_x: f32, tip_y: f32) -> HandLandmarks {
    let reach = pose.reach();
    let wrist = Keypoint::new(tip_x - FINGER_SPREAD[0], tip_y + reach, 0.0);
    let at = |dx: f32, dy: f32| Keypoint::new(wrist.x + dx, wrist.y + dy, 0.0);

    let mut points = [wrist; KEYPOINT_COUNT];
    for (finger, &(knuckle, tip)) in landmark::FINGERS.iter().enumerate() {
        let dx = FINGER_SPREAD[finger];
        points[knuckle] = at(dx, -KNUCKLE_RISE);
        // PIP and DIP sit between knuckle and tip.
        let span = reach - KNUCKLE_RISE;
        points[knuckle + 1] = at(dx, -KNUCKLE_RISE - span / 3.0);
        points[knuckle + 2] = at(dx, -KNUCKLE_RISE - 2.0 * span / 3.0);
        points[tip] = at(dx, -reach);
    }
    // Fist tips end above the wrist but below the knuckles; the exact
    // index-tip position is what the pointer follows.
    points[landmark::INDEX_TIP] = Keypoint::new(tip_x, tip_y, 0.0);

    points[landmark::THUMB_CMC] = at(-0.06, -0.04);
    points[landmark::THUMB_MCP] = at(-0.10, -0.08);
    points[landmark::THUMB_IP] = at(-0.13, -0.12);
    points[landmark::THUMB_TIP] = match pose {
        HandPose::Open => at(-0.16, -0.16),
        HandPose::Fist => at(-0.12, -0.05),
        HandPose::Pinch | HandPose::FistPinching => Keypoint::new(tip_x + 0.01, tip_y, 0.0),
    };

    HandLandmarks::from_array(points)
}

/// A confident right-hand observation of `pose` at normalized coordinates.
#[must_use]
pub fn observation(pose: HandPose, tip_x: f32, tip_y: f32) -> HandObservation {
    HandObservation::new(
        pose_landmarks(pose, tip_x, tip_y).as_slice().to_vec(),
        Handedness::Right,
        0.95,
    )
}

/// An observation whose index tip projects to `screen` under a mirrored
/// `viewport`, the default stabilizer mapping.
#[must_use]
pub fn observation_at_screen(pose: HandPose, screen: Point, viewport: Viewport) -> HandObservation {
    observation(
        pose,
        1.0 - screen.x / viewport.width,
        screen.y / viewport.height,
    )
}
