#![forbid(unsafe_code)]

//! Gesture classification from a single frame's hand skeleton.
//!
//! [`GestureClassifier::classify`] is a pure O(1) function of one
//! [`HandLandmarks`] value. It carries no memory across frames; edge detection
//! and debouncing belong to the interaction machine.
//!
//! # Pinch
//!
//! The thumb-tip to index-tip distance is measured with the depth axis scaled
//! by `depth_weight`. The hand is pinching below `pinch_threshold`, and
//! `pinch_strength` ramps linearly from 1 at contact to 0 at the threshold.
//!
//! # Fist
//!
//! Each non-thumb finger is curled when `|tip - wrist| / |knuckle - wrist|` is
//! below `curl_ratio`. Both distances scale with apparent hand size, so the
//! test does not depend on how far the hand is from the camera.
//!
//! # Precedence
//!
//! A closing fist often brings the thumb near the index tip. When both
//! conditions hold, the fist wins: [`GestureState::pinch_active`] is false
//! whenever `is_fist` is true.

use crate::config::ClassifierConfig;
use crate::hand::{HandLandmarks, landmark};

/// Knuckle-to-wrist distances at or below this are degenerate.
const MIN_BONE_LENGTH: f32 = 1e-6;

/// Classified gesture for one hand in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GestureState {
    /// Depth-weighted thumb-to-index distance in normalized units.
    pub pinch_distance: f32,
    /// Continuous pinch confidence in `[0, 1]`.
    pub pinch_strength: f32,
    /// Raw pinch condition, before fist precedence.
    pub is_pinching: bool,
    pub is_fist: bool,
}

impl GestureState {
    /// Pinch as seen by consumers: suppressed while the hand is a fist.
    #[inline]
    #[must_use]
    pub const fn pinch_active(&self) -> bool {
        self.is_pinching && !self.is_fist
    }
}

/// Stateless classifier holding its thresholds.
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    config: ClassifierConfig,
}

impl GestureClassifier {
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one hand.
    #[must_use]
    pub fn classify(&self, hand: &HandLandmarks) -> GestureState {
        let pinch_distance = self.pinch_distance(hand);
        let threshold = self.config.pinch_threshold;
        GestureState {
            pinch_distance,
            pinch_strength: (1.0 - pinch_distance / threshold).clamp(0.0, 1.0),
            is_pinching: pinch_distance < threshold,
            is_fist: self.curled_fingers(hand) >= self.config.min_curled_fingers,
        }
    }

    /// Depth-weighted thumb-tip to index-tip distance.
    #[must_use]
    pub fn pinch_distance(&self, hand: &HandLandmarks) -> f32 {
        hand.get(landmark::THUMB_TIP).weighted_distance(
            hand.get(landmark::INDEX_TIP),
            self.config.depth_weight,
        )
    }

    /// Number of non-thumb fingers whose curl ratio is below threshold.
    #[must_use]
    pub fn curled_fingers(&self, hand: &HandLandmarks) -> u8 {
        let wrist = hand.get(landmark::WRIST);
        landmark::FINGERS
            .iter()
            .filter(|&&(knuckle, tip)| {
                let bone = hand.get(knuckle).distance(wrist);
                bone > MIN_BONE_LENGTH
                    && hand.get(tip).distance(wrist) / bone < self.config.curl_ratio
            })
            .count() as u8
    }
}
