#![forbid(unsafe_code)]

//! Error types.
//!
//! [`ObservationError`] never escapes the frame pipeline: a hand that fails
//! validation is simply treated as absent for that frame. [`ConfigError`] is
//! returned by the configuration loaders.

use thiserror::Error;

/// Why a [`HandObservation`](crate::hand::HandObservation) was discarded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObservationError {
    #[error("expected {expected} keypoints, found {found}")]
    KeypointCount { expected: usize, found: usize },

    #[error("keypoint {index} has a non-finite coordinate")]
    NonFinite { index: usize },

    #[error("detection score {score} outside [0, 1]")]
    ScoreOutOfRange { score: f32 },

    #[error("detection score {score} below minimum {min}")]
    LowConfidence { score: f32, min: f32 },
}

impl ObservationError {
    /// Short machine-readable reason, used as a structured log field.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::KeypointCount { .. } => "keypoint_count",
            Self::NonFinite { .. } => "non_finite",
            Self::ScoreOutOfRange { .. } => "score_range",
            Self::LowConfidence { .. } => "low_confidence",
        }
    }
}

/// Errors from loading or validating a [`PointerConfig`](crate::config::PointerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_joins_messages() {
        let err = ConfigError::Invalid(vec!["a must be > 0".into(), "b too big".into()]);
        assert_eq!(
            err.to_string(),
            "invalid configuration: a must be > 0; b too big"
        );
    }

    #[test]
    fn observation_reasons_are_stable() {
        let err = ObservationError::KeypointCount {
            expected: 21,
            found: 3,
        };
        assert_eq!(err.reason(), "keypoint_count");
        assert_eq!(err.to_string(), "expected 21 keypoints, found 3");
    }
}
