#![forbid(unsafe_code)]

//! Tunable thresholds and timings for the whole pipeline.
//!
//! Every constant the classifier, stabilizer, and interaction machine depend
//! on lives here as a named field. [`PointerConfig::default()`] reproduces the
//! documented defaults exactly:
//!
//! | Field | Default |
//! |-------|---------|
//! | `classifier.pinch_threshold` | 0.08 (normalized units) |
//! | `classifier.depth_weight` | 2.0 |
//! | `classifier.curl_ratio` | 1.3 |
//! | `classifier.min_curled_fingers` | 3 of 4 |
//! | `stabilizer.window` | 3 samples |
//! | `stabilizer.smoothing` | 0.3 (new sample weight) |
//! | `timing.drag_release_grace` | 100ms |
//! | `timing.hand_loss_grace` | 150ms |
//! | `timing.hold_to_edit` | 400ms |
//! | `timing.click_cooldown` | 500ms |
//! | `min_confidence` | 0.5 |
//!
//! # Loading
//!
//! With the `config` feature, a partial TOML or JSON document is layered over
//! the defaults. Durations are written in milliseconds:
//!
//! ```toml
//! min_confidence = 0.6
//!
//! [classifier]
//! pinch_threshold = 0.07
//!
//! [timing]
//! click_cooldown = 650
//! ```

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::error::ConfigError;
use crate::geometry::{HitPolicy, Viewport};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Gesture classification thresholds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ClassifierConfig {
    /// Thumb-to-index distance below which the hand is pinching.
    pub pinch_threshold: f32,
    /// Multiplier applied to the depth delta before combining with x/y.
    pub depth_weight: f32,
    /// Tip-to-wrist / knuckle-to-wrist ratio below which a finger is curled.
    pub curl_ratio: f32,
    /// Curled fingers (out of four) required for a fist.
    pub min_curled_fingers: u8,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.08,
            depth_weight: 2.0,
            curl_ratio: 1.3,
            min_curled_fingers: 3,
        }
    }
}

/// Pointer smoothing parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct StabilizerConfig {
    /// Capacity of the moving-average window.
    pub window: usize,
    /// Weight of the new window mean in the exponential filter.
    pub smoothing: f32,
    /// Screen size the normalized coordinates are projected onto.
    pub viewport: Viewport,
    /// Flip x so a front-facing camera moves the pointer with the hand.
    pub mirror_x: bool,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            window: 3,
            smoothing: 0.3,
            viewport: Viewport::default(),
            mirror_x: true,
        }
    }
}

/// Deferred-action timings for the interaction machine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TimingConfig {
    /// Delay before a fist release actually ends a drag.
    #[cfg_attr(feature = "config", serde(with = "duration_ms"))]
    pub drag_release_grace: Duration,
    /// Per-target lockout after a click.
    #[cfg_attr(feature = "config", serde(with = "duration_ms"))]
    pub click_cooldown: Duration,
    /// Pinch hold required to enter edit mode on a note.
    #[cfg_attr(feature = "config", serde(with = "duration_ms"))]
    pub hold_to_edit: Duration,
    /// Window after hand loss during which held gestures do not re-arm.
    #[cfg_attr(feature = "config", serde(with = "duration_ms"))]
    pub hand_loss_grace: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            drag_release_grace: Duration::from_millis(100),
            click_cooldown: Duration::from_millis(500),
            hold_to_edit: Duration::from_millis(400),
            hand_loss_grace: Duration::from_millis(150),
        }
    }
}

// ---------------------------------------------------------------------------
// PointerConfig
// ---------------------------------------------------------------------------

/// Complete configuration for a [`FramePipeline`](crate::pipeline::FramePipeline).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct PointerConfig {
    pub classifier: ClassifierConfig,
    pub stabilizer: StabilizerConfig,
    pub timing: TimingConfig,
    /// Hands scored below this are treated as absent.
    pub min_confidence: f32,
    /// Overlap resolution for hit testing.
    pub hit_policy: HitPolicy,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            stabilizer: StabilizerConfig::default(),
            timing: TimingConfig::default(),
            min_confidence: 0.5,
            hit_policy: HitPolicy::default(),
        }
    }
}

impl PointerConfig {
    /// Load from a TOML string, rejecting invalid values.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.into_validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded TOML pointer config");
        Ok(config)
    }

    /// Load from a JSON string, rejecting invalid values.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.into_validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded JSON pointer config");
        Ok(config)
    }

    /// Load a file, choosing the format by extension (`.json`, else TOML).
    #[cfg(feature = "config")]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Return `self` if [`validate`](Self::validate) finds no problems.
    pub fn into_validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let c = &self.classifier;
        if !(c.pinch_threshold > 0.0) {
            errors.push(format!(
                "classifier.pinch_threshold must be > 0, got {}",
                c.pinch_threshold
            ));
        }
        if !(c.depth_weight >= 0.0) {
            errors.push(format!(
                "classifier.depth_weight must be >= 0, got {}",
                c.depth_weight
            ));
        }
        if !(c.curl_ratio > 0.0) {
            errors.push(format!(
                "classifier.curl_ratio must be > 0, got {}",
                c.curl_ratio
            ));
        }
        if !(1..=4).contains(&c.min_curled_fingers) {
            errors.push(format!(
                "classifier.min_curled_fingers must be in 1..=4, got {}",
                c.min_curled_fingers
            ));
        }

        let s = &self.stabilizer;
        if s.window == 0 {
            errors.push("stabilizer.window must be > 0".into());
        }
        if !(s.smoothing > 0.0 && s.smoothing <= 1.0) {
            errors.push(format!(
                "stabilizer.smoothing must be in (0, 1], got {}",
                s.smoothing
            ));
        }
        if !(s.viewport.width > 0.0 && s.viewport.height > 0.0) {
            errors.push(format!(
                "stabilizer.viewport must be non-empty, got {}x{}",
                s.viewport.width, s.viewport.height
            ));
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            errors.push(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            ));
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Duration (de)serialization
// ---------------------------------------------------------------------------

#[cfg(feature = "config")]
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use web_time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PointerConfig::default().validate().is_empty());
    }

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = PointerConfig::default();
        assert_eq!(cfg.classifier.pinch_threshold, 0.08);
        assert_eq!(cfg.classifier.curl_ratio, 1.3);
        assert_eq!(cfg.classifier.min_curled_fingers, 3);
        assert_eq!(cfg.stabilizer.window, 3);
        assert_eq!(cfg.stabilizer.smoothing, 0.3);
        assert_eq!(cfg.timing.drag_release_grace, Duration::from_millis(100));
        assert_eq!(cfg.timing.hand_loss_grace, Duration::from_millis(150));
        assert_eq!(cfg.timing.hold_to_edit, Duration::from_millis(400));
        assert_eq!(cfg.timing.click_cooldown, Duration::from_millis(500));
        assert_eq!(cfg.hit_policy, HitPolicy::DeclarationOrder);
    }

    #[test]
    fn validate_reports_every_violation() {
        let mut cfg = PointerConfig::default();
        cfg.classifier.pinch_threshold = 0.0;
        cfg.classifier.min_curled_fingers = 5;
        cfg.stabilizer.window = 0;
        cfg.stabilizer.smoothing = 1.5;
        cfg.min_confidence = 2.0;
        let errors = cfg.validate();
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors[0].contains("pinch_threshold"));
    }

    #[test]
    fn nan_threshold_is_invalid() {
        let mut cfg = PointerConfig::default();
        cfg.classifier.pinch_threshold = f32::NAN;
        assert_eq!(cfg.validate().len(), 1);
    }

    #[test]
    fn into_validated_wraps_errors() {
        let mut cfg = PointerConfig::default();
        cfg.stabilizer.window = 0;
        assert!(matches!(cfg.into_validated(), Err(ConfigError::Invalid(e)) if e.len() == 1));
    }

    #[cfg(feature = "config")]
    mod loading {
        use super::*;

        #[test]
        fn partial_toml_layers_over_defaults() {
            let cfg = PointerConfig::from_toml_str(
                r#"
                min_confidence = 0.6

                [classifier]
                pinch_threshold = 0.07

                [timing]
                click_cooldown = 650
                "#,
            )
            .unwrap();
            assert_eq!(cfg.min_confidence, 0.6);
            assert_eq!(cfg.classifier.pinch_threshold, 0.07);
            assert_eq!(cfg.classifier.curl_ratio, 1.3);
            assert_eq!(cfg.timing.click_cooldown, Duration::from_millis(650));
            assert_eq!(cfg.timing.hold_to_edit, Duration::from_millis(400));
        }

        #[test]
        fn json_hit_policy_and_viewport() {
            let cfg = PointerConfig::from_json_str(
                r#"{"hit_policy":"z_order","stabilizer":{"viewport":{"width":800,"height":600}}}"#,
            )
            .unwrap();
            assert_eq!(cfg.hit_policy, HitPolicy::ZOrder);
            assert_eq!(cfg.stabilizer.viewport, Viewport::new(800.0, 600.0));
        }

        #[test]
        fn invalid_values_are_rejected() {
            let err = PointerConfig::from_toml_str("[stabilizer]\nsmoothing = 0.0\n").unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));
        }

        #[test]
        fn syntax_errors_surface_as_toml() {
            let err = PointerConfig::from_toml_str("[classifier\n").unwrap_err();
            assert!(matches!(err, ConfigError::Toml(_)));
        }

        #[test]
        fn file_loading_picks_format_by_extension() {
            let dir = tempfile::tempdir().unwrap();
            let json = dir.path().join("p.json");
            std::fs::write(&json, r#"{"min_confidence":0.25}"#).unwrap();
            assert_eq!(PointerConfig::from_file(&json).unwrap().min_confidence, 0.25);

            let toml_path = dir.path().join("p.toml");
            std::fs::write(&toml_path, "min_confidence = 0.75\n").unwrap();
            assert_eq!(
                PointerConfig::from_file(&toml_path).unwrap().min_confidence,
                0.75
            );
        }

        #[test]
        fn missing_file_is_io_error() {
            let err = PointerConfig::from_file("/definitely/not/here.toml").unwrap_err();
            assert!(matches!(err, ConfigError::Io(_)));
        }
    }
}
