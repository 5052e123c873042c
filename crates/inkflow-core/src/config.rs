//! Ink pipeline configuration.
//!
//! Every tunable of the pipeline lives here as plain data. The controller
//! owns its config; nothing reads process-wide state.

use crate::stroke::Rgba8;
use serde::{Deserialize, Serialize};

/// Tunables for [`crate::predictor::KineticPredictor`].
///
/// Distances are in scene units (pixels at 100% zoom), velocities in units
/// per millisecond, times in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Gap above which input is treated as a stall and state is reset.
    pub stall_threshold_ms: f64,
    /// Displacement above which a sample is treated as a teleport and
    /// state is reset instead of smoothed.
    pub teleport_threshold: f64,
    /// Hard cap on velocity magnitude, direction-preserving.
    pub max_velocity: f64,
    /// EMA weight for the velocity estimate.
    pub velocity_alpha: f64,
    /// Position EMA weight when moving slower than `speed_threshold`.
    pub position_alpha_slow: f64,
    /// Upper bound for the position EMA weight at high speed.
    pub position_alpha_max: f64,
    /// Base position EMA weight once `speed_threshold` is exceeded.
    pub position_alpha_fast_base: f64,
    /// Speed gain applied on top of `position_alpha_fast_base`.
    pub position_alpha_fast_gain: f64,
    /// Speed separating the precise (heavy smoothing) and responsive
    /// (light smoothing) regimes.
    pub speed_threshold: f64,
    /// Prediction horizon when nearly stationary.
    pub min_prediction_ms: f64,
    /// Hard cap on the prediction horizon.
    pub max_prediction_ms: f64,
    /// Base horizon once `speed_threshold` is exceeded.
    pub prediction_base_ms: f64,
    /// Speed gain applied on top of `prediction_base_ms`.
    pub prediction_gain: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            stall_threshold_ms: 200.0,
            teleport_threshold: 150.0,
            max_velocity: 5.0,
            velocity_alpha: 0.4,
            position_alpha_slow: 0.2,
            position_alpha_max: 0.95,
            position_alpha_fast_base: 0.6,
            position_alpha_fast_gain: 0.1,
            speed_threshold: 0.05,
            min_prediction_ms: 2.0,
            max_prediction_ms: 20.0,
            prediction_base_ms: 12.0,
            prediction_gain: 5.0,
        }
    }
}

/// Tunables for the stroke input pipeline as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkConfig {
    /// Douglas-Peucker tolerance applied at stroke completion.
    pub simplify_tolerance: f64,
    /// Raw samples closer than this to the last kept sample are dropped.
    pub min_sample_spacing: f64,
    /// Predictor tunables.
    pub predictor: PredictorConfig,
}

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            simplify_tolerance: 1.5,
            min_sample_spacing: 1.0,
            predictor: PredictorConfig::default(),
        }
    }
}

/// Available writing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Pen,
    Highlighter,
    Eraser,
}

/// Width and color of the strokes the active tool produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub kind: ToolKind,
    pub width: f64,
    pub color: Rgba8,
}

impl ToolConfig {
    pub fn pen(width: f64, color: Rgba8) -> Self {
        Self {
            kind: ToolKind::Pen,
            width,
            color,
        }
    }

    /// Highlighters are wider and translucent.
    pub fn highlighter(width: f64, mut color: Rgba8) -> Self {
        color.a = 128;
        Self {
            kind: ToolKind::Highlighter,
            width: width.max(12.0),
            color,
        }
    }

    /// Eraser strokes carry no color of their own; they are rendered in the
    /// background color by the consumer.
    pub fn eraser(width: f64) -> Self {
        Self {
            kind: ToolKind::Eraser,
            width,
            color: Rgba8::white(),
        }
    }

    pub fn is_eraser(&self) -> bool {
        self.kind == ToolKind::Eraser
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self::pen(3.0, Rgba8::black())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let config = PredictorConfig::default();
        assert!(config.min_prediction_ms < config.max_prediction_ms);
        assert!(config.position_alpha_slow < config.position_alpha_max);
        assert!(config.max_velocity > 0.0);
    }

    #[test]
    fn test_highlighter_preset() {
        let tool = ToolConfig::highlighter(3.0, Rgba8::new(255, 230, 0, 255));
        assert_eq!(tool.color.a, 128);
        assert!(tool.width >= 12.0);
        assert!(!tool.is_eraser());
    }

    #[test]
    fn test_eraser_preset() {
        assert!(ToolConfig::eraser(20.0).is_eraser());
    }
}
