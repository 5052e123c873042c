//! Kinetic input prediction.
//!
//! Maintains a smoothed position/velocity estimate from raw pen samples and
//! extrapolates a short distance into the future so the rendered tip keeps
//! up with the physical pen. Smoothing is adaptive: slow, precise motion is
//! smoothed heavily for stability, fast motion is smoothed lightly and
//! predicted further ahead.

use crate::config::PredictorConfig;
use kurbo::{Point, Vec2};

/// Predicts the pen position a few milliseconds ahead of the last sample.
///
/// All input anomalies (duplicate or backward timestamps, input stalls,
/// implausible jumps) are absorbed internally; no method fails.
#[derive(Debug, Clone)]
pub struct KineticPredictor {
    config: PredictorConfig,
    smoothed_pos: Point,
    /// Velocity estimate in scene units per millisecond.
    velocity: Vec2,
    last_timestamp: u64,
    has_prior_point: bool,
    prediction_ms: f64,
}

impl KineticPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        let min_prediction = config.min_prediction_ms;
        Self {
            config,
            smoothed_pos: Point::ZERO,
            velocity: Vec2::ZERO,
            last_timestamp: 0,
            has_prior_point: false,
            prediction_ms: min_prediction,
        }
    }

    /// Clear all state. Must be called at stroke start so velocity never
    /// leaks from one stroke into the next.
    pub fn reset(&mut self) {
        self.smoothed_pos = Point::ZERO;
        self.velocity = Vec2::ZERO;
        self.last_timestamp = 0;
        self.has_prior_point = false;
        self.prediction_ms = self.config.min_prediction_ms;
    }

    /// Feed one real sample into the estimate.
    pub fn add_point(&mut self, raw_pos: Point, timestamp_ms: u64) {
        if !self.has_prior_point {
            self.smoothed_pos = raw_pos;
            self.velocity = Vec2::ZERO;
            self.last_timestamp = timestamp_ms;
            self.has_prior_point = true;
            return;
        }

        // Duplicate or out-of-order event: no velocity is computable.
        if timestamp_ms <= self.last_timestamp {
            return;
        }
        let dt = (timestamp_ms - self.last_timestamp) as f64;

        // Input stall: momentum must not be extrapolated across a pause.
        if dt > self.config.stall_threshold_ms {
            self.discontinuity(raw_pos, timestamp_ms);
            return;
        }

        // Teleport: a physically implausible jump resets rather than smooths.
        let displacement = raw_pos - self.smoothed_pos;
        if displacement.hypot() > self.config.teleport_threshold {
            self.discontinuity(raw_pos, timestamp_ms);
            return;
        }

        let mut raw_velocity = displacement / dt;
        let speed = raw_velocity.hypot();
        if speed > self.config.max_velocity {
            raw_velocity = raw_velocity * (self.config.max_velocity / speed);
        }

        let (position_alpha, prediction_ms) = self.adapt(speed);
        self.prediction_ms = prediction_ms;

        self.smoothed_pos = Point::new(
            self.smoothed_pos.x * (1.0 - position_alpha) + raw_pos.x * position_alpha,
            self.smoothed_pos.y * (1.0 - position_alpha) + raw_pos.y * position_alpha,
        );
        let velocity_alpha = self.config.velocity_alpha;
        self.velocity = self.velocity * (1.0 - velocity_alpha) + raw_velocity * velocity_alpha;
        self.last_timestamp = timestamp_ms;
    }

    /// Smoothing weight and prediction horizon for the given speed.
    /// Faster motion means less smoothing and a longer horizon.
    fn adapt(&self, speed: f64) -> (f64, f64) {
        let config = &self.config;
        if speed > config.speed_threshold {
            let alpha = (config.position_alpha_fast_base + speed * config.position_alpha_fast_gain)
                .min(config.position_alpha_max);
            let horizon = (config.prediction_base_ms + speed * config.prediction_gain)
                .clamp(config.min_prediction_ms, config.max_prediction_ms);
            (alpha, horizon)
        } else {
            (config.position_alpha_slow, config.min_prediction_ms)
        }
    }

    fn discontinuity(&mut self, raw_pos: Point, timestamp_ms: u64) {
        self.smoothed_pos = raw_pos;
        self.velocity = Vec2::ZERO;
        self.last_timestamp = timestamp_ms;
        self.prediction_ms = self.config.min_prediction_ms;
    }

    /// Extrapolated pen position, `prediction_ms` into the future.
    pub fn predict(&self) -> Point {
        if !self.has_prior_point {
            return Point::ZERO;
        }
        self.smoothed_pos + self.velocity * self.prediction_ms
    }

    pub fn smoothed_point(&self) -> Point {
        self.smoothed_pos
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn has_prior_point(&self) -> bool {
        self.has_prior_point
    }
}

impl Default for KineticPredictor {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predictor() -> KineticPredictor {
        KineticPredictor::default()
    }

    #[test]
    fn test_single_point() {
        let mut p = predictor();
        p.add_point(Point::new(10.0, 20.0), 100);

        // No velocity is computable from one sample; prediction is the
        // sample itself and must not blow up.
        assert_eq!(p.smoothed_point(), Point::new(10.0, 20.0));
        assert_eq!(p.predict(), Point::new(10.0, 20.0));
        assert_eq!(p.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_no_points() {
        let p = predictor();
        assert_eq!(p.predict(), Point::ZERO);
    }

    #[test]
    fn test_duplicate_timestamp_ignored() {
        let mut p = predictor();
        p.add_point(Point::new(0.0, 0.0), 100);
        p.add_point(Point::new(5.0, 0.0), 116);
        let smoothed = p.smoothed_point();
        let velocity = p.velocity();

        p.add_point(Point::new(50.0, 50.0), 116);
        assert_eq!(p.smoothed_point(), smoothed);
        assert_eq!(p.velocity(), velocity);
    }

    #[test]
    fn test_backward_timestamp_ignored() {
        let mut p = predictor();
        p.add_point(Point::new(0.0, 0.0), 100);
        p.add_point(Point::new(5.0, 0.0), 116);
        let smoothed = p.smoothed_point();

        p.add_point(Point::new(50.0, 50.0), 90);
        assert_eq!(p.smoothed_point(), smoothed);
    }

    #[test]
    fn test_stall_resets() {
        let mut p = predictor();
        p.add_point(Point::new(0.0, 0.0), 0);
        p.add_point(Point::new(10.0, 0.0), 16);
        assert!(p.velocity().hypot() > 0.0);

        // Longer than the stall threshold: state snaps to the new sample.
        p.add_point(Point::new(20.0, 5.0), 16 + 500);
        assert_eq!(p.smoothed_point(), Point::new(20.0, 5.0));
        assert_eq!(p.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_teleport_resets() {
        let mut p = predictor();
        p.add_point(Point::new(0.0, 0.0), 0);
        p.add_point(Point::new(1000.0, 1000.0), 8);

        assert_eq!(p.smoothed_point(), Point::new(1000.0, 1000.0));
        assert_eq!(p.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_velocity_clamp() {
        let config = PredictorConfig::default();
        let mut p = KineticPredictor::new(config.clone());
        p.add_point(Point::new(0.0, 0.0), 0);
        // Just under the teleport threshold in 1ms, repeatedly: raw velocity
        // far above the clamp.
        let step = config.teleport_threshold - 1.0;
        for i in 1..50 {
            p.add_point(Point::new(step * i as f64, 0.0), i);
            assert!(
                p.velocity().hypot() <= config.max_velocity + 1e-9,
                "velocity escaped the clamp at sample {i}"
            );
        }
    }

    #[test]
    fn test_prediction_leads_motion() {
        let mut p = predictor();
        // Constant rightward motion at 1 unit/ms.
        for i in 0..20u64 {
            p.add_point(Point::new(16.0 * i as f64, 0.0), 16 * i);
        }
        let predicted = p.predict();
        assert!(
            predicted.x > p.smoothed_point().x,
            "prediction should lead in the direction of motion"
        );
        assert!((predicted.y - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_horizon_capped() {
        let config = PredictorConfig::default();
        let mut p = KineticPredictor::new(config.clone());
        for i in 0..50u64 {
            p.add_point(Point::new(100.0 * i as f64, 0.0), 20 * i);
        }
        // Even at clamp speed the prediction may not exceed
        // max_velocity * max_prediction_ms ahead of the smoothed point.
        let lead = (p.predict() - p.smoothed_point()).hypot();
        assert!(lead <= config.max_velocity * config.max_prediction_ms + 1e-9);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut p = predictor();
        p.add_point(Point::new(0.0, 0.0), 0);
        p.add_point(Point::new(10.0, 10.0), 16);
        p.reset();

        assert!(!p.has_prior_point());
        assert_eq!(p.predict(), Point::ZERO);
        assert_eq!(p.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_slow_motion_smooths_heavily() {
        let config = PredictorConfig::default();
        let mut p = KineticPredictor::new(config.clone());
        p.add_point(Point::new(0.0, 0.0), 0);
        // 0.01 units/ms, well under the speed threshold.
        p.add_point(Point::new(0.16, 0.0), 16);

        // Heavy smoothing: the estimate moves only alpha_slow of the way.
        let expected = 0.16 * config.position_alpha_slow;
        assert!((p.smoothed_point().x - expected).abs() < 1e-9);
    }
}
