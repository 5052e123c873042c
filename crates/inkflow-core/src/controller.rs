//! Stroke input state machine.
//!
//! Receives raw pointer events, drives the predictor, buffers raw samples,
//! and turns each completed stroke into a simplified vector [`Stroke`].
//! Geometry production and drawing live behind the render crate; this
//! module owns only input-side state.

use crate::config::{InkConfig, ToolConfig};
use crate::input::{PointerEvent, RawSample};
use crate::page::PageLayout;
use crate::predictor::KineticPredictor;
use crate::simplify::simplify;
use crate::stroke::Stroke;
use kurbo::Point;

/// Stroke lifecycle. Linear: one contact point, no nested states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokePhase {
    #[default]
    Idle,
    Drawing,
}

/// Orchestrates one pen contact at a time: `Idle -> Drawing -> Idle`.
///
/// The controller owns its configuration and the predictor; nothing here
/// reads global state. Callers receive the committed [`Stroke`] from
/// [`pointer_up`](Self::pointer_up); that return value is the
/// "content modified" signal for the persistence collaborator.
#[derive(Debug, Clone)]
pub struct StrokeInputController {
    config: InkConfig,
    tool: ToolConfig,
    layout: PageLayout,
    predictor: KineticPredictor,
    raw: Vec<RawSample>,
    phase: StrokePhase,
    page_index: usize,
    generation: u64,
}

impl StrokeInputController {
    pub fn new(config: InkConfig, layout: PageLayout) -> Self {
        let predictor = KineticPredictor::new(config.predictor.clone());
        Self {
            config,
            tool: ToolConfig::default(),
            layout,
            predictor,
            raw: Vec::new(),
            phase: StrokePhase::Idle,
            page_index: 0,
            generation: 0,
        }
    }

    /// Dispatch a pointer event. Returns the committed stroke on `Up`.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> Option<Stroke> {
        match event {
            PointerEvent::Down {
                pos,
                timestamp_ms,
                pressure,
            } => {
                self.pointer_down(pos, timestamp_ms, pressure);
                None
            }
            PointerEvent::Move {
                pos,
                timestamp_ms,
                pressure,
            } => {
                self.pointer_move(pos, timestamp_ms, pressure);
                None
            }
            PointerEvent::Up { pos, timestamp_ms } => self.pointer_up(pos, timestamp_ms),
            PointerEvent::Cancel => {
                self.cancel();
                None
            }
        }
    }

    /// Begin a stroke. Returns `false` (and stays `Idle`) when the press
    /// lands outside every page: a normal no-op, not an error.
    pub fn pointer_down(&mut self, pos: Point, timestamp_ms: u64, pressure: f64) -> bool {
        if self.phase == StrokePhase::Drawing {
            // A second contact while drawing is a device anomaly; the first
            // stroke wins.
            return false;
        }
        let Some(page_index) = self.layout.page_at(pos) else {
            log::debug!("press at {pos:?} is outside every page, ignoring");
            return false;
        };

        self.predictor.reset();
        self.predictor.add_point(pos, timestamp_ms);
        self.raw.clear();
        self.raw.push(RawSample::new(pos, timestamp_ms, pressure));
        self.page_index = page_index;
        self.generation += 1;
        self.phase = StrokePhase::Drawing;
        true
    }

    /// Feed a move sample. Returns `true` when the sample was kept in the
    /// raw buffer (callers re-tessellate the active layer on `true`).
    pub fn pointer_move(&mut self, pos: Point, timestamp_ms: u64, pressure: f64) -> bool {
        if self.phase != StrokePhase::Drawing {
            return false;
        }
        // The predictor sees every sample; its own guards absorb anomalies.
        self.predictor.add_point(pos, timestamp_ms);
        self.push_filtered(RawSample::new(pos, timestamp_ms, pressure))
    }

    /// Finish the stroke: simplify the raw buffer and commit.
    ///
    /// A single-sample stroke (tap) still commits as a dot.
    pub fn pointer_up(&mut self, pos: Point, timestamp_ms: u64) -> Option<Stroke> {
        if self.phase != StrokePhase::Drawing {
            return None;
        }
        self.push_filtered(RawSample::new(pos, timestamp_ms, 1.0));

        let raw_points: Vec<Point> = self.raw.iter().map(|sample| sample.pos).collect();
        let points = simplify(&raw_points, self.config.simplify_tolerance);
        log::debug!(
            "stroke committed: {} raw samples -> {} points",
            raw_points.len(),
            points.len()
        );

        self.finish();
        Some(Stroke {
            points,
            width: self.tool.width,
            color: self.tool.color,
            is_eraser: self.tool.is_eraser(),
            page_index: self.page_index,
        })
    }

    /// Abort the in-progress stroke without committing anything.
    pub fn cancel(&mut self) {
        if self.phase == StrokePhase::Drawing {
            log::debug!("stroke cancelled, {} raw samples discarded", self.raw.len());
        }
        self.finish();
    }

    fn finish(&mut self) {
        self.phase = StrokePhase::Idle;
        self.raw.clear();
        self.predictor.reset();
        // Any in-flight worker result for the old stroke is now stale.
        self.generation += 1;
    }

    /// Append to the raw buffer unless within the minimum spacing of the
    /// last kept sample. Bounds buffer growth on high-rate devices.
    fn push_filtered(&mut self, sample: RawSample) -> bool {
        if let Some(last) = self.raw.last() {
            if last.pos.distance(sample.pos) < self.config.min_sample_spacing {
                return false;
            }
        }
        self.raw.push(sample);
        true
    }

    pub fn is_drawing(&self) -> bool {
        self.phase == StrokePhase::Drawing
    }

    pub fn phase(&self) -> StrokePhase {
        self.phase
    }

    /// Raw samples of the in-progress stroke, in arrival order.
    pub fn raw_samples(&self) -> &[RawSample] {
        &self.raw
    }

    /// Predicted pen position for the phantom overlay; `None` while idle.
    pub fn predicted_point(&self) -> Option<Point> {
        self.is_drawing().then(|| self.predictor.predict())
    }

    /// Smoothed pen position (the phantom overlay's anchor); `None` while
    /// idle.
    pub fn smoothed_point(&self) -> Option<Point> {
        self.is_drawing().then(|| self.predictor.smoothed_point())
    }

    /// Monotonic stroke generation, bumped on every lifecycle transition.
    /// Consumers stamp async work with it and discard mismatched results.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tool(&self) -> &ToolConfig {
        &self.tool
    }

    /// Switching tools mid-stroke applies to the next stroke; the current
    /// one keeps the style it started with.
    pub fn set_tool(&mut self, tool: ToolConfig) {
        if self.is_drawing() {
            log::debug!("tool change during a stroke takes effect on the next stroke");
        }
        self.tool = tool;
    }

    pub fn config(&self) -> &InkConfig {
        &self.config
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut PageLayout {
        &mut self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{PAGE_GAP, PAGE_HEIGHT};

    fn controller() -> StrokeInputController {
        StrokeInputController::new(InkConfig::default(), PageLayout::infinite())
    }

    #[test]
    fn test_down_move_up() {
        let mut c = controller();
        assert!(c.pointer_down(Point::new(0.0, 0.0), 0, 1.0));
        assert!(c.is_drawing());

        assert!(c.pointer_move(Point::new(10.0, 0.0), 16, 1.0));
        let stroke = c.pointer_up(Point::new(20.0, 0.0), 32).unwrap();

        assert!(!c.is_drawing());
        assert_eq!(stroke.points.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(stroke.points.last(), Some(&Point::new(20.0, 0.0)));
        assert_eq!(stroke.page_index, 0);
    }

    #[test]
    fn test_off_page_press_rejected() {
        let mut c = StrokeInputController::new(InkConfig::default(), PageLayout::paginated(1));
        let gap = Point::new(10.0, PAGE_HEIGHT + PAGE_GAP / 2.0);

        assert!(!c.pointer_down(gap, 0, 1.0));
        assert!(!c.is_drawing());
        // Moves and releases without a stroke are no-ops.
        assert!(!c.pointer_move(Point::new(10.0, 10.0), 16, 1.0));
        assert!(c.pointer_up(Point::new(10.0, 10.0), 32).is_none());
    }

    #[test]
    fn test_second_page_index() {
        let mut c = StrokeInputController::new(InkConfig::default(), PageLayout::paginated(2));
        let on_second = Point::new(10.0, PAGE_HEIGHT + PAGE_GAP + 10.0);

        assert!(c.pointer_down(on_second, 0, 1.0));
        let stroke = c.pointer_up(on_second + kurbo::Vec2::new(30.0, 0.0), 16).unwrap();
        assert_eq!(stroke.page_index, 1);
    }

    #[test]
    fn test_min_spacing_filter() {
        let mut c = controller();
        c.pointer_down(Point::new(0.0, 0.0), 0, 1.0);

        // Sub-spacing jitter is dropped from the raw buffer...
        assert!(!c.pointer_move(Point::new(0.3, 0.0), 8, 1.0));
        assert!(!c.pointer_move(Point::new(0.6, 0.0), 16, 1.0));
        assert_eq!(c.raw_samples().len(), 1);

        // ...but real movement is kept.
        assert!(c.pointer_move(Point::new(5.0, 0.0), 24, 1.0));
        assert_eq!(c.raw_samples().len(), 2);
    }

    #[test]
    fn test_cancel_discards() {
        let mut c = controller();
        c.pointer_down(Point::new(0.0, 0.0), 0, 1.0);
        c.pointer_move(Point::new(30.0, 0.0), 16, 1.0);
        c.cancel();

        assert!(!c.is_drawing());
        assert!(c.raw_samples().is_empty());
        // No late commit is possible.
        assert!(c.pointer_up(Point::new(40.0, 0.0), 32).is_none());
    }

    #[test]
    fn test_tap_commits_dot() {
        let mut c = controller();
        c.pointer_down(Point::new(7.0, 9.0), 0, 1.0);
        let stroke = c.pointer_up(Point::new(7.0, 9.0), 10).unwrap();

        assert!(stroke.is_dot());
        assert_eq!(stroke.points, vec![Point::new(7.0, 9.0)]);
    }

    #[test]
    fn test_generation_bumps() {
        let mut c = controller();
        let g0 = c.generation();
        c.pointer_down(Point::new(0.0, 0.0), 0, 1.0);
        let g1 = c.generation();
        assert_ne!(g0, g1);

        c.cancel();
        assert_ne!(c.generation(), g1);

        c.pointer_down(Point::new(0.0, 0.0), 100, 1.0);
        let g2 = c.generation();
        c.pointer_up(Point::new(10.0, 0.0), 116);
        assert_ne!(c.generation(), g2);
    }

    #[test]
    fn test_predictor_reset_between_strokes() {
        let mut c = controller();
        c.pointer_down(Point::new(0.0, 0.0), 0, 1.0);
        for i in 1..10u64 {
            c.pointer_move(Point::new(20.0 * i as f64, 0.0), 16 * i, 1.0);
        }
        c.pointer_up(Point::new(200.0, 0.0), 160);

        // A new stroke must not inherit the previous stroke's momentum.
        c.pointer_down(Point::new(500.0, 500.0), 2000, 1.0);
        assert_eq!(c.predicted_point(), Some(Point::new(500.0, 500.0)));
    }

    #[test]
    fn test_phantom_only_while_drawing() {
        let mut c = controller();
        assert_eq!(c.predicted_point(), None);
        c.pointer_down(Point::new(1.0, 2.0), 0, 1.0);
        assert!(c.predicted_point().is_some());
        c.pointer_up(Point::new(1.0, 2.0), 16);
        assert_eq!(c.predicted_point(), None);
    }

    #[test]
    fn test_down_while_drawing_ignored() {
        let mut c = controller();
        assert!(c.pointer_down(Point::new(0.0, 0.0), 0, 1.0));
        assert!(!c.pointer_down(Point::new(50.0, 50.0), 8, 1.0));
        assert_eq!(c.raw_samples().len(), 1);
    }

    #[test]
    fn test_eraser_flag_carried() {
        let mut c = controller();
        c.set_tool(ToolConfig::eraser(20.0));
        c.pointer_down(Point::new(0.0, 0.0), 0, 1.0);
        let stroke = c.pointer_up(Point::new(10.0, 0.0), 16).unwrap();
        assert!(stroke.is_eraser);
        assert_eq!(stroke.width, 20.0);
    }
}
