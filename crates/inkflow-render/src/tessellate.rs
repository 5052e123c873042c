//! Stroke tessellation.
//!
//! Converts point sequences into triangle-strip ribbons: one vertex pair
//! per point, offset along the local path normal by half the stroke width.
//! Pure functions of their input; safe to run on the worker thread.

use crate::vertex::Vertex;
use inkflow_core::input::RawSample;
use kurbo::{Point, Vec2};

/// Alpha at the phantom strip's anchor (the last real sample). The tip at
/// the predicted point fades to zero: confidence decreases with distance
/// into the future.
const PHANTOM_BASE_ALPHA: f32 = 0.5;

/// Builds ribbon geometry for one stroke style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeGeometryBuilder {
    pub width: f64,
    pub color: [f32; 4],
}

impl StrokeGeometryBuilder {
    pub fn new(width: f64, color: [f32; 4]) -> Self {
        Self { width, color }
    }

    pub fn from_color(width: f64, color: peniko::Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(
            width,
            [
                f32::from(rgba.r) / 255.0,
                f32::from(rgba.g) / 255.0,
                f32::from(rgba.b) / 255.0,
                f32::from(rgba.a) / 255.0,
            ],
        )
    }

    /// Tessellate committed points at uniform full pressure.
    ///
    /// Output order matches input order; consecutive vertex pairs form a
    /// continuous `TRIANGLE_STRIP` band.
    pub fn build_ribbon(&self, points: &[Point]) -> Vec<Vertex> {
        self.ribbon(points, |_| 1.0)
    }

    /// Tessellate raw samples, scaling width linearly with pressure.
    pub fn build_ribbon_pressured(&self, samples: &[RawSample]) -> Vec<Vertex> {
        let points: Vec<Point> = samples.iter().map(|sample| sample.pos).collect();
        self.ribbon(&points, |i| samples[i].pressure)
    }

    /// Translucent preview strip from the last real sample toward the
    /// predicted pen position. A handful of vertices, rebuilt every frame.
    pub fn build_phantom(&self, anchor: Point, predicted: Point) -> Vec<Vertex> {
        let direction = predicted - anchor;
        let half = self.width / 2.0;
        let normal = if direction.hypot() < f64::EPSILON {
            Vec2::new(0.0, 1.0)
        } else {
            perp(direction / direction.hypot())
        };

        vec![
            Vertex::with_alpha(anchor + normal * half, self.color, PHANTOM_BASE_ALPHA),
            Vertex::with_alpha(anchor - normal * half, self.color, PHANTOM_BASE_ALPHA),
            Vertex::with_alpha(predicted, self.color, 0.0),
        ]
    }

    fn ribbon(&self, points: &[Point], pressure: impl Fn(usize) -> f64) -> Vec<Vertex> {
        match points {
            [] => Vec::new(),
            [point] => self.dot(*point, pressure(0)),
            _ => {
                let mut vertices = Vec::with_capacity(points.len() * 2);
                // Falls back to a horizontal band when a direction is
                // degenerate (coincident neighbors).
                let mut normal = Vec2::new(0.0, 1.0);
                for (i, point) in points.iter().enumerate() {
                    if let Some(n) = local_normal(points, i) {
                        normal = n;
                    }
                    let half = self.width / 2.0 * pressure(i).clamp(0.0, 1.0);
                    vertices.push(Vertex::new(*point + normal * half, self.color));
                    vertices.push(Vertex::new(*point - normal * half, self.color));
                }
                vertices
            }
        }
    }

    /// A single point becomes a minimal quad so taps stay visible.
    fn dot(&self, point: Point, pressure: f64) -> Vec<Vertex> {
        let half = (self.width / 2.0 * pressure.clamp(0.0, 1.0)).max(0.5);
        vec![
            Vertex::new(point + Vec2::new(-half, -half), self.color),
            Vertex::new(point + Vec2::new(-half, half), self.color),
            Vertex::new(point + Vec2::new(half, -half), self.color),
            Vertex::new(point + Vec2::new(half, half), self.color),
        ]
    }
}

/// Unit normal at `points[i]` from the central-difference direction, or
/// `None` when the neighborhood is degenerate.
fn local_normal(points: &[Point], i: usize) -> Option<Vec2> {
    let prev = points[i.saturating_sub(1)];
    let next = points[(i + 1).min(points.len() - 1)];
    let direction = next - prev;
    let len = direction.hypot();
    (len >= f64::EPSILON).then(|| perp(direction / len))
}

fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}
