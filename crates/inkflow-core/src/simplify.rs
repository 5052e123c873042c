//! Ramer-Douglas-Peucker path simplification.
//!
//! Reduces a dense raw point sequence to a minimal subset preserving shape
//! within a perpendicular-distance tolerance. Runs once at stroke
//! completion, never on the per-sample hot path.

use kurbo::Point;

/// Simplify `points` to the subset whose removal never moves the polyline
/// more than `tolerance` away from any original point.
///
/// Sequences of fewer than 3 points are returned unchanged. The result is a
/// deterministic function of the input and tolerance.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    // Find the point of maximum deviation from the chord.
    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        // Keep the deviating point and recurse on both halves.
        let mut left = simplify(&points[..=max_index], tolerance);
        let right = simplify(&points[max_index..], tolerance);

        // The halves share the point at max_index.
        left.pop();
        left.extend(right);
        left
    } else {
        // Every intermediate point lies within tolerance of the chord.
        vec![first, last]
    }
}

/// Perpendicular distance from `point` to the line through `line_start` and
/// `line_end`. A zero-length chord falls back to the Euclidean distance to
/// `line_start`.
fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;

    let line_len_sq = dx * dx + dy * dy;
    if line_len_sq < f64::EPSILON {
        return point.distance(line_start);
    }

    // Twice the triangle area over the base length is the height.
    let area2 = ((point.x - line_start.x) * dy - (point.y - line_start.y) * dx).abs();
    area2 / line_len_sq.sqrt()
}
