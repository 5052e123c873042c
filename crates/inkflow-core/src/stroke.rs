//! Vector stroke model.

use kurbo::{BezPath, Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    /// `#rrggbb`, or `#rrggbbaa` when translucent.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Anything else is black.
    pub fn from_hex(hex: &str) -> Self {
        let Some(hex) = hex.strip_prefix('#') else {
            return Self::black();
        };
        let byte = |range| u8::from_str_radix(hex.get(range).unwrap_or("0"), 16).unwrap_or(0);
        match hex.len() {
            3 => {
                let nibble = |i| byte(i..i + 1) * 17;
                Self::new(nibble(0), nibble(1), nibble(2), 255)
            }
            6 => Self::new(byte(0..2), byte(2..4), byte(4..6), 255),
            8 => Self::new(byte(0..2), byte(2..4), byte(4..6), byte(6..8)),
            _ => Self::black(),
        }
    }

    /// Normalized RGBA for per-vertex color attributes.
    pub fn to_f32_array(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

impl From<Color> for Rgba8 {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<Rgba8> for Color {
    fn from(color: Rgba8) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// A committed, simplified vector stroke.
///
/// Created at pointer-release from the simplified raw buffer; immutable
/// afterwards. The render path is derived from the points on demand and
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Ordered points after simplification.
    pub points: Vec<Point>,
    pub width: f64,
    pub color: Rgba8,
    /// Eraser strokes are rendered in the background color.
    pub is_eraser: bool,
    /// Index of the page this stroke belongs to.
    pub page_index: usize,
}

impl Stroke {
    /// Reconstruct the render path: a move to the first point, lines to the
    /// rest.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some((first, rest)) = self.points.split_first() {
            path.move_to(*first);
            for point in rest {
                path.line_to(*point);
            }
        }
        path
    }

    /// Axis-aligned bounds of the point set, ignoring stroke width.
    pub fn bounds(&self) -> Rect {
        let Some((first, rest)) = self.points.split_first() else {
            return Rect::ZERO;
        };
        let mut rect = Rect::from_points(*first, *first);
        for point in rest {
            rect = rect.union_pt(*point);
        }
        rect
    }

    /// A tap with no drag commits as a single-point dot.
    pub fn is_dot(&self) -> bool {
        self.points.len() < 2
    }

    /// Translucent strokes (highlighter marks) sit beneath opaque ink.
    pub fn is_translucent(&self) -> bool {
        self.color.a < 255
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(points: Vec<Point>) -> Stroke {
        Stroke {
            points,
            width: 3.0,
            color: Rgba8::black(),
            is_eraser: false,
            page_index: 0,
        }
    }

    #[test]
    fn test_hex_roundtrip() {
        let opaque = Rgba8::new(0x12, 0xab, 0xff, 255);
        assert_eq!(opaque.to_hex(), "#12abff");
        assert_eq!(Rgba8::from_hex("#12abff"), opaque);

        let translucent = Rgba8::new(255, 230, 0, 128);
        assert_eq!(translucent.to_hex(), "#ffe60080");
        assert_eq!(Rgba8::from_hex("#ffe60080"), translucent);
    }

    #[test]
    fn test_hex_short_and_invalid() {
        assert_eq!(Rgba8::from_hex("#fff"), Rgba8::white());
        assert_eq!(Rgba8::from_hex("not-a-color"), Rgba8::black());
        assert_eq!(Rgba8::from_hex("#12345"), Rgba8::black());
    }

    #[test]
    fn test_to_path() {
        let s = stroke(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]);
        assert_eq!(s.to_path().elements().len(), 3);
        assert!(stroke(Vec::new()).to_path().elements().is_empty());
    }

    #[test]
    fn test_bounds() {
        let s = stroke(vec![
            Point::new(-5.0, 2.0),
            Point::new(10.0, 0.0),
            Point::new(3.0, 20.0),
        ]);
        assert_eq!(s.bounds(), Rect::new(-5.0, 0.0, 10.0, 20.0));
    }

    #[test]
    fn test_dot() {
        assert!(stroke(vec![Point::new(1.0, 1.0)]).is_dot());
        assert!(!stroke(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).is_dot());
    }
}
