//! Planar joint geometry.
//!
//! The elbow angle is the interior angle at the vertex `b` between the
//! vectors `a - b` and `c - b`, folded into [0°, 180°].

use thiserror::Error;

/// Vectors shorter than this are treated as zero length.
const MIN_SEGMENT: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    fn minus(self, other: Point2) -> (f32, f32) {
        (self.x - other.x, self.y - other.y)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("angle undefined: joint coincides with the vertex at ({x}, {y})")]
    Degenerate { x: f32, y: f32 },
    #[error("angle undefined: non-finite joint coordinate")]
    NonFinite,
}

/// Interior angle at `b` in degrees, in [0, 180].
///
/// Fails when any coordinate is NaN/infinite or when `a` or `c` sits on
/// top of `b`, since no direction exists for a zero-length segment.
pub fn elbow_angle(a: Point2, b: Point2, c: Point2) -> Result<f32, GeometryError> {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return Err(GeometryError::NonFinite);
    }

    let (ax, ay) = a.minus(b);
    let (cx, cy) = c.minus(b);
    if ax.hypot(ay) < MIN_SEGMENT || cx.hypot(cy) < MIN_SEGMENT {
        return Err(GeometryError::Degenerate { x: b.x, y: b.y });
    }

    let raw = (cy.atan2(cx) - ay.atan2(ax)).to_degrees().abs();
    let angle = if raw > 180.0 { 360.0 - raw } else { raw };

    Ok(angle.clamp(0.0, 180.0))
}
