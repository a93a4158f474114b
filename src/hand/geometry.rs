//! 2-D vector helpers used by the pose predicates.
//!
//! All functions are pure.  Degenerate input (zero-length vectors) yields
//! `None` from `angle_between` rather than NaN.

use super::landmarks::Point;

/// Vector from `a` to `b` (`b - a`).
pub fn vector(a: Point, b: Point) -> Point {
    Point {
        x: b.x - a.x,
        y: b.y - a.y,
    }
}

pub fn dot(u: Point, v: Point) -> f32 {
    u.x * v.x + u.y * v.y
}

/// Euclidean norm.  Zero for the zero vector.
pub fn magnitude(v: Point) -> f32 {
    (v.x * v.x + v.y * v.y).sqrt()
}

/// Angle between `u` and `v` in radians, in `[0, π]`.
///
/// Returns `None` when either vector has zero length, since the angle is
/// undefined there.  The cosine is clamped so that rounding on (anti)parallel
/// vectors cannot push `acos` out of its domain.
pub fn angle_between(u: Point, v: Point) -> Option<f32> {
    let mu = magnitude(u);
    let mv = magnitude(v);
    if mu == 0.0 || mv == 0.0 {
        return None;
    }
    let cos = (dot(u, v) / (mu * mv)).clamp(-1.0, 1.0);
    Some(cos.acos())
}
