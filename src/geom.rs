//! Pure geometry utilities shared by both simulations
//!
//! Stateless functions, always defined for finite inputs. Degenerate cases
//! (zero-length segments, zero-size rects) fall back to point distances
//! instead of dividing by zero.

use glam::Vec2;

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Distance from point `p` to the segment `a`-`b`
///
/// The projection parameter is clamped to [0, 1]; a zero-length segment
/// degenerates to the distance to `a`.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Distance from point `p` to an axis-aligned rect with top-left `origin`
///
/// Zero if `p` is inside; otherwise the Euclidean distance to the nearest
/// edge or corner via clamped per-axis gaps.
pub fn point_rect_distance(p: Vec2, origin: Vec2, w: f32, h: f32) -> f32 {
    let dx = (origin.x - p.x).max(p.x - (origin.x + w)).max(0.0);
    let dy = (origin.y - p.y).max(p.y - (origin.y + h)).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

/// Whether segments `a1`-`a2` and `b1`-`b2` intersect
///
/// Parallel or degenerate segments report no intersection.
pub fn segments_intersect(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> bool {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let denom = d1.perp_dot(d2);
    if denom.abs() <= f32::EPSILON {
        return false;
    }
    let t = (b1 - a1).perp_dot(d2) / denom;
    let u = (b1 - a1).perp_dot(d1) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

/// Wrap `x` into [0, width)
#[inline]
pub fn wrap(x: f32, width: f32) -> f32 {
    x.rem_euclid(width)
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Smoothstep ease t²(3−2t), input clamped to [0, 1]
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
