//! Wrap-aware combat collision tests
//!
//! The field is a torus, so every distance test runs on the shortest wrapped
//! delta per axis. Fast movers (lasers) are tested as swept segments from
//! their previous position so they cannot tunnel through a body between
//! ticks.

use glam::Vec2;

use crate::combat::state::{Asteroid, Durability};
use crate::geom::point_segment_distance;
use crate::tuning::CombatTuning;

/// Shortest signed delta from `a` to `b` on a wrapped axis
fn wrapped_delta(a: f32, b: f32, extent: f32) -> f32 {
    let mut d = b - a;
    if d > extent / 2.0 {
        d -= extent;
    } else if d < -extent / 2.0 {
        d += extent;
    }
    d
}

/// Shortest vector from `a` to `b` on the torus
pub fn wrapped_offset(a: Vec2, b: Vec2, t: &CombatTuning) -> Vec2 {
    Vec2::new(
        wrapped_delta(a.x, b.x, t.field_width),
        wrapped_delta(a.y, b.y, t.field_height),
    )
}

/// Wrapped distance between two points
pub fn wrapped_distance(a: Vec2, b: Vec2, t: &CombatTuning) -> f32 {
    wrapped_offset(a, b, t).length()
}

/// Circle overlap on the torus
pub fn circles_touch(a: Vec2, ra: f32, b: Vec2, rb: f32, t: &CombatTuning) -> bool {
    wrapped_distance(a, b, t) <= ra + rb
}

/// Whether the swept segment `from`-`to` passes within `radius` of `center`
///
/// The segment is shifted into the frame nearest the circle before the
/// distance test so wrap seams do not split it.
pub fn swept_hit(from: Vec2, to: Vec2, center: Vec2, radius: f32, t: &CombatTuning) -> bool {
    let offset = wrapped_offset(center, from, t);
    let shifted_from = center + offset;
    // The motion is taken as a wrapped delta too: on the tick a projectile
    // crosses a field edge its endpoints sit on opposite sides, and the raw
    // difference would sweep almost the whole field
    let shifted_to = shifted_from + wrapped_offset(from, to, t);
    point_segment_distance(center, shifted_from, shifted_to) <= radius
}

/// Result of a laser strike on an asteroid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Durable body absorbed the hit
    Hit { id: u32 },
    /// Body destroyed this tick
    Destroyed { id: u32 },
}

/// Apply one laser hit, decrementing durable health
pub fn damage_asteroid(asteroid: &mut Asteroid) -> HitOutcome {
    match asteroid.durability {
        Durability::Simple => HitOutcome::Destroyed { id: asteroid.id },
        Durability::Durable { health } if health <= 1 => HitOutcome::Destroyed { id: asteroid.id },
        Durability::Durable { health } => {
            asteroid.durability = Durability::Durable { health: health - 1 };
            HitOutcome::Hit { id: asteroid.id }
        }
    }
}
