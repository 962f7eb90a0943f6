//! Contact classification for the lander
//!
//! One query per tick answers "did the craft touch anything, and how did it
//! go". Touchdown on a flat pad within the speed and tilt thresholds is a
//! landing; every other contact is a crash. The mothership is tested first
//! because its bay interior must suppress hull collision while the craft is
//! inside it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::lander::craft::Lander;
use crate::lander::terrain::{PadRole, Terrain};
use crate::tuning::LanderTuning;

/// Where a successful touchdown happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandingSite {
    /// A terrain pad
    Pad(PadRole),
    /// The repair pad inside the mothership bay
    MothershipPad,
}

/// Result of the per-tick contact query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// No contact
    None,
    /// Touchdown within thresholds
    SoftLanding { impact: f32, site: LandingSite },
    /// Any other contact
    Crash,
}

/// The orbital repair station
///
/// A solid hull with a landing bay recessed into the top face. The repair pad
/// sits at the bottom of the bay. While the craft is inside the bay opening
/// the hull is not solid, so the craft can descend to the pad, but grazing a
/// bay wall is a crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mothership {
    /// Hull center x
    pub x: f32,
    /// Hull top y
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub bay_width: f32,
    pub bay_depth: f32,
    pub pad_width: f32,
    /// Grazing distance to a bay wall that still counts as a wall strike
    pub wall_tolerance: f32,
}

impl Mothership {
    /// Station parked high above the terrain, horizontally centered
    pub fn new(t: &LanderTuning) -> Self {
        Self {
            x: t.view_width / 2.0,
            y: t.view_height - 10_500.0,
            width: 400.0,
            height: 200.0,
            bay_width: 160.0,
            bay_depth: 60.0,
            pad_width: 120.0,
            wall_tolerance: 5.0,
        }
    }

    pub fn bay_left(&self) -> f32 {
        self.x - self.bay_width / 2.0
    }

    pub fn bay_right(&self) -> f32 {
        self.x + self.bay_width / 2.0
    }

    /// Repair pad surface height
    pub fn pad_y(&self) -> f32 {
        self.y + self.bay_depth
    }

    pub fn pad_left(&self) -> f32 {
        self.x - self.pad_width / 2.0
    }

    pub fn pad_right(&self) -> f32 {
        self.x + self.pad_width / 2.0
    }

    fn hull_contains(&self, p: Vec2) -> bool {
        p.x >= self.x - self.width / 2.0
            && p.x <= self.x + self.width / 2.0
            && p.y >= self.y
            && p.y <= self.y + self.height
    }

    /// Contact test against the station, bay interior included
    fn check(&self, lander: &Lander, t: &LanderTuning) -> Outcome {
        let bottom = lander.bottom();
        let in_bay_span = lander.pos.x >= self.bay_left() && lander.pos.x <= self.bay_right();
        let at_ship_depth = lander.pos.y <= self.y + self.height;

        if in_bay_span && at_ship_depth && bottom >= self.y {
            // Inside the bay opening: only the pad and the walls matter
            if bottom >= self.pad_y() {
                let on_pad =
                    lander.pos.x >= self.pad_left() && lander.pos.x <= self.pad_right();
                if on_pad && within_thresholds(lander, t) {
                    return Outcome::SoftLanding {
                        impact: lander.landing_impact(t),
                        site: LandingSite::MothershipPad,
                    };
                }
                return Outcome::Crash;
            }
            let near_wall = lander.pos.x - lander.size
                <= self.bay_left() + self.wall_tolerance
                || lander.pos.x + lander.size >= self.bay_right() - self.wall_tolerance;
            if near_wall {
                return Outcome::Crash;
            }
            return Outcome::None;
        }

        // Outside the bay the hull is solid
        for p in hull_probe_points(lander) {
            if self.hull_contains(p) {
                return Outcome::Crash;
            }
        }
        Outcome::None
    }
}

fn within_thresholds(lander: &Lander, t: &LanderTuning) -> bool {
    lander.speed(t) < t.max_landing_speed && lander.tilt().abs() < t.max_landing_tilt
}

/// Craft probe points: bottom center, bottom corners, top corners
fn hull_probe_points(lander: &Lander) -> [Vec2; 5] {
    let s = lander.size;
    let p = lander.pos;
    [
        Vec2::new(p.x, p.y + s * 1.5),
        Vec2::new(p.x - s, p.y + s),
        Vec2::new(p.x + s, p.y + s),
        Vec2::new(p.x - s, p.y - s),
        Vec2::new(p.x + s, p.y - s),
    ]
}

/// Classify every contact for this tick
pub fn check(
    lander: &Lander,
    terrain: &Terrain,
    mothership: &Mothership,
    t: &LanderTuning,
) -> Outcome {
    let outcome = mothership.check(lander, t);
    if outcome != Outcome::None {
        return outcome;
    }

    // Buildings and masts are always fatal
    for s in &terrain.structures {
        for p in hull_probe_points(lander) {
            if s.contains(p, terrain.width) {
                return Outcome::Crash;
            }
        }
    }

    let left = lander.pos.x - lander.size;
    let right = lander.pos.x + lander.size;
    let bottom = lander.bottom();

    let ground = terrain
        .height_at(left)
        .min(terrain.height_at(lander.pos.x))
        .min(terrain.height_at(right));

    if bottom < ground {
        return Outcome::None;
    }

    // Touching: a landing needs a pad under the whole footprint and a level
    // surface across it
    if let Some(pad) = terrain.pad_spanning(left, right) {
        let flat = (terrain.height_at(left) - terrain.height_at(right)).abs() < 1.0;
        if flat && within_thresholds(lander, t) {
            return Outcome::SoftLanding {
                impact: lander.landing_impact(t),
                site: LandingSite::Pad(pad.role),
            };
        }
    }
    Outcome::Crash
}
