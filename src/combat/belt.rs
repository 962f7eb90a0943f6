//! Level generation
//!
//! Each level gets a freshly generated asteroid belt. Placement keeps a
//! clear zone around the ship spawn with a bounded retry budget per body;
//! when the budget runs out the body takes a deterministic fallback slot
//! instead of looping forever. A belt that somehow ends up empty is an
//! error, not a silently cleared level.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::combat::state::{Asteroid, BlackHole, Durability, LaserGrid, SpecialLevel};
use crate::tuning::CombatTuning;

/// Clear radius around the ship spawn no asteroid may start inside
const SAFE_SPAWN_RADIUS: f32 = 200.0;

/// Velocity factor for the monster asteroid
const MONSTER_SPEED_FACTOR: f32 = 0.15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementFailure {
    #[error("generated belt contains no asteroids")]
    EmptyBelt,
}

/// A generated level layout
#[derive(Debug, Clone)]
pub struct Belt {
    pub asteroids: Vec<Asteroid>,
    pub special: Option<SpecialLevel>,
    pub black_hole: Option<BlackHole>,
    pub laser_grid: Option<LaserGrid>,
}

/// Build one asteroid with a random outline, drift, and spin
pub fn new_asteroid(
    rng: &mut Pcg32,
    id: u32,
    pos: Vec2,
    radius: f32,
    speed: f32,
    durability: Durability,
    t: &CombatTuning,
) -> Asteroid {
    let dir = rng.random::<f32>() * std::f32::consts::TAU;
    let vertices = t.asteroid_vertices + rng.random_range(0..5);
    let offsets = (0..vertices)
        .map(|_| 0.7 + rng.random::<f32>() * 0.6)
        .collect();
    Asteroid {
        id,
        pos,
        prev_pos: pos,
        vel: Vec2::new(dir.cos(), dir.sin()) * speed,
        radius,
        angle: rng.random::<f32>() * std::f32::consts::TAU,
        spin: (rng.random::<f32>() - 0.5) * 2.0,
        offsets,
        durability,
    }
}

/// Pick a spot outside the ship's clear zone, falling back to a fixed corner
/// slot after the retry budget is spent
fn place_body(rng: &mut Pcg32, ship_pos: Vec2, radius: f32, t: &CombatTuning) -> Vec2 {
    for _ in 0..t.max_spawn_attempts {
        let candidate = Vec2::new(
            rng.random::<f32>() * t.field_width,
            rng.random::<f32>() * t.field_height,
        );
        if candidate.distance(ship_pos) >= SAFE_SPAWN_RADIUS + radius {
            return candidate;
        }
    }
    log::warn!("asteroid placement retries exhausted, using fallback slot");
    Vec2::new(radius, radius)
}

/// Number of regular asteroids for a level
fn asteroid_count(level: u32) -> u32 {
    3 + level
}

/// Which hazard a special level carries
fn pick_special(rng: &mut Pcg32) -> SpecialLevel {
    match rng.random_range(0..3u32) {
        0 => SpecialLevel::Monster,
        1 => SpecialLevel::BlackHole,
        _ => SpecialLevel::LaserGrid,
    }
}

/// Generate the belt for `level`, keeping the area around `ship_pos` clear
pub fn generate(
    rng: &mut Pcg32,
    level: u32,
    ship_pos: Vec2,
    next_id: &mut impl FnMut() -> u32,
    t: &CombatTuning,
) -> Result<Belt, PlacementFailure> {
    let special = (t.special_level_interval > 0
        && level % t.special_level_interval == 0)
        .then(|| pick_special(rng));

    let mut asteroids = Vec::new();
    let mut black_hole = None;
    let mut laser_grid = None;

    let mut count = asteroid_count(level);
    match special {
        Some(SpecialLevel::Monster) => {
            // The monster replaces part of the belt
            count = count.saturating_sub(2).max(1);
            let radius = t.monster_size();
            let pos = place_body(rng, ship_pos, radius, t);
            asteroids.push(new_asteroid(
                rng,
                next_id(),
                pos,
                radius,
                t.asteroid_speed * MONSTER_SPEED_FACTOR,
                Durability::Durable {
                    health: t.monster_health,
                },
                t,
            ));
        }
        Some(SpecialLevel::BlackHole) => {
            black_hole = Some(BlackHole {
                pos: place_body(rng, ship_pos, t.black_hole_radius, t),
                radius: t.black_hole_radius,
                pull_radius: t.black_hole_pull_radius,
            });
        }
        Some(SpecialLevel::LaserGrid) => {
            laser_grid = Some(LaserGrid {
                angle: 0.0,
                beams: t.laser_grid_beams,
            });
        }
        None => {}
    }

    let radius = t.asteroid_size / 2.0;
    for _ in 0..count {
        let pos = place_body(rng, ship_pos, radius, t);
        asteroids.push(new_asteroid(
            rng,
            next_id(),
            pos,
            radius,
            t.asteroid_speed,
            Durability::Simple,
            t,
        ));
    }

    if asteroids.is_empty() {
        return Err(PlacementFailure::EmptyBelt);
    }
    log::info!(
        "level {level}: {} asteroids, special {:?}",
        asteroids.len(),
        special
    );
    Ok(Belt {
        asteroids,
        special,
        black_hole,
        laser_grid,
    })
}
