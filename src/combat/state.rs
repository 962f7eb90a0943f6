//! Combat entities and session state
//!
//! Entities are plain data; behavior lives in `tick.rs`. Every entity that
//! the renderer interpolates carries its previous-tick pose.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::runtime::DeferredQueue;
use crate::tuning::CombatTuning;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatPhase {
    Welcome,
    Playing,
    /// Ship destroyed, explosion animation running
    Exploding,
    GameOver,
}

/// Player intent for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatInput {
    pub thrust: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    /// Edge-triggered fire press
    pub fire: bool,
    pub start: bool,
    pub pause: bool,
}

/// Ship system degraded for the current level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalfunctionKind {
    /// Main engine at half thrust
    Engine,
    /// Steering at a third of normal turn rate
    Steering,
    /// Laser magazine halved
    Weapons,
}

/// Collectible power-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    RearLaser,
    SpreadShot,
    Shield,
    /// Immediate radial volley
    LaserBurst,
}

/// What a drifting token grants on pickup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    Bitcoin { reward: u64 },
    PowerUp(PowerUpKind),
    /// Spare life
    Repair,
}

/// A collectible drifting across the field
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Token {
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: TokenKind,
    pub ticks_left: u32,
}

/// Whether a body dies to one hit or soaks several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Durability {
    Simple,
    Durable { health: u32 },
}

/// An asteroid, irregular polygon around a circle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub id: u32,
    pub pos: Vec2,
    pub prev_pos: Vec2,
    /// Pixels per second
    pub vel: Vec2,
    pub radius: f32,
    pub angle: f32,
    /// Radians per second
    pub spin: f32,
    /// Per-vertex radius multipliers for the irregular outline
    pub offsets: Vec<f32>,
    pub durability: Durability,
}

impl Asteroid {
    /// Collision radius: the outline's average vertex distance
    pub fn hit_radius(&self) -> f32 {
        if self.offsets.is_empty() {
            return self.radius;
        }
        let avg: f32 = self.offsets.iter().sum::<f32>() / self.offsets.len() as f32;
        self.radius * avg
    }
}

/// A player laser bolt with its previous position for swept tests
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Laser {
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub vel: Vec2,
    /// Distance flown so far; despawns at the range limit
    pub traveled: f32,
}

/// The hostile saucer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemyShip {
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub shoot_timer: u32,
}

/// A bolt fired by the enemy, swept like player lasers
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemyLaser {
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub traveled: f32,
}

/// Special level hazard layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialLevel {
    /// One huge durable asteroid
    Monster,
    /// A gravity well pulling everything in
    BlackHole,
    /// Rotating lethal beams from the field center
    LaserGrid,
}

/// Gravity well hazard
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlackHole {
    pub pos: Vec2,
    /// Lethal core radius
    pub radius: f32,
    pub pull_radius: f32,
}

/// Rotating beam hazard anchored at the field center
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LaserGrid {
    pub angle: f32,
    pub beams: u32,
}

/// The player ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub pos: Vec2,
    pub prev_pos: Vec2,
    /// Pixels per second
    pub vel: Vec2,
    /// Heading in [0, 2π), 0 pointing up
    pub angle: f32,
    pub prev_angle: f32,
    /// Invincibility after respawn (ticks)
    pub protection_ticks: u32,
    pub shield_ticks: u32,
    pub rear_laser_ticks: u32,
    pub spread_ticks: u32,
}

impl Ship {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            angle: 0.0,
            prev_angle: 0.0,
            protection_ticks: 0,
            shield_ticks: 0,
            rear_laser_ticks: 0,
            spread_ticks: 0,
        }
    }

    /// Unit vector the nose points along
    pub fn heading(&self) -> Vec2 {
        Vec2::new(self.angle.sin(), -self.angle.cos())
    }

    /// Whether lethal contact is currently ignored
    pub fn invulnerable(&self) -> bool {
        self.protection_ticks > 0 || self.shield_ticks > 0
    }
}

/// Things that happened this tick
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    Started,
    LevelStarted { level: u32, special: Option<SpecialLevel> },
    LevelCleared { level: u32 },
    MalfunctionRolled(MalfunctionKind),
    LaserFired,
    AsteroidHit { id: u32 },
    AsteroidDestroyed { id: u32, score: u64 },
    EnemySpawned,
    EnemyFired,
    EnemyDestroyed { score: u64 },
    TokenSpawned(TokenKind),
    TokenCollected(TokenKind),
    PowerUpExpired(PowerUpKind),
    ShipExploded,
    Respawned,
    GameOver { score: u64 },
    Paused(bool),
}

/// Effects waiting for a future tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatDeferred {
    SpawnEnemy,
}

/// The complete combat simulation
#[derive(Debug, Clone)]
pub struct CombatSession {
    pub tuning: CombatTuning,
    pub seed: u64,
    pub tick: u64,
    pub phase: CombatPhase,
    pub paused: bool,

    pub level: u32,
    pub lives: u32,
    pub score: u64,
    pub special: Option<SpecialLevel>,
    pub malfunctions: Vec<MalfunctionKind>,

    pub ship: Ship,
    pub asteroids: Vec<Asteroid>,
    pub lasers: Vec<Laser>,
    pub enemy: Option<EnemyShip>,
    pub enemy_lasers: Vec<EnemyLaser>,
    pub tokens: Vec<Token>,
    pub black_hole: Option<BlackHole>,
    pub laser_grid: Option<LaserGrid>,

    pub(crate) rng: Pcg32,
    pub(crate) next_asteroid_id: u32,
    pub(crate) explode_ticks_left: u32,
    pub(crate) deferred: DeferredQueue<CombatDeferred>,
    pub(crate) events: Vec<CombatEvent>,
}

impl CombatSession {
    pub fn new(seed: u64, tuning: CombatTuning) -> Self {
        let center = Vec2::new(tuning.field_width / 2.0, tuning.field_height / 2.0);
        Self {
            lives: tuning.lives,
            tuning,
            seed,
            tick: 0,
            phase: CombatPhase::Welcome,
            paused: false,
            level: 0,
            score: 0,
            special: None,
            malfunctions: Vec::new(),
            ship: Ship::new(center),
            asteroids: Vec::new(),
            lasers: Vec::new(),
            enemy: None,
            enemy_lasers: Vec::new(),
            tokens: Vec::new(),
            black_hole: None,
            laser_grid: None,
            rng: Pcg32::seed_from_u64(seed),
            next_asteroid_id: 0,
            explode_ticks_left: 0,
            deferred: DeferredQueue::new(),
            events: Vec::new(),
        }
    }

    pub fn field_center(&self) -> Vec2 {
        Vec2::new(self.tuning.field_width / 2.0, self.tuning.field_height / 2.0)
    }

    pub(crate) fn alloc_asteroid_id(&mut self) -> u32 {
        let id = self.next_asteroid_id;
        self.next_asteroid_id += 1;
        id
    }

    /// Drain events emitted since the last call
    pub fn take_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Interpolated presentation state
    pub fn snapshot(&self, alpha: f32) -> CombatSnapshot {
        let alpha = alpha.clamp(0.0, 1.0);
        let delta = crate::signed_tilt(self.ship.angle - self.ship.prev_angle);
        CombatSnapshot {
            phase: self.phase,
            paused: self.paused,
            tick: self.tick,
            level: self.level,
            lives: self.lives,
            score: self.score,
            special: self.special,
            malfunctions: self.malfunctions.clone(),
            ship_pos: self.ship.prev_pos.lerp(self.ship.pos, alpha),
            ship_angle: crate::normalize_angle(self.ship.prev_angle + delta * alpha),
            ship_protected: self.ship.invulnerable(),
            asteroids: self
                .asteroids
                .iter()
                .map(|a| (a.prev_pos.lerp(a.pos, alpha), a.radius, a.angle))
                .collect(),
            lasers: self
                .lasers
                .iter()
                .map(|l| l.prev_pos.lerp(l.pos, alpha))
                .collect(),
            enemy_pos: self.enemy.map(|e| e.prev_pos.lerp(e.pos, alpha)),
            enemy_lasers: self
                .enemy_lasers
                .iter()
                .map(|l| l.prev_pos.lerp(l.pos, alpha))
                .collect(),
            tokens: self.tokens.clone(),
            black_hole: self.black_hole,
            laser_grid: self.laser_grid,
        }
    }
}

/// Read-only frame for the renderer
#[derive(Debug, Clone)]
pub struct CombatSnapshot {
    pub phase: CombatPhase,
    pub paused: bool,
    pub tick: u64,
    pub level: u32,
    pub lives: u32,
    pub score: u64,
    pub special: Option<SpecialLevel>,
    pub malfunctions: Vec<MalfunctionKind>,
    pub ship_pos: Vec2,
    pub ship_angle: f32,
    pub ship_protected: bool,
    /// (position, radius, rotation) per asteroid
    pub asteroids: Vec<(Vec2, f32, f32)>,
    pub lasers: Vec<Vec2>,
    pub enemy_pos: Option<Vec2>,
    pub enemy_lasers: Vec<Vec2>,
    pub tokens: Vec<Token>,
    pub black_hole: Option<BlackHole>,
    pub laser_grid: Option<LaserGrid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let session = CombatSession::new(1, CombatTuning::default());
        assert_eq!(session.phase, CombatPhase::Welcome);
        assert_eq!(session.lives, 3);
        assert_eq!(session.score, 0);
        assert!(session.asteroids.is_empty());
    }

    #[test]
    fn test_ship_heading_up_at_zero() {
        let ship = Ship::new(Vec2::ZERO);
        let h = ship.heading();
        assert!(h.x.abs() < 1e-6);
        assert!((h.y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hit_radius_averages_offsets() {
        let asteroid = Asteroid {
            id: 0,
            pos: Vec2::ZERO,
            prev_pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: 50.0,
            angle: 0.0,
            spin: 0.0,
            offsets: vec![0.8, 1.2],
            durability: Durability::Simple,
        };
        assert!((asteroid.hit_radius() - 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_invulnerable_flags() {
        let mut ship = Ship::new(Vec2::ZERO);
        assert!(!ship.invulnerable());
        ship.protection_ticks = 1;
        assert!(ship.invulnerable());
        ship.protection_ticks = 0;
        ship.shield_ticks = 5;
        assert!(ship.invulnerable());
    }
}
