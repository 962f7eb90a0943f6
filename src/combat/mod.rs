//! Asteroid-field combat simulation
//!
//! Same runtime contract as the lander: fixed tick, seeded RNG, snapshots
//! out, events out. Velocities here are in pixels per second and integrated
//! with the fixed timestep, so balance numbers read in real-world units.

pub mod belt;
pub mod collision;
pub mod scheduler;
pub mod state;
pub mod tick;

pub use belt::{Belt, PlacementFailure};
pub use state::{
    Asteroid, BlackHole, CombatEvent, CombatInput, CombatPhase, CombatSession, CombatSnapshot,
    Durability, EnemyShip, Laser, LaserGrid, MalfunctionKind, PowerUpKind, Ship, SpecialLevel,
    Token, TokenKind,
};
