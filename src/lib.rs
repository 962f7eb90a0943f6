//! Skyhaul - a headless 2D arcade runtime
//!
//! Two deterministic simulations share this crate:
//! - `lander`: physics-driven cargo-delivery lander over procedural terrain
//! - `combat`: asteroid-field shooter with malfunctions and special levels
//!
//! Core modules:
//! - `geom`: pure vector/segment/rect distance utilities
//! - `runtime`: fixed-timestep accumulator and epoch-tagged deferred events
//! - `tuning`: data-driven game balance
//! - `highscores`: flat leaderboard with JSON persistence
//!
//! All gameplay logic is pure and deterministic: fixed timestep only, seeded
//! RNG only, no rendering or platform dependencies. Rendering, audio, and
//! input wiring consume read-only snapshots and drained event lists.

pub mod combat;
pub mod geom;
pub mod highscores;
pub mod lander;
pub mod runtime;
pub mod tuning;

pub use highscores::HighScores;
pub use runtime::FixedStepper;

/// Game loop constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, authoritative for all countdowns)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Simulation ticks per second
    pub const TICK_RATE: u32 = 60;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest wall-clock delta accepted per frame (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.1;
}

/// Normalize an angle into [0, 2π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    angle.rem_euclid(std::f32::consts::TAU)
}

/// Signed tilt in [-π, π) for an angle normalized to [0, 2π)
///
/// Landing checks compare |tilt|, so an angle just below 2π must read as a
/// small negative tilt, not a near-full rotation.
#[inline]
pub fn signed_tilt(angle: f32) -> f32 {
    let a = normalize_angle(angle);
    if a >= std::f32::consts::PI {
        a - std::f32::consts::TAU
    } else {
        a
    }
}
