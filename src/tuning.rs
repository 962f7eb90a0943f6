//! Data-driven game balance
//!
//! Every constant a designer may want to touch lives here, serde-serializable
//! so a JSON tuning table can override the defaults. The `Default` impls are
//! the canonical shipped balance; tests rely on them.
//!
//! Times are expressed in simulation ticks (60 per second) so that every
//! countdown is frame-rate independent.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::consts::TICK_RATE;

/// Lander variant balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanderTuning {
    /// View width/height the world is sized against (pixels)
    pub view_width: f32,
    pub view_height: f32,
    /// World width multiplier (terrain wraps at view_width * this)
    pub world_width_factor: f32,
    /// Terrain segment size in pixels
    pub segment_size: f32,

    /// Downward acceleration per tick
    pub gravity: f32,
    /// Main engine acceleration per tick
    pub thrust_power: f32,
    /// Angular acceleration per tick from side thrusters
    pub rotation_power: f32,
    /// Per-tick angular velocity decay
    pub rotation_damping: f32,
    /// Per-tick linear velocity decay
    pub damping: f32,
    /// Post-landing tilt correction per tick (radians)
    pub settling_speed: f32,
    /// Half-width of the craft in pixels
    pub lander_size: f32,

    /// HUD speed = |velocity| * this
    pub speed_scale: f32,
    /// Landing rejected at or above this HUD speed
    pub max_landing_speed: f32,
    /// Landing rejected at or above this |tilt| (radians)
    pub max_landing_tilt: f32,
    /// Impact severity below this causes no damage
    pub impact_threshold: f32,
    /// Damage per unit of excess impact severity
    pub impact_damage_factor: f32,
    /// Damage at which the craft is destroyed
    pub max_damage: f32,
    /// Damage repaired per second while docked
    pub repair_rate: f32,

    /// Ticks the crashed screen must stay up before restart is accepted
    pub crashed_min_display_ticks: u64,
    /// Ticks between full cargo collection and the next delivery cycle
    pub delivery_restart_delay_ticks: u64,

    /// Sky event scheduling (ticks)
    pub sky_gap_min_ticks: u64,
    pub sky_gap_max_ticks: u64,
    pub sky_event_duration_ticks: u64,
    pub sky_transition_ticks: u64,
    pub sky_warning_ticks: u64,
    /// Altitude above which sky events cause no damage
    pub sky_safe_altitude: f32,
    /// Damage per second at zero altitude
    pub solar_wind_dps: f32,
    pub aurora_dps: f32,
}

impl Default for LanderTuning {
    fn default() -> Self {
        Self {
            view_width: 1280.0,
            view_height: 720.0,
            world_width_factor: 6.0,
            segment_size: 30.0,
            gravity: 0.05,
            thrust_power: 0.07,
            rotation_power: 0.0005,
            rotation_damping: 0.998,
            damping: 0.997,
            settling_speed: 0.05,
            lander_size: 15.0,
            speed_scale: 10.0,
            max_landing_speed: 12.0,
            max_landing_tilt: 0.3,
            impact_threshold: 0.5,
            impact_damage_factor: 40.0,
            max_damage: 100.0,
            repair_rate: 33.33,
            crashed_min_display_ticks: TICK_RATE as u64,
            delivery_restart_delay_ticks: 3 * TICK_RATE as u64,
            sky_gap_min_ticks: 30 * TICK_RATE as u64,
            sky_gap_max_ticks: 90 * TICK_RATE as u64,
            sky_event_duration_ticks: 30 * TICK_RATE as u64,
            sky_transition_ticks: 3 * TICK_RATE as u64,
            sky_warning_ticks: 5 * TICK_RATE as u64,
            sky_safe_altitude: 500.0,
            solar_wind_dps: 15.0,
            aurora_dps: 10.0,
        }
    }
}

impl LanderTuning {
    /// Full wrapped terrain width
    pub fn world_width(&self) -> f32 {
        self.view_width * self.world_width_factor
    }
}

/// Combat variant balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Playfield dimensions (pixels)
    pub field_width: f32,
    pub field_height: f32,

    /// Turn rate in degrees per second
    pub turn_speed: f32,
    /// Thrust acceleration in pixels per second
    pub ship_thrust: f32,
    /// Coasting friction coefficient per second
    pub friction: f32,
    /// Ship collision radius
    pub ship_radius: f32,
    /// Fraction of ship radius used for lethal contact (forgiving hitbox)
    pub ship_hitbox_scale: f32,
    pub lives: u32,
    /// Explosion animation length (ticks)
    pub explode_ticks: u32,
    /// Post-respawn invincibility window (ticks)
    pub spawn_protection_ticks: u32,

    /// Asteroid base diameter in pixels
    pub asteroid_size: f32,
    /// Asteroid speed in pixels per second
    pub asteroid_speed: f32,
    /// Base vertex count for irregular polygons
    pub asteroid_vertices: u32,
    /// Asteroids below this radius do not split
    pub min_split_radius_divisor: f32,

    pub laser_max: usize,
    /// Laser speed in pixels per second
    pub laser_speed: f32,
    /// Laser range as a fraction of field width
    pub laser_range_factor: f32,

    pub score_large: u64,
    pub score_medium: u64,
    pub score_small: u64,
    pub score_enemy: u64,

    /// Per-level malfunction roll
    pub malfunction_base_chance: f32,
    pub malfunction_chance_per_level: f32,
    /// Displayed risk percentage cap
    pub malfunction_risk_cap: u32,

    /// Every Nth level is a special level
    pub special_level_interval: u32,
    pub monster_size_factor: f32,
    pub monster_health: u32,
    /// Fragments released when a durable body finally breaks
    pub monster_fragments: u32,
    pub black_hole_radius: f32,
    pub black_hole_pull_radius: f32,
    pub black_hole_force: f32,
    pub laser_grid_beams: u32,
    /// Grid rotation in radians per second
    pub laser_grid_rotation_speed: f32,

    /// Enemy ship
    pub enemy_size: f32,
    pub enemy_speed: f32,
    pub enemy_laser_speed: f32,
    pub enemy_shoot_interval_ticks: u32,
    pub enemy_spawn_delay_min_ticks: u64,
    pub enemy_spawn_delay_max_ticks: u64,

    /// Tokens and power-ups
    pub token_collect_radius: f32,
    pub token_speed: f32,
    pub bitcoin_reward_min: u64,
    pub bitcoin_reward_max: u64,
    pub power_up_spawn_chance: f32,
    pub power_up_duration_ticks: u32,
    pub shield_duration_ticks: u32,

    /// Bounded placement retry budget
    pub max_spawn_attempts: u32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            field_width: 1280.0,
            field_height: 720.0,
            turn_speed: 270.0,
            ship_thrust: 5.0,
            friction: 0.3,
            ship_radius: 15.0,
            ship_hitbox_scale: 0.8,
            lives: 3,
            explode_ticks: 3 * TICK_RATE,
            spawn_protection_ticks: 150,
            asteroid_size: 100.0,
            asteroid_speed: 50.0,
            asteroid_vertices: 10,
            min_split_radius_divisor: 7.0,
            laser_max: 10,
            laser_speed: 500.0,
            laser_range_factor: 0.5,
            score_large: 5000,
            score_medium: 10000,
            score_small: 15000,
            score_enemy: 20000,
            malfunction_base_chance: 0.3,
            malfunction_chance_per_level: 0.01,
            malfunction_risk_cap: 90,
            special_level_interval: 2,
            monster_size_factor: 1.5,
            monster_health: 25,
            monster_fragments: 6,
            black_hole_radius: 20.0,
            black_hole_pull_radius: 500.0,
            black_hole_force: 0.15,
            laser_grid_beams: 4,
            laser_grid_rotation_speed: 0.1,
            enemy_size: 20.0,
            enemy_speed: 2.0,
            enemy_laser_speed: 300.0,
            enemy_shoot_interval_ticks: 2 * TICK_RATE,
            enemy_spawn_delay_min_ticks: 2 * TICK_RATE as u64,
            enemy_spawn_delay_max_ticks: 20 * TICK_RATE as u64,
            token_collect_radius: 30.0,
            token_speed: 100.0,
            bitcoin_reward_min: 50_000,
            bitcoin_reward_max: 250_000,
            power_up_spawn_chance: 0.001,
            power_up_duration_ticks: 15 * TICK_RATE,
            shield_duration_ticks: 12 * TICK_RATE,
            max_spawn_attempts: 10,
        }
    }
}

impl CombatTuning {
    /// Monster asteroid radius
    pub fn monster_size(&self) -> f32 {
        self.asteroid_size * self.monster_size_factor
    }
}

/// Combined tuning table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub lander: LanderTuning,
    pub combat: CombatTuning,
}

impl Tuning {
    /// Load a tuning table from a JSON file, falling back to defaults on any
    /// error. Balance files are optional; a broken one should never keep the
    /// game from starting.
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning
                }
                Err(err) => {
                    log::warn!("Ignoring malformed tuning {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_roundtrip_json() {
        let tuning = Tuning::default();
        let json = serde_json::to_string(&tuning).unwrap();
        let back: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lander.gravity, tuning.lander.gravity);
        assert_eq!(back.combat.lives, tuning.combat.lives);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{"lander": {"gravity": 0.1}}"#;
        let tuning: Tuning = serde_json::from_str(json).unwrap();
        assert_eq!(tuning.lander.gravity, 0.1);
        // Untouched fields keep defaults
        assert_eq!(tuning.lander.thrust_power, 0.07);
        assert_eq!(tuning.combat.malfunction_base_chance, 0.3);
    }
}
