//! Per-level rolls and timed spawns
//!
//! Every level rolls for a ship malfunction with a risk that climbs with
//! level depth. Enemies arrive through the deferred queue at a seeded random
//! delay after a level starts, and power-up tokens trickle in with a small
//! per-tick chance.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::combat::state::{MalfunctionKind, PowerUpKind, Token, TokenKind};
use crate::consts::TICK_RATE;
use crate::tuning::CombatTuning;

/// Displayed malfunction risk for a level, as a whole percentage
pub fn malfunction_risk_percent(level: u32, t: &CombatTuning) -> u32 {
    let chance =
        t.malfunction_base_chance + t.malfunction_chance_per_level * (level.saturating_sub(1)) as f32;
    ((chance * 100.0).round() as u32).min(t.malfunction_risk_cap)
}

/// Chance that a secondary system joins an already-rolled malfunction
const COMPOUND_CHANCE: f32 = 0.25;

/// Roll the malfunction set for a new level
///
/// The displayed risk is the chance of at least one malfunction. Once one
/// hits, each remaining system may join it, so deep levels can stack
/// several impairments at once.
pub fn roll_level_malfunctions(
    rng: &mut Pcg32,
    level: u32,
    t: &CombatTuning,
) -> Vec<MalfunctionKind> {
    let risk = malfunction_risk_percent(level, t) as f32 / 100.0;
    if rng.random::<f32>() >= risk {
        return Vec::new();
    }
    let all = [
        MalfunctionKind::Engine,
        MalfunctionKind::Steering,
        MalfunctionKind::Weapons,
    ];
    let primary = all[rng.random_range(0..all.len())];
    let mut set = vec![primary];
    for kind in all {
        if kind != primary && rng.random::<f32>() < COMPOUND_CHANCE {
            set.push(kind);
        }
    }
    set
}

/// Seeded delay before the next enemy shows up
pub fn enemy_spawn_delay(rng: &mut Pcg32, t: &CombatTuning) -> u64 {
    rng.random_range(t.enemy_spawn_delay_min_ticks..=t.enemy_spawn_delay_max_ticks)
}

/// Occasionally conjure a drifting token: usually a power-up, sometimes a
/// spare-life repair kit
pub fn maybe_spawn_token(rng: &mut Pcg32, t: &CombatTuning) -> Option<Token> {
    if rng.random::<f32>() >= t.power_up_spawn_chance {
        return None;
    }
    let kind = match rng.random_range(0..5u32) {
        0 => TokenKind::PowerUp(PowerUpKind::RearLaser),
        1 => TokenKind::PowerUp(PowerUpKind::SpreadShot),
        2 => TokenKind::PowerUp(PowerUpKind::Shield),
        3 => TokenKind::PowerUp(PowerUpKind::LaserBurst),
        _ => TokenKind::Repair,
    };
    let dir = rng.random::<f32>() * std::f32::consts::TAU;
    Some(Token {
        pos: Vec2::new(
            rng.random::<f32>() * t.field_width,
            rng.random::<f32>() * t.field_height,
        ),
        vel: Vec2::new(dir.cos(), dir.sin()) * t.token_speed,
        kind,
        ticks_left: 15 * TICK_RATE,
    })
}

/// Bounty token dropped by a destroyed enemy
pub fn bitcoin_token(rng: &mut Pcg32, pos: Vec2, t: &CombatTuning) -> Token {
    let reward = rng.random_range(t.bitcoin_reward_min..=t.bitcoin_reward_max);
    let dir = rng.random::<f32>() * std::f32::consts::TAU;
    Token {
        pos,
        vel: Vec2::new(dir.cos(), dir.sin()) * t.token_speed,
        kind: TokenKind::Bitcoin { reward },
        ticks_left: 15 * TICK_RATE,
    }
}
