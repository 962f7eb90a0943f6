//! Headless demo driver
//!
//! Runs both simulations with scripted input through the fixed-timestep
//! loop, logs notable events, and maintains the high score files. Useful for
//! profiling, balance checks, and eyeballing determinism without a renderer.

use std::path::Path;

use skyhaul::combat::{CombatEvent, CombatInput, CombatPhase, CombatSession};
use skyhaul::highscores::{COMBAT_MAX_SCORES, LANDER_MAX_SCORES};
use skyhaul::lander::{GameEvent, GamePhase, LanderSession, TickInput};
use skyhaul::tuning::Tuning;
use skyhaul::{FixedStepper, HighScores};

const FRAME_DT: f32 = 1.0 / 60.0;
const DEMO_SECONDS: u32 = 60;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xC0FFEE);
    let tuning = Tuning::load_or_default(Path::new("tuning.json"));
    log::info!("demo seed {seed}");

    run_lander(seed, &tuning);
    run_combat(seed, &tuning);
}

/// Scripted hop flights over the terrain
fn run_lander(seed: u64, tuning: &Tuning) {
    let mut session = LanderSession::new(seed, tuning.lander.clone());
    let mut stepper = FixedStepper::new();
    let mut started = false;

    for frame in 0..DEMO_SECONDS * 60 {
        for _ in 0..stepper.advance(FRAME_DT) {
            let input = TickInput {
                start: !started,
                // Short burns on a repeating cadence
                thrust_main: started && frame % 240 < 90,
                thrust_right: started && frame % 600 < 20,
                ..Default::default()
            };
            started = true;
            session.tick(input);
        }
        for event in session.take_events() {
            match event {
                GameEvent::Landed { site, impact } => {
                    log::info!("touchdown at {site:?}, impact {impact:.2}")
                }
                GameEvent::Crashed => log::info!("lander destroyed"),
                other => log::debug!("{other:?}"),
            }
        }
        if session.phase == GamePhase::Crashed {
            break;
        }
    }

    let snapshot = session.snapshot(stepper.alpha());
    log::info!(
        "lander demo done: phase {:?}, score {}, damage {:.0}",
        snapshot.phase,
        snapshot.score,
        snapshot.damage
    );
    record_score(
        Path::new("scores_lander.json"),
        LANDER_MAX_SCORES,
        session.score(),
    );
}

/// Scripted spin-and-shoot combat run
fn run_combat(seed: u64, tuning: &Tuning) {
    let mut session = CombatSession::new(seed, tuning.combat.clone());
    let mut stepper = FixedStepper::new();
    let mut started = false;

    for frame in 0..DEMO_SECONDS * 60 {
        for _ in 0..stepper.advance(FRAME_DT) {
            let input = CombatInput {
                start: !started,
                thrust: started && frame % 120 < 30,
                turn_right: started && frame % 3 != 0,
                fire: started && frame % 5 == 0,
                ..Default::default()
            };
            started = true;
            session.tick(input);
        }
        for event in session.take_events() {
            match event {
                CombatEvent::LevelCleared { level } => log::info!("cleared level {level}"),
                CombatEvent::GameOver { score } => log::info!("game over, score {score}"),
                other => log::debug!("{other:?}"),
            }
        }
        if session.phase == CombatPhase::GameOver {
            break;
        }
    }

    log::info!(
        "combat demo done: level {}, lives {}, score {}",
        session.level,
        session.lives,
        session.score
    );
    record_score(
        Path::new("scores_combat.json"),
        COMBAT_MAX_SCORES,
        session.score,
    );
}

fn record_score(path: &Path, capacity: usize, score: u64) {
    let mut scores = HighScores::load(path, capacity);
    if let Some(rank) = scores.add_score(score) {
        log::info!("new high score, rank {rank}");
        scores.save(path);
    }
    for (i, s) in scores.padded().iter().enumerate() {
        log::info!("  {}. {s:>10}", i + 1);
    }
}
