//! Session state, input, and presentation types
//!
//! `LanderSession` owns the whole simulation. It is driven one fixed tick at
//! a time by `tick()` (see `tick.rs`), consumed by renderers through
//! `snapshot()` and by audio through `take_events()`. Nothing here touches
//! wall-clock time; all timing is the session tick counter.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::geom::lerp;
use crate::lander::collision::{LandingSite, Mothership};
use crate::lander::craft::Lander;
use crate::lander::delivery::{CargoBox, CargoKind, DeliveryRocket, FadingBox, RocketState};
use crate::lander::sky::{SkyEvent, SkyEventManager};
use crate::lander::terrain::{PadRole, Terrain};
use crate::runtime::DeferredQueue;
use crate::tuning::LanderTuning;

/// Top-level session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for start
    Welcome,
    /// Craft in flight
    Playing,
    /// Craft resting on a pad
    Landed,
    /// Craft destroyed, waiting for restart
    Crashed,
}

/// Player intent for one tick. Thrust fields are held-state, the rest are
/// edge-triggered presses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub thrust_main: bool,
    pub thrust_left: bool,
    pub thrust_right: bool,
    /// Start or restart the game
    pub start: bool,
    pub pause: bool,
}

/// Things that happened this tick, for the audio and HUD layers
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Started,
    Liftoff,
    Landed { site: LandingSite, impact: f32 },
    Crashed,
    CargoCollected(CargoKind),
    CargoDelivered(CargoKind),
    RepairStarted,
    RepairComplete,
    DeliveryInbound,
    SkyWarning(SkyEvent),
    SkyStarted(SkyEvent),
    SkyEnded(SkyEvent),
    Paused(bool),
}

/// Income rate per delivery destination
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Hashrates {
    pub methane: f32,
    pub geothermal: f32,
    pub nuclear: f32,
}

impl Hashrates {
    pub fn total(&self) -> f32 {
        self.methane + self.geothermal + self.nuclear
    }

    /// Income rate gained by a delivery to `role`
    pub fn boost_for(role: PadRole) -> f32 {
        match role {
            PadRole::Methane => 20.0,
            PadRole::Geothermal => 25.0,
            PadRole::Nuclear => 30.0,
            PadRole::Freight => 0.0,
        }
    }

    pub fn apply(&mut self, role: PadRole) {
        match role {
            PadRole::Methane => self.methane += Self::boost_for(role),
            PadRole::Geothermal => self.geothermal += Self::boost_for(role),
            PadRole::Nuclear => self.nuclear += Self::boost_for(role),
            PadRole::Freight => {}
        }
    }
}

/// Effects waiting for a future tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredEffect {
    StartDelivery,
}

/// The complete lander simulation
#[derive(Debug, Clone)]
pub struct LanderSession {
    pub tuning: LanderTuning,
    pub seed: u64,
    /// Monotonic simulation tick since session creation, pause excluded
    pub tick: u64,
    pub phase: GamePhase,
    pub paused: bool,

    pub lander: Lander,
    pub terrain: Terrain,
    pub mothership: Mothership,
    pub rocket: DeliveryRocket,
    pub sky: SkyEventManager,

    pub hashrates: Hashrates,
    pub(crate) score_accum: f64,
    pub(crate) landed_site: Option<LandingSite>,
    pub(crate) crashed_at: u64,
    pub(crate) next_delivery_scheduled: bool,
    pub(crate) deferred: DeferredQueue<DeferredEffect>,
    pub(crate) events: Vec<GameEvent>,
}

impl LanderSession {
    pub fn new(seed: u64, tuning: LanderTuning) -> Self {
        let terrain = Terrain::generate(seed, &tuning);
        let mothership = Mothership::new(&tuning);
        let mut rng = Pcg32::seed_from_u64(seed ^ 0x5b3d);
        let freight = terrain
            .pads
            .iter()
            .find(|p| p.role == PadRole::Freight)
            .cloned()
            .unwrap_or_else(|| terrain.pads[0].clone());
        let rocket = DeliveryRocket::new(&freight);
        // Runs begin airborne over the middle of the view
        let spawn = Vec2::new(tuning.view_width / 2.0, 100.0);
        let sky = SkyEventManager::new(rng.random(), 0, &tuning);
        let lander = Lander::new(spawn, &tuning);
        Self {
            tuning,
            seed,
            tick: 0,
            phase: GamePhase::Welcome,
            paused: false,
            lander,
            terrain,
            mothership,
            rocket,
            sky,
            hashrates: Hashrates::default(),
            score_accum: 0.0,
            landed_site: None,
            crashed_at: 0,
            next_delivery_scheduled: false,
            deferred: DeferredQueue::new(),
            events: Vec::new(),
        }
    }

    /// Reset to a fresh run on the same terrain, discarding pending effects
    pub(crate) fn reset_run(&mut self) {
        let freight = self
            .terrain
            .pads
            .iter()
            .find(|p| p.role == PadRole::Freight)
            .cloned()
            .unwrap_or_else(|| self.terrain.pads[0].clone());
        let spawn = Vec2::new(self.tuning.view_width / 2.0, 100.0);
        self.lander = Lander::new(spawn, &self.tuning);
        self.rocket = DeliveryRocket::new(&freight);
        // Fresh hazard schedule anchored at the current tick; an event in
        // progress when the last run ended must not carry into this one
        let mut rng = Pcg32::seed_from_u64(self.seed ^ 0x5b3d ^ self.tick);
        self.sky = SkyEventManager::new(rng.random(), self.tick, &self.tuning);
        self.hashrates = Hashrates::default();
        self.score_accum = 0.0;
        self.landed_site = None;
        self.next_delivery_scheduled = false;
        self.deferred.reset();
    }

    /// Accumulated score
    pub fn score(&self) -> u64 {
        self.score_accum as u64
    }

    /// Craft altitude above whatever is directly below it
    ///
    /// Over the mothership bay the repair pad is the reference surface, so
    /// the readout counts down to the pad instead of the terrain far below.
    pub fn altitude(&self) -> f32 {
        let over_bay = self.lander.pos.x >= self.mothership.bay_left()
            && self.lander.pos.x <= self.mothership.bay_right()
            && self.lander.bottom() <= self.mothership.pad_y();
        if over_bay {
            return (self.mothership.pad_y() - self.lander.bottom()).max(0.0);
        }
        self.terrain
            .distance_below(self.lander.pos.x, self.lander.bottom())
    }

    /// Drain events emitted since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Interpolated presentation state; `alpha` in [0, 1] blends between the
    /// previous and current tick
    pub fn snapshot(&self, alpha: f32) -> Snapshot {
        let alpha = alpha.clamp(0.0, 1.0);
        let pos = self.lander.prev_pos.lerp(self.lander.pos, alpha);
        // Interpolate the angle along the shorter arc
        let delta = crate::signed_tilt(self.lander.angle - self.lander.prev_angle);
        let angle = crate::normalize_angle(self.lander.prev_angle + delta * alpha);
        Snapshot {
            phase: self.phase,
            paused: self.paused,
            tick: self.tick,
            pos,
            angle,
            vel: self.lander.vel,
            speed: self.lander.speed(&self.tuning),
            tilt: lerp(
                crate::signed_tilt(self.lander.prev_angle),
                crate::signed_tilt(self.lander.angle),
                alpha,
            ),
            damage: self.lander.damage,
            altitude: self.altitude(),
            cargo: self.lander.cargo.clone(),
            score: self.score(),
            hashrates: self.hashrates,
            rocket_pos: self.rocket.pos,
            rocket_state: self.rocket.state,
            crates: self.rocket.unloaded.clone(),
            fading_crates: self.rocket.fading.clone(),
            sky_event: self.sky.active_event(),
            sky_intensity: self.sky.intensity(self.tick, &self.tuning),
            sky_warning: self.sky.warning_active(self.tick, &self.tuning),
            trajectory: if self.phase == GamePhase::Playing {
                self.lander.predict_trajectory(&self.tuning)
            } else {
                Vec::new()
            },
        }
    }
}

/// Read-only frame for the renderer
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub paused: bool,
    pub tick: u64,
    pub pos: Vec2,
    pub angle: f32,
    pub vel: Vec2,
    pub speed: f32,
    pub tilt: f32,
    pub damage: f32,
    pub altitude: f32,
    pub cargo: Vec<CargoKind>,
    pub score: u64,
    pub hashrates: Hashrates,
    pub rocket_pos: Vec2,
    pub rocket_state: RocketState,
    pub crates: Vec<CargoBox>,
    pub fading_crates: Vec<FadingBox>,
    pub sky_event: Option<SkyEvent>,
    pub sky_intensity: f32,
    pub sky_warning: bool,
    pub trajectory: Vec<Vec2>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_on_welcome() {
        let session = LanderSession::new(11, LanderTuning::default());
        assert_eq!(session.phase, GamePhase::Welcome);
        assert!(!session.paused);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_sessions_with_same_seed_match() {
        let a = LanderSession::new(42, LanderTuning::default());
        let b = LanderSession::new(42, LanderTuning::default());
        assert_eq!(a.terrain.points, b.terrain.points);
        assert_eq!(a.lander.pos, b.lander.pos);
    }

    #[test]
    fn test_snapshot_interpolates_position() {
        let mut session = LanderSession::new(5, LanderTuning::default());
        session.lander.prev_pos = Vec2::new(0.0, 0.0);
        session.lander.pos = Vec2::new(10.0, 20.0);
        let snap = session.snapshot(0.5);
        assert_eq!(snap.pos, Vec2::new(5.0, 10.0));
    }

    #[test]
    fn test_snapshot_angle_takes_short_arc() {
        let mut session = LanderSession::new(5, LanderTuning::default());
        // Crossing the 0/2pi seam must not sweep the long way round
        session.lander.prev_angle = crate::normalize_angle(-0.1);
        session.lander.angle = 0.1;
        let snap = session.snapshot(0.5);
        assert!(crate::signed_tilt(snap.angle).abs() < 0.01);
    }

    #[test]
    fn test_hashrate_boosts() {
        let mut rates = Hashrates::default();
        rates.apply(PadRole::Methane);
        rates.apply(PadRole::Geothermal);
        rates.apply(PadRole::Nuclear);
        assert_eq!(rates.total(), 75.0);
        rates.apply(PadRole::Freight);
        assert_eq!(rates.total(), 75.0);
    }

    #[test]
    fn test_altitude_positive_in_flight() {
        let mut session = LanderSession::new(5, LanderTuning::default());
        session.lander.pos.y = 50.0;
        assert!(session.altitude() > 0.0);
    }
}
