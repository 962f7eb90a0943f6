//! Atmospheric hazard scheduling
//!
//! Solar wind and aurora events arrive at seeded random intervals, announce
//! themselves with a warning window, ramp in and out over a transition
//! period, and hurt the craft only while it flies low. All timing is in
//! simulation ticks.

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::TICK_RATE;
use crate::geom::smoothstep;
use crate::tuning::LanderTuning;

/// Hazard kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkyEvent {
    SolarWind,
    Aurora,
}

impl SkyEvent {
    fn damage_per_second(&self, t: &LanderTuning) -> f32 {
        match self {
            SkyEvent::SolarWind => t.solar_wind_dps,
            SkyEvent::Aurora => t.aurora_dps,
        }
    }
}

/// Edge-triggered notifications for the audio/HUD layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyNotice {
    Warning(SkyEvent),
    Started(SkyEvent),
    Ended(SkyEvent),
}

/// Schedules and tracks one sky event at a time
#[derive(Debug, Clone)]
pub struct SkyEventManager {
    rng: Pcg32,
    /// Event currently pending or running
    upcoming: SkyEvent,
    /// Absolute tick the next (or current) event begins
    start_tick: u64,
    active: bool,
    warned: bool,
}

impl SkyEventManager {
    pub fn new(seed: u64, now: u64, t: &LanderTuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let gap = rng.random_range(t.sky_gap_min_ticks..=t.sky_gap_max_ticks);
        let upcoming = Self::pick(&mut rng);
        Self {
            rng,
            upcoming,
            start_tick: now + gap,
            active: false,
            warned: false,
        }
    }

    fn pick(rng: &mut Pcg32) -> SkyEvent {
        if rng.random::<f32>() < 0.5 {
            SkyEvent::SolarWind
        } else {
            SkyEvent::Aurora
        }
    }

    pub fn active_event(&self) -> Option<SkyEvent> {
        self.active.then_some(self.upcoming)
    }

    /// Whether the pre-event warning window is open
    pub fn warning_active(&self, now: u64, t: &LanderTuning) -> bool {
        !self.active
            && now + t.sky_warning_ticks >= self.start_tick
            && now < self.start_tick
    }

    /// Effect strength in [0, 1], ramping over the transition window
    pub fn intensity(&self, now: u64, t: &LanderTuning) -> f32 {
        if !self.active || now < self.start_tick {
            return 0.0;
        }
        let elapsed = now - self.start_tick;
        let duration = t.sky_event_duration_ticks;
        let transition = t.sky_transition_ticks.max(1);
        if elapsed >= duration {
            return 0.0;
        }
        let ramp_in = smoothstep(elapsed as f32 / transition as f32);
        let ramp_out = smoothstep((duration - elapsed) as f32 / transition as f32);
        ramp_in.min(ramp_out)
    }

    /// Damage applied this tick to a craft at `altitude` above the terrain
    pub fn damage_per_tick(&self, now: u64, altitude: f32, t: &LanderTuning) -> f32 {
        let Some(event) = self.active_event() else {
            return 0.0;
        };
        if altitude >= t.sky_safe_altitude {
            return 0.0;
        }
        let exposure = 1.0 - (altitude / t.sky_safe_altitude).clamp(0.0, 1.0);
        event.damage_per_second(t) / TICK_RATE as f32 * self.intensity(now, t) * exposure
    }

    /// Advance the schedule, reporting at most one edge per tick
    pub fn update(&mut self, now: u64, t: &LanderTuning) -> Option<SkyNotice> {
        if !self.active {
            if !self.warned && self.warning_active(now, t) {
                self.warned = true;
                return Some(SkyNotice::Warning(self.upcoming));
            }
            if now >= self.start_tick {
                self.active = true;
                log::info!("sky event started: {:?}", self.upcoming);
                return Some(SkyNotice::Started(self.upcoming));
            }
            return None;
        }

        if now >= self.start_tick + t.sky_event_duration_ticks {
            let ended = self.upcoming;
            self.active = false;
            self.warned = false;
            let gap = self
                .rng
                .random_range(t.sky_gap_min_ticks..=t.sky_gap_max_ticks);
            self.start_tick = now + gap;
            self.upcoming = Self::pick(&mut self.rng);
            log::info!("sky event ended: {ended:?}");
            return Some(SkyNotice::Ended(ended));
        }
        None
    }
}
