//! Fixed-tick state machine for the lander session
//!
//! One call advances the whole simulation by exactly one tick. Order within
//! a tick: input, craft integration, collision, cargo flow, hazards, deferred
//! effects, scoring. Pause freezes everything including the tick counter.

use crate::consts::TICK_RATE;
use crate::geom::wrap;
use crate::lander::collision::{self, LandingSite, Outcome};
use crate::lander::sky::SkyNotice;
use crate::lander::state::{DeferredEffect, GameEvent, GamePhase, LanderSession, TickInput};

/// Vertical kick applied at liftoff so the craft clears the pad immediately
const LIFTOFF_SPEED: f32 = 0.5;

impl LanderSession {
    /// Advance the session by one fixed tick
    pub fn tick(&mut self, input: TickInput) {
        if input.pause && matches!(self.phase, GamePhase::Playing | GamePhase::Landed) {
            self.paused = !self.paused;
            self.events.push(GameEvent::Paused(self.paused));
        }
        if self.paused {
            return;
        }
        self.tick += 1;

        match self.phase {
            GamePhase::Welcome => {
                if input.start {
                    self.reset_run();
                    self.phase = GamePhase::Playing;
                    self.events.push(GameEvent::Started);
                    log::info!("run started (seed {})", self.seed);
                }
            }
            GamePhase::Playing => self.tick_flight(input),
            GamePhase::Landed => self.tick_landed(input),
            GamePhase::Crashed => {
                if input.start && self.tick - self.crashed_at >= self.tuning.crashed_min_display_ticks
                {
                    self.phase = GamePhase::Welcome;
                }
            }
        }
    }

    fn tick_flight(&mut self, input: TickInput) {
        self.lander.thrusters.main = input.thrust_main;
        self.lander.thrusters.left = input.thrust_left;
        self.lander.thrusters.right = input.thrust_right;
        self.lander.integrate(false, &self.tuning);

        // World wrap; shift prev_pos by the same amount so interpolation
        // never sweeps across the whole world
        let wrapped = wrap(self.lander.pos.x, self.terrain.width);
        if wrapped != self.lander.pos.x {
            self.lander.prev_pos.x += wrapped - self.lander.pos.x;
            self.lander.pos.x = wrapped;
        }

        match collision::check(&self.lander, &self.terrain, &self.mothership, &self.tuning) {
            Outcome::None => {}
            Outcome::SoftLanding { impact, site } => self.touch_down(impact, site),
            Outcome::Crash => self.crash(),
        }

        if self.phase != GamePhase::Crashed {
            self.apply_sky_damage();
        }
        self.tick_shared();
    }

    fn tick_landed(&mut self, input: TickInput) {
        // No liftoff while the craft is still rocking onto its gear
        if input.thrust_main && !self.lander.settling {
            self.lift_off();
            self.tick_shared();
            return;
        }

        self.lander.integrate(true, &self.tuning);

        match self.landed_site {
            Some(LandingSite::Pad(role)) if role == crate::lander::PadRole::Freight => {
                if let Some(kind) = self.rocket.collect(self.lander.pos) {
                    self.lander.cargo.push(kind);
                    self.events.push(GameEvent::CargoCollected(kind));
                    log::debug!("collected {kind:?}");
                }
            }
            Some(LandingSite::Pad(role)) => {
                if let Some(idx) = self
                    .lander
                    .cargo
                    .iter()
                    .position(|c| c.destination() == role)
                {
                    let kind = self.lander.cargo.remove(idx);
                    self.hashrates.apply(role);
                    self.rocket.deliver(self.lander.pos, kind);
                    self.events.push(GameEvent::CargoDelivered(kind));
                    log::info!("delivered {kind:?}, hashrate {}", self.hashrates.total());
                }
            }
            Some(LandingSite::MothershipPad) => {
                let was_repairing = self.lander.repairing;
                self.lander.update_repairs(&self.tuning);
                if was_repairing && !self.lander.repairing {
                    self.events.push(GameEvent::RepairComplete);
                }
            }
            None => {}
        }

        self.apply_sky_damage();
        self.tick_shared();
    }

    /// Rocket, sky schedule, deferred effects, and scoring run in every
    /// active phase
    fn tick_shared(&mut self) {
        self.rocket.update();

        if let Some(notice) = self.sky.update(self.tick, &self.tuning) {
            self.events.push(match notice {
                SkyNotice::Warning(e) => GameEvent::SkyWarning(e),
                SkyNotice::Started(e) => GameEvent::SkyStarted(e),
                SkyNotice::Ended(e) => GameEvent::SkyEnded(e),
            });
        }

        for effect in self.deferred.drain_due(self.tick) {
            match effect {
                DeferredEffect::StartDelivery => {
                    self.rocket.start_delivery();
                    self.next_delivery_scheduled = false;
                    self.events.push(GameEvent::DeliveryInbound);
                }
            }
        }

        if self.rocket.run_complete()
            && self.lander.cargo.is_empty()
            && !self.next_delivery_scheduled
            && self.phase != GamePhase::Crashed
        {
            self.deferred.schedule(
                self.tick,
                self.tuning.delivery_restart_delay_ticks,
                DeferredEffect::StartDelivery,
            );
            self.next_delivery_scheduled = true;
        }

        self.score_accum += self.hashrates.total() as f64 / TICK_RATE as f64;
    }

    fn lift_off(&mut self) {
        self.lander.vel.y = -LIFTOFF_SPEED;
        self.lander.repairing = false;
        self.lander.settling = false;
        self.landed_site = None;
        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::Liftoff);
    }

    fn touch_down(&mut self, impact: f32, site: LandingSite) {
        let surface = match site {
            LandingSite::MothershipPad => self.mothership.pad_y(),
            LandingSite::Pad(role) => self
                .terrain
                .pads
                .iter()
                .find(|p| p.role == role)
                .map(|p| p.y)
                .unwrap_or_else(|| self.terrain.height_at(self.lander.pos.x)),
        };
        self.lander.pos.y = surface - self.lander.size * 1.5;

        if !self.lander.apply_impact(impact, &self.tuning) {
            self.crash();
            return;
        }
        self.phase = GamePhase::Landed;
        self.landed_site = Some(site);
        self.events.push(GameEvent::Landed { site, impact });

        if site == LandingSite::MothershipPad && self.lander.damage > 0.0 {
            self.lander.repairing = true;
            self.events.push(GameEvent::RepairStarted);
        }
    }

    fn crash(&mut self) {
        self.lander.damage = self.tuning.max_damage;
        self.phase = GamePhase::Crashed;
        self.crashed_at = self.tick;
        self.landed_site = None;
        self.deferred.reset();
        self.events.push(GameEvent::Crashed);
        log::info!("crashed at tick {} with score {}", self.tick, self.score());
    }

    fn apply_sky_damage(&mut self) {
        // Damage scales with height above the terrain, not the HUD readout,
        // so a craft docked at the mothership stays out of the danger band
        let terrain_altitude = self
            .terrain
            .distance_below(self.lander.pos.x, self.lander.bottom());
        let damage = self
            .sky
            .damage_per_tick(self.tick, terrain_altitude, &self.tuning);
        if damage > 0.0 {
            self.lander.take_damage(damage, &self.tuning);
            if self.lander.damage >= self.tuning.max_damage {
                self.crash();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lander::delivery::CargoKind;
    use crate::lander::PadRole;
    use crate::tuning::LanderTuning;
    use glam::Vec2;

    fn started_session() -> LanderSession {
        let mut session = LanderSession::new(21, LanderTuning::default());
        session.tick(TickInput {
            start: true,
            ..Default::default()
        });
        session
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    /// Started session with the craft parked on the freight pad
    fn landed_session() -> LanderSession {
        let mut session = started_session();
        let pad = session
            .terrain
            .pads
            .iter()
            .find(|p| p.role == PadRole::Freight)
            .cloned()
            .unwrap();
        session.lander.pos = Vec2::new(
            pad.x + pad.width / 2.0,
            pad.y - session.tuning.lander_size * 1.5,
        );
        session.lander.prev_pos = session.lander.pos;
        session.lander.vel = Vec2::ZERO;
        session.phase = GamePhase::Landed;
        session.landed_site = Some(LandingSite::Pad(PadRole::Freight));
        session
    }

    #[test]
    fn test_start_spawns_airborne_over_the_field() {
        let mut session = started_session();
        assert_eq!(session.phase, GamePhase::Playing);
        assert_eq!(
            session.lander.pos,
            Vec2::new(session.tuning.view_width / 2.0, 100.0)
        );
        let events = session.take_events();
        assert!(events.contains(&GameEvent::Started));
    }

    #[test]
    fn test_liftoff_kick() {
        let mut session = landed_session();
        session.take_events();
        session.tick(TickInput {
            thrust_main: true,
            ..Default::default()
        });
        assert_eq!(session.phase, GamePhase::Playing);
        assert_eq!(session.lander.vel.y, -0.5);
        assert!(session.take_events().contains(&GameEvent::Liftoff));
    }

    #[test]
    fn test_hop_relands_softly() {
        let mut session = landed_session();
        session.tick(TickInput {
            thrust_main: true,
            ..Default::default()
        });
        session.take_events();
        // Coast back down under gravity
        for _ in 0..600 {
            session.tick(idle());
            if session.phase == GamePhase::Landed {
                break;
            }
        }
        assert_eq!(session.phase, GamePhase::Landed);
        assert!(session
            .take_events()
            .iter()
            .any(|e| matches!(e, GameEvent::Landed { .. })));
    }

    #[test]
    fn test_fast_descent_crashes() {
        let mut session = landed_session();
        session.tick(TickInput {
            thrust_main: true,
            ..Default::default()
        });
        // Slam it down
        session.lander.vel = Vec2::new(0.0, 5.0);
        for _ in 0..600 {
            session.tick(idle());
            if session.phase == GamePhase::Crashed {
                break;
            }
        }
        assert_eq!(session.phase, GamePhase::Crashed);
        assert_eq!(session.lander.damage, session.tuning.max_damage);
    }

    #[test]
    fn test_pause_freezes_tick_counter() {
        let mut session = started_session();
        let before = session.tick;
        session.tick(TickInput {
            pause: true,
            ..Default::default()
        });
        session.tick(idle());
        session.tick(idle());
        assert_eq!(session.tick, before);
        session.tick(TickInput {
            pause: true,
            ..Default::default()
        });
        assert_eq!(session.tick, before + 1);
    }

    #[test]
    fn test_restart_requires_display_delay() {
        let mut session = started_session();
        session.crash();
        let restart = TickInput {
            start: true,
            ..Default::default()
        };
        session.tick(restart);
        assert_eq!(session.phase, GamePhase::Crashed);
        for _ in 0..session.tuning.crashed_min_display_ticks {
            session.tick(idle());
        }
        session.tick(restart);
        assert_eq!(session.phase, GamePhase::Welcome);
    }

    #[test]
    fn test_restart_resets_run_state() {
        let mut session = started_session();
        session.hashrates.apply(PadRole::Nuclear);
        session.score_accum = 5000.0;
        session.lander.cargo.push(CargoKind::Methane);
        session.crash();
        for _ in 0..=session.tuning.crashed_min_display_ticks {
            session.tick(idle());
        }
        session.tick(TickInput {
            start: true,
            ..Default::default()
        });
        assert_eq!(session.phase, GamePhase::Welcome);
        session.tick(TickInput {
            start: true,
            ..Default::default()
        });
        assert_eq!(session.phase, GamePhase::Playing);
        assert_eq!(session.score(), 0);
        assert_eq!(session.hashrates.total(), 0.0);
        assert!(session.lander.cargo.is_empty());
    }

    #[test]
    fn test_delivery_gets_scheduled_and_arrives() {
        let mut session = landed_session();
        let deadline = session.tuning.delivery_restart_delay_ticks + 10;
        let mut inbound = false;
        for _ in 0..deadline {
            session.tick(idle());
            if session
                .take_events()
                .contains(&GameEvent::DeliveryInbound)
            {
                inbound = true;
                break;
            }
        }
        assert!(inbound, "delivery never scheduled");
        assert_ne!(
            session.rocket.state,
            crate::lander::RocketState::Waiting
        );
    }

    #[test]
    fn test_pickup_from_freight_pad() {
        let mut session = landed_session();
        // Run until the rocket has unloaded everything and left
        for _ in 0..5_000 {
            session.tick(idle());
            if session.rocket.state == crate::lander::RocketState::Waiting
                && !session.rocket.unloaded.is_empty()
            {
                break;
            }
        }
        assert!(!session.rocket.unloaded.is_empty());

        // Walk the craft over a crate
        session.lander.pos.x = session.rocket.unloaded[0].pos.x;
        session.tick(idle());
        assert_eq!(session.lander.cargo.len(), 1);
        assert!(session
            .take_events()
            .iter()
            .any(|e| matches!(e, GameEvent::CargoCollected(_))));
    }

    #[test]
    fn test_delivery_boosts_hashrate_and_score() {
        let mut session = landed_session();
        session.take_events();
        session.lander.cargo.push(CargoKind::Geothermal);
        session.landed_site = Some(crate::lander::LandingSite::Pad(PadRole::Geothermal));
        session.tick(idle());
        assert_eq!(session.hashrates.geothermal, 25.0);
        assert!(session
            .take_events()
            .contains(&GameEvent::CargoDelivered(CargoKind::Geothermal)));

        // Income accrues at the hashrate per second
        for _ in 0..TICK_RATE * 4 {
            session.tick(idle());
        }
        assert!(session.score() >= 99);
    }

    #[test]
    fn test_mothership_pad_repairs() {
        let mut session = started_session();
        session.take_events();
        session.lander.damage = 20.0;
        // Drop the craft just above the bay pad
        session.lander.pos = Vec2::new(
            session.mothership.x,
            session.mothership.pad_y() - session.tuning.lander_size * 1.5,
        );
        session.lander.vel = Vec2::new(0.0, 0.2);
        session.tick(idle());
        assert_eq!(session.phase, GamePhase::Landed);
        assert!(session.lander.repairing);
        assert!(session.take_events().contains(&GameEvent::RepairStarted));

        for _ in 0..TICK_RATE * 2 {
            session.tick(idle());
        }
        assert_eq!(session.lander.damage, 0.0);
        assert!(session
            .take_events()
            .contains(&GameEvent::RepairComplete));
    }

    #[test]
    fn test_restart_reseeds_sky_schedule() {
        let mut session = landed_session();
        let limit = session.tuning.sky_gap_max_ticks + session.tuning.sky_warning_ticks + 10;
        let mut event_started = false;
        for _ in 0..limit {
            session.tick(idle());
            if session
                .take_events()
                .iter()
                .any(|e| matches!(e, GameEvent::SkyStarted(_)))
            {
                event_started = true;
                break;
            }
        }
        assert!(event_started, "sky event never started");
        assert!(session.sky.active_event().is_some());

        // Crash mid-event and restart; the new run gets a fresh schedule
        session.crash();
        for _ in 0..=session.tuning.crashed_min_display_ticks {
            session.tick(idle());
        }
        session.tick(TickInput {
            start: true,
            ..Default::default()
        });
        session.tick(TickInput {
            start: true,
            ..Default::default()
        });
        assert_eq!(session.phase, GamePhase::Playing);
        assert!(session.sky.active_event().is_none());
    }

    #[test]
    fn test_deterministic_replay() {
        let script = |session: &mut LanderSession| {
            session.tick(TickInput {
                start: true,
                ..Default::default()
            });
            for i in 0..2000u32 {
                session.tick(TickInput {
                    thrust_main: i % 7 < 3,
                    thrust_left: i % 11 < 2,
                    ..Default::default()
                });
            }
        };
        let mut a = LanderSession::new(123, LanderTuning::default());
        let mut b = LanderSession::new(123, LanderTuning::default());
        script(&mut a);
        script(&mut b);
        assert_eq!(a.lander.pos, b.lander.pos);
        assert_eq!(a.lander.damage, b.lander.damage);
        assert_eq!(a.phase, b.phase);
        assert_eq!(a.score(), b.score());
    }
}
