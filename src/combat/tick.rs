//! Fixed-tick state machine for the combat session
//!
//! Velocities are pixels per second and positions advance by `SIM_DT`.
//! Within a tick: input and ship motion, projectile motion, hazards, hit
//! resolution, enemy logic, tokens, timers, then level bookkeeping.

use glam::Vec2;

use crate::combat::belt::{self, Belt};
use crate::combat::collision::{
    circles_touch, damage_asteroid, swept_hit, wrapped_distance, wrapped_offset, HitOutcome,
};
use crate::combat::scheduler;
use crate::combat::state::{
    Asteroid, CombatDeferred, CombatEvent, CombatInput, CombatPhase, CombatSession, Durability,
    EnemyLaser, EnemyShip, Laser, PowerUpKind, Ship, TokenKind,
};
use crate::consts::SIM_DT;
use crate::geom::point_segment_distance;
use crate::tuning::CombatTuning;

/// Bolts in the immediate radial volley granted by a laser burst token
const BURST_BOLTS: u32 = 12;

/// Spread-shot side bolt deflection (radians)
const SPREAD_ANGLE: f32 = 0.2;

/// Wrap a coordinate so a body fully leaves one edge before entering the
/// opposite one
fn wrap_body(v: f32, radius: f32, extent: f32) -> f32 {
    if v < -radius {
        v + extent + 2.0 * radius
    } else if v > extent + radius {
        v - extent - 2.0 * radius
    } else {
        v
    }
}

impl CombatSession {
    /// Advance the session by one fixed tick
    pub fn tick(&mut self, input: CombatInput) {
        if input.pause && matches!(self.phase, CombatPhase::Playing | CombatPhase::Exploding) {
            self.paused = !self.paused;
            self.events.push(CombatEvent::Paused(self.paused));
        }
        if self.paused {
            return;
        }
        self.tick += 1;

        match self.phase {
            CombatPhase::Welcome | CombatPhase::GameOver => {
                if input.start {
                    self.start_run();
                }
            }
            CombatPhase::Playing => self.tick_playing(input),
            CombatPhase::Exploding => self.tick_exploding(),
        }
    }

    fn start_run(&mut self) {
        self.score = 0;
        self.lives = self.tuning.lives;
        self.ship = Ship::new(self.field_center());
        self.lasers.clear();
        self.enemy = None;
        self.enemy_lasers.clear();
        self.tokens.clear();
        self.phase = CombatPhase::Playing;
        self.events.push(CombatEvent::Started);
        self.start_level(1);
    }

    fn start_level(&mut self, level: u32) {
        let t = self.tuning.clone();
        self.level = level;
        self.lasers.clear();
        self.enemy = None;
        self.enemy_lasers.clear();
        self.deferred.reset();
        self.ship.protection_ticks = t.spawn_protection_ticks;

        // Regeneration itself is retried; an empty belt should only be
        // possible with broken tuning, and even then the level must start
        let mut belt = None;
        for attempt in 0..t.max_spawn_attempts {
            let mut next_id = self.next_asteroid_id;
            let ship_pos = self.ship.pos;
            match belt::generate(
                &mut self.rng,
                level + attempt,
                ship_pos,
                &mut || {
                    let id = next_id;
                    next_id += 1;
                    id
                },
                &t,
            ) {
                Ok(b) => {
                    self.next_asteroid_id = next_id;
                    belt = Some(b);
                    break;
                }
                Err(err) => log::warn!("belt generation failed, retrying: {err}"),
            }
        }
        let belt = belt.unwrap_or_else(|| {
            log::error!("belt generation kept failing, seeding a single body");
            let id = self.alloc_asteroid_id();
            let a = belt::new_asteroid(
                &mut self.rng,
                id,
                Vec2::new(t.asteroid_size, t.asteroid_size),
                t.asteroid_size / 2.0,
                t.asteroid_speed,
                Durability::Simple,
                &t,
            );
            Belt {
                asteroids: vec![a],
                special: None,
                black_hole: None,
                laser_grid: None,
            }
        });

        self.asteroids = belt.asteroids;
        self.special = belt.special;
        self.black_hole = belt.black_hole;
        self.laser_grid = belt.laser_grid;

        self.malfunctions = scheduler::roll_level_malfunctions(&mut self.rng, level, &t);
        for &kind in &self.malfunctions {
            self.events.push(CombatEvent::MalfunctionRolled(kind));
            log::info!("level {level} malfunction: {kind:?}");
        }

        // Special levels are crowded enough without a saucer
        if self.special.is_none() {
            let delay = scheduler::enemy_spawn_delay(&mut self.rng, &t);
            self.deferred
                .schedule(self.tick, delay, CombatDeferred::SpawnEnemy);
        }

        self.events.push(CombatEvent::LevelStarted {
            level,
            special: self.special,
        });
    }

    fn tick_playing(&mut self, input: CombatInput) {
        let t = self.tuning.clone();

        let turn_mult = if self.malfunctions.contains(&crate::combat::MalfunctionKind::Steering) {
            0.3
        } else {
            1.0
        };
        let thrust_mult = if self.malfunctions.contains(&crate::combat::MalfunctionKind::Engine) {
            0.5
        } else {
            1.0
        };
        let laser_cap = if self.malfunctions.contains(&crate::combat::MalfunctionKind::Weapons) {
            t.laser_max / 2
        } else {
            t.laser_max
        };

        // Ship motion
        self.ship.prev_pos = self.ship.pos;
        self.ship.prev_angle = self.ship.angle;
        let turn = t.turn_speed.to_radians() * SIM_DT * turn_mult;
        if input.turn_left {
            self.ship.angle = crate::normalize_angle(self.ship.angle - turn);
        }
        if input.turn_right {
            self.ship.angle = crate::normalize_angle(self.ship.angle + turn);
        }
        if input.thrust {
            self.ship.vel += self.ship.heading() * t.ship_thrust * thrust_mult;
        } else {
            // Friction only bleeds speed while coasting
            self.ship.vel *= 1.0 - t.friction * SIM_DT;
        }
        self.ship.pos += self.ship.vel * SIM_DT;
        self.ship.pos.x = wrap_body(self.ship.pos.x, t.ship_radius, t.field_width);
        self.ship.pos.y = wrap_body(self.ship.pos.y, t.ship_radius, t.field_height);

        if input.fire && self.lasers.len() < laser_cap {
            self.fire_lasers(laser_cap, &t);
        }

        self.move_projectiles(&t);
        self.move_asteroids(&t);
        self.apply_black_hole(&t);
        self.apply_laser_grid(&t);
        if self.phase != CombatPhase::Playing {
            return;
        }

        self.resolve_laser_hits(&t);
        self.resolve_ship_hits(&t);
        if self.phase != CombatPhase::Playing {
            return;
        }

        self.tick_enemy(&t);
        if self.phase != CombatPhase::Playing {
            return;
        }

        self.tick_tokens(&t);
        self.tick_timers();

        if let Some(token) = scheduler::maybe_spawn_token(&mut self.rng, &t) {
            self.events.push(CombatEvent::TokenSpawned(token.kind));
            self.tokens.push(token);
        }

        for effect in self.deferred.drain_due(self.tick) {
            match effect {
                CombatDeferred::SpawnEnemy => self.spawn_enemy(&t),
            }
        }

        if self.asteroids.is_empty() {
            self.events
                .push(CombatEvent::LevelCleared { level: self.level });
            log::info!("level {} cleared, score {}", self.level, self.score);
            self.start_level(self.level + 1);
        }
    }

    fn fire_lasers(&mut self, cap: usize, t: &CombatTuning) {
        let nose = self.ship.pos + self.ship.heading() * t.ship_radius;
        let mut bolts = vec![self.ship.angle];
        if self.ship.spread_ticks > 0 {
            bolts.push(self.ship.angle - SPREAD_ANGLE);
            bolts.push(self.ship.angle + SPREAD_ANGLE);
        }
        if self.ship.rear_laser_ticks > 0 {
            bolts.push(self.ship.angle + std::f32::consts::PI);
        }
        for angle in bolts {
            // A spread or rear volley never overfills the magazine
            if self.lasers.len() >= cap {
                break;
            }
            let dir = Vec2::new(angle.sin(), -angle.cos());
            self.lasers.push(Laser {
                pos: nose,
                prev_pos: nose,
                vel: dir * t.laser_speed,
                traveled: 0.0,
            });
        }
        self.events.push(CombatEvent::LaserFired);
    }

    /// Radial volley from a laser burst token, cap ignored
    fn fire_burst(&mut self, t: &CombatTuning) {
        for i in 0..BURST_BOLTS {
            let angle = i as f32 / BURST_BOLTS as f32 * std::f32::consts::TAU;
            let dir = Vec2::new(angle.sin(), -angle.cos());
            let pos = self.ship.pos + dir * t.ship_radius;
            self.lasers.push(Laser {
                pos,
                prev_pos: pos,
                vel: dir * t.laser_speed,
                traveled: 0.0,
            });
        }
        self.events.push(CombatEvent::LaserFired);
    }

    fn move_projectiles(&mut self, t: &CombatTuning) {
        let range = t.field_width * t.laser_range_factor;
        self.lasers.retain_mut(|l| {
            l.prev_pos = l.pos;
            l.pos += l.vel * SIM_DT;
            l.traveled += l.vel.length() * SIM_DT;
            l.pos.x = wrap_body(l.pos.x, 0.0, t.field_width);
            l.pos.y = wrap_body(l.pos.y, 0.0, t.field_height);
            l.traveled <= range
        });
        self.enemy_lasers.retain_mut(|l| {
            l.prev_pos = l.pos;
            l.pos += l.vel * SIM_DT;
            l.traveled += l.vel.length() * SIM_DT;
            l.pos.x = wrap_body(l.pos.x, 0.0, t.field_width);
            l.pos.y = wrap_body(l.pos.y, 0.0, t.field_height);
            l.traveled <= t.field_width
        });
    }

    fn move_asteroids(&mut self, t: &CombatTuning) {
        for a in &mut self.asteroids {
            a.prev_pos = a.pos;
            a.pos += a.vel * SIM_DT;
            a.angle += a.spin * SIM_DT;
            let r = a.hit_radius();
            a.pos.x = wrap_body(a.pos.x, r, t.field_width);
            a.pos.y = wrap_body(a.pos.y, r, t.field_height);
        }
    }

    fn apply_black_hole(&mut self, t: &CombatTuning) {
        let Some(hole) = self.black_hole else {
            return;
        };
        for a in &mut self.asteroids {
            let offset = wrapped_offset(a.pos, hole.pos, t);
            let d = offset.length();
            if d > 1.0 && d < hole.pull_radius {
                a.vel += offset / d * t.black_hole_force * (1.0 - d / hole.pull_radius) * 60.0;
            }
        }
        let offset = wrapped_offset(self.ship.pos, hole.pos, t);
        let d = offset.length();
        if d > 1.0 && d < hole.pull_radius {
            self.ship.vel +=
                offset / d * t.black_hole_force * (1.0 - d / hole.pull_radius) * 60.0;
        }
        if d <= hole.radius && !self.ship.invulnerable() {
            self.explode_ship();
        }
    }

    fn apply_laser_grid(&mut self, t: &CombatTuning) {
        let Some(grid) = &mut self.laser_grid else {
            return;
        };
        grid.angle = crate::normalize_angle(grid.angle + t.laser_grid_rotation_speed * SIM_DT);
        let grid = *grid;
        if self.ship.invulnerable() {
            return;
        }
        let center = self.field_center();
        let length = t.field_width.max(t.field_height);
        for i in 0..grid.beams {
            let angle = grid.angle + i as f32 / grid.beams as f32 * std::f32::consts::TAU;
            let end = center + Vec2::new(angle.cos(), angle.sin()) * length;
            if point_segment_distance(self.ship.pos, center, end)
                <= t.ship_radius * t.ship_hitbox_scale
            {
                self.explode_ship();
                return;
            }
        }
    }

    fn resolve_laser_hits(&mut self, t: &CombatTuning) {
        let mut i = 0;
        while i < self.lasers.len() {
            let laser = self.lasers[i];
            let mut consumed = false;
            for j in 0..self.asteroids.len() {
                let hit = swept_hit(
                    laser.prev_pos,
                    laser.pos,
                    self.asteroids[j].pos,
                    self.asteroids[j].hit_radius(),
                    t,
                );
                if hit {
                    consumed = true;
                    match damage_asteroid(&mut self.asteroids[j]) {
                        HitOutcome::Hit { id } => {
                            self.events.push(CombatEvent::AsteroidHit { id });
                        }
                        HitOutcome::Destroyed { .. } => {
                            let dead = self.asteroids.swap_remove(j);
                            self.shatter(dead, t);
                        }
                    }
                    break;
                }
            }
            if consumed {
                self.lasers.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Score a destroyed body and spawn its children
    fn shatter(&mut self, dead: Asteroid, t: &CombatTuning) {
        let points = if dead.radius >= t.asteroid_size / 2.0 {
            t.score_large
        } else if dead.radius >= t.asteroid_size / 4.0 {
            t.score_medium
        } else {
            t.score_small
        };
        self.score += points;
        self.events.push(CombatEvent::AsteroidDestroyed {
            id: dead.id,
            score: points,
        });

        match dead.durability {
            Durability::Durable { .. } => {
                // A durable body bursts into a ring of fragments
                for _ in 0..t.monster_fragments {
                    let id = self.alloc_asteroid_id();
                    let a = belt::new_asteroid(
                        &mut self.rng,
                        id,
                        dead.pos,
                        dead.radius / 3.0,
                        t.asteroid_speed,
                        Durability::Simple,
                        t,
                    );
                    self.asteroids.push(a);
                }
            }
            Durability::Simple => {
                if dead.radius > t.asteroid_size / t.min_split_radius_divisor {
                    for _ in 0..2 {
                        let id = self.alloc_asteroid_id();
                        let a = belt::new_asteroid(
                            &mut self.rng,
                            id,
                            dead.pos,
                            dead.radius / 2.0,
                            t.asteroid_speed,
                            Durability::Simple,
                            t,
                        );
                        self.asteroids.push(a);
                    }
                }
            }
        }
    }

    fn resolve_ship_hits(&mut self, t: &CombatTuning) {
        if self.ship.invulnerable() {
            return;
        }
        let hitbox = t.ship_radius * t.ship_hitbox_scale;
        let hit = self
            .asteroids
            .iter()
            .any(|a| circles_touch(self.ship.pos, hitbox, a.pos, a.hit_radius(), t));
        if hit {
            self.explode_ship();
        }
    }

    fn spawn_enemy(&mut self, t: &CombatTuning) {
        use rand::Rng;
        // Enter from a random field edge
        let pos = match self.rng.random_range(0..4u32) {
            0 => Vec2::new(0.0, self.rng.random::<f32>() * t.field_height),
            1 => Vec2::new(t.field_width, self.rng.random::<f32>() * t.field_height),
            2 => Vec2::new(self.rng.random::<f32>() * t.field_width, 0.0),
            _ => Vec2::new(self.rng.random::<f32>() * t.field_width, t.field_height),
        };
        self.enemy = Some(EnemyShip {
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            shoot_timer: t.enemy_shoot_interval_ticks,
        });
        self.events.push(CombatEvent::EnemySpawned);
        log::debug!("enemy spawned at {pos}");
    }

    fn tick_enemy(&mut self, t: &CombatTuning) {
        let Some(mut enemy) = self.enemy else {
            return;
        };

        // Chase the ship along the shortest wrapped path
        enemy.prev_pos = enemy.pos;
        let offset = wrapped_offset(enemy.pos, self.ship.pos, t);
        if offset.length() > 1.0 {
            enemy.vel = offset.normalize() * t.enemy_speed * 60.0;
        }
        enemy.pos += enemy.vel * SIM_DT;
        enemy.pos.x = wrap_body(enemy.pos.x, t.enemy_size, t.field_width);
        enemy.pos.y = wrap_body(enemy.pos.y, t.enemy_size, t.field_height);

        enemy.shoot_timer = enemy.shoot_timer.saturating_sub(1);
        if enemy.shoot_timer == 0 {
            enemy.shoot_timer = t.enemy_shoot_interval_ticks;
            let dir = wrapped_offset(enemy.pos, self.ship.pos, t).normalize_or_zero();
            if dir != Vec2::ZERO {
                self.enemy_lasers.push(EnemyLaser {
                    pos: enemy.pos,
                    prev_pos: enemy.pos,
                    vel: dir * t.enemy_laser_speed,
                    traveled: 0.0,
                });
                self.events.push(CombatEvent::EnemyFired);
            }
        }

        // Player lasers vs the enemy
        let mut destroyed = false;
        let mut i = 0;
        while i < self.lasers.len() {
            let laser = self.lasers[i];
            if swept_hit(laser.prev_pos, laser.pos, enemy.pos, t.enemy_size, t) {
                self.lasers.swap_remove(i);
                destroyed = true;
                break;
            }
            i += 1;
        }
        if destroyed {
            self.score += t.score_enemy;
            self.events.push(CombatEvent::EnemyDestroyed {
                score: t.score_enemy,
            });
            let token = scheduler::bitcoin_token(&mut self.rng, enemy.pos, t);
            self.events.push(CombatEvent::TokenSpawned(token.kind));
            self.tokens.push(token);
            self.enemy = None;
            let delay = scheduler::enemy_spawn_delay(&mut self.rng, t);
            self.deferred
                .schedule(self.tick, delay, CombatDeferred::SpawnEnemy);
            return;
        }
        self.enemy = Some(enemy);

        // Enemy fire and ramming vs the ship
        if self.ship.invulnerable() {
            return;
        }
        let hitbox = t.ship_radius * t.ship_hitbox_scale;
        let shot_down = self
            .enemy_lasers
            .iter()
            .any(|l| swept_hit(l.prev_pos, l.pos, self.ship.pos, hitbox, t));
        if shot_down || circles_touch(self.ship.pos, hitbox, enemy.pos, t.enemy_size, t) {
            self.explode_ship();
        }
    }

    fn tick_tokens(&mut self, t: &CombatTuning) {
        for token in &mut self.tokens {
            token.pos += token.vel * SIM_DT;
            token.pos.x = wrap_body(token.pos.x, 0.0, t.field_width);
            token.pos.y = wrap_body(token.pos.y, 0.0, t.field_height);
            token.ticks_left = token.ticks_left.saturating_sub(1);
        }

        let ship_pos = self.ship.pos;
        let mut collected = Vec::new();
        self.tokens.retain(|token| {
            if token.ticks_left == 0 {
                return false;
            }
            if wrapped_distance(ship_pos, token.pos, t) <= t.token_collect_radius {
                collected.push(token.kind);
                return false;
            }
            true
        });

        for kind in collected {
            self.events.push(CombatEvent::TokenCollected(kind));
            match kind {
                TokenKind::Bitcoin { reward } => {
                    self.score += reward;
                    log::info!("bitcoin collected: +{reward}");
                }
                TokenKind::PowerUp(PowerUpKind::RearLaser) => {
                    self.ship.rear_laser_ticks = t.power_up_duration_ticks;
                }
                TokenKind::PowerUp(PowerUpKind::SpreadShot) => {
                    self.ship.spread_ticks = t.power_up_duration_ticks;
                }
                TokenKind::PowerUp(PowerUpKind::Shield) => {
                    self.ship.shield_ticks = t.shield_duration_ticks;
                }
                TokenKind::PowerUp(PowerUpKind::LaserBurst) => {
                    self.fire_burst(t);
                }
                TokenKind::Repair => {
                    self.lives += 1;
                    log::info!("repair kit collected, {} lives", self.lives);
                }
            }
        }
    }

    fn tick_timers(&mut self) {
        self.ship.protection_ticks = self.ship.protection_ticks.saturating_sub(1);
        for (ticks, kind) in [
            (&mut self.ship.shield_ticks, PowerUpKind::Shield),
            (&mut self.ship.rear_laser_ticks, PowerUpKind::RearLaser),
            (&mut self.ship.spread_ticks, PowerUpKind::SpreadShot),
        ] {
            if *ticks == 1 {
                self.events.push(CombatEvent::PowerUpExpired(kind));
            }
            *ticks = ticks.saturating_sub(1);
        }
    }

    fn explode_ship(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.phase = CombatPhase::Exploding;
        self.explode_ticks_left = self.tuning.explode_ticks;
        self.events.push(CombatEvent::ShipExploded);
        log::info!("ship destroyed, {} lives left", self.lives);
    }

    fn tick_exploding(&mut self) {
        self.explode_ticks_left = self.explode_ticks_left.saturating_sub(1);
        if self.explode_ticks_left > 0 {
            return;
        }
        if self.lives > 0 {
            self.ship = Ship::new(self.field_center());
            self.ship.protection_ticks = self.tuning.spawn_protection_ticks;
            self.phase = CombatPhase::Playing;
            self.events.push(CombatEvent::Respawned);
        } else {
            self.phase = CombatPhase::GameOver;
            self.events.push(CombatEvent::GameOver { score: self.score });
            log::info!("game over, final score {}", self.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::state::Token;
    use crate::tuning::CombatTuning;

    fn started() -> CombatSession {
        let mut session = CombatSession::new(17, CombatTuning::default());
        session.tick(CombatInput {
            start: true,
            ..Default::default()
        });
        session
    }

    fn idle() -> CombatInput {
        CombatInput::default()
    }

    fn lone_asteroid(session: &mut CombatSession, radius: f32, durability: Durability) {
        let pos = session.ship.pos + Vec2::new(0.0, -200.0);
        let id = session.alloc_asteroid_id();
        session.asteroids = vec![Asteroid {
            id,
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            radius,
            angle: 0.0,
            spin: 0.0,
            offsets: vec![1.0; 10],
            durability,
        }];
    }

    #[test]
    fn test_start_enters_level_one() {
        let mut session = started();
        assert_eq!(session.phase, CombatPhase::Playing);
        assert_eq!(session.level, 1);
        assert_eq!(session.asteroids.len(), 4);
        let events = session.take_events();
        assert!(events.contains(&CombatEvent::Started));
        assert!(events.contains(&CombatEvent::LevelStarted {
            level: 1,
            special: None
        }));
    }

    #[test]
    fn test_laser_cap_enforced() {
        let mut session = started();
        session.asteroids.clear();
        session.asteroids.push(far_corner_asteroid());
        for _ in 0..30 {
            session.tick(CombatInput {
                fire: true,
                ..Default::default()
            });
        }
        assert!(session.lasers.len() <= session.tuning.laser_max);
    }

    fn far_corner_asteroid() -> Asteroid {
        // Keeps the level from clearing without interfering with the ship
        Asteroid {
            id: 999,
            pos: Vec2::new(60.0, 60.0),
            prev_pos: Vec2::new(60.0, 60.0),
            vel: Vec2::ZERO,
            radius: 10.0,
            angle: 0.0,
            spin: 0.0,
            offsets: vec![1.0; 10],
            durability: Durability::Simple,
        }
    }

    #[test]
    fn test_wrapping_bolt_cannot_hit_behind_the_ship() {
        let mut session = started();
        session.asteroids.clear();
        // A stationary rock well behind the ship; a bolt fired away from it
        // wraps the right edge but runs out of range long before coming back
        let pos = Vec2::new(1000.0, 100.0);
        session.asteroids.push(Asteroid {
            id: 4242,
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            radius: 30.0,
            angle: 0.0,
            spin: 0.0,
            offsets: vec![1.0; 10],
            durability: Durability::Simple,
        });
        session.ship.pos = Vec2::new(1240.0, 100.0);
        session.ship.prev_pos = session.ship.pos;
        session.ship.vel = Vec2::ZERO;
        session.ship.angle = std::f32::consts::FRAC_PI_2; // nose along +x
        session.take_events();
        session.tick(CombatInput {
            fire: true,
            ..Default::default()
        });
        for _ in 0..120 {
            session.tick(idle());
        }
        assert_eq!(session.asteroids.len(), 1);
        assert!(session.lasers.is_empty(), "bolt must expire at its range");
    }

    #[test]
    fn test_volley_respects_magazine_cap() {
        let mut session = started();
        session.asteroids.clear();
        session.asteroids.push(far_corner_asteroid());
        session.ship.spread_ticks = 10_000;
        session.ship.rear_laser_ticks = 10_000;
        for _ in 0..30 {
            session.tick(CombatInput {
                fire: true,
                ..Default::default()
            });
        }
        assert!(session.lasers.len() <= session.tuning.laser_max);
    }

    #[test]
    fn test_weapons_malfunction_halves_cap() {
        let mut session = started();
        session.asteroids.clear();
        session.asteroids.push(far_corner_asteroid());
        session.malfunctions = vec![crate::combat::MalfunctionKind::Weapons];
        for _ in 0..30 {
            session.tick(CombatInput {
                fire: true,
                ..Default::default()
            });
        }
        assert!(session.lasers.len() <= session.tuning.laser_max / 2);
    }

    #[test]
    fn test_steering_malfunction_slows_turn() {
        let turn = |malfunctions: Vec<crate::combat::MalfunctionKind>| {
            let mut session = started();
            session.malfunctions = malfunctions;
            let before = session.ship.angle;
            session.tick(CombatInput {
                turn_right: true,
                ..Default::default()
            });
            crate::signed_tilt(session.ship.angle - before)
        };
        let healthy = turn(Vec::new());
        let degraded = turn(vec![crate::combat::MalfunctionKind::Steering]);
        assert!((degraded - healthy * 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_large_asteroid_splits_and_scores() {
        let mut session = started();
        lone_asteroid(&mut session, 50.0, Durability::Simple);
        session.take_events();
        session.tick(CombatInput {
            fire: true,
            ..Default::default()
        });
        // Let the bolt fly the 200px gap
        for _ in 0..60 {
            session.tick(idle());
            if session
                .take_events()
                .iter()
                .any(|e| matches!(e, CombatEvent::AsteroidDestroyed { .. }))
            {
                assert_eq!(session.score, session.tuning.score_large);
                assert_eq!(session.asteroids.len(), 2);
                for child in &session.asteroids {
                    assert_eq!(child.radius, 25.0);
                }
                return;
            }
        }
        panic!("asteroid never destroyed");
    }

    #[test]
    fn test_small_asteroid_does_not_split() {
        let mut session = started();
        lone_asteroid(&mut session, 12.0, Durability::Simple);
        let dead = session.asteroids.pop().unwrap();
        let t = session.tuning.clone();
        session.shatter(dead, &t);
        assert!(session.asteroids.is_empty());
        assert_eq!(session.score, t.score_small);
    }

    #[test]
    fn test_durable_body_soaks_then_fragments() {
        let mut session = started();
        lone_asteroid(&mut session, 150.0, Durability::Durable { health: 3 });
        let id = session.asteroids[0].id;

        for _ in 0..2 {
            match damage_asteroid(&mut session.asteroids[0]) {
                HitOutcome::Hit { id: hit } => assert_eq!(hit, id),
                other => panic!("expected soak, got {other:?}"),
            }
        }
        match damage_asteroid(&mut session.asteroids[0]) {
            HitOutcome::Destroyed { id: hit } => assert_eq!(hit, id),
            other => panic!("expected destruction, got {other:?}"),
        }
        let dead = session.asteroids.remove(0);
        let t = session.tuning.clone();
        session.shatter(dead, &t);
        assert_eq!(session.asteroids.len(), t.monster_fragments as usize);
        for frag in &session.asteroids {
            assert_eq!(frag.durability, Durability::Simple);
            assert_eq!(frag.radius, 50.0);
        }
    }

    #[test]
    fn test_ship_collision_costs_a_life() {
        let mut session = started();
        session.ship.protection_ticks = 0;
        let id = session.alloc_asteroid_id();
        let pos = session.ship.pos;
        session.asteroids = vec![Asteroid {
            id,
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            radius: 40.0,
            angle: 0.0,
            spin: 0.0,
            offsets: vec![1.0; 10],
            durability: Durability::Simple,
        }];
        session.tick(idle());
        assert_eq!(session.phase, CombatPhase::Exploding);
        assert_eq!(session.lives, session.tuning.lives - 1);

        // Explosion runs its course, then the ship respawns protected
        for _ in 0..session.tuning.explode_ticks {
            session.tick(idle());
        }
        assert_eq!(session.phase, CombatPhase::Playing);
        assert!(session.ship.protection_ticks > 0);
        assert!(session
            .take_events()
            .contains(&CombatEvent::Respawned));

        // Protection holds while the rock is still overlapping the spawn
        session.tick(idle());
        assert_eq!(session.phase, CombatPhase::Playing);
    }

    #[test]
    fn test_game_over_after_last_life() {
        let mut session = started();
        session.lives = 1;
        session.score = 12_345;
        session.explode_ship();
        for _ in 0..session.tuning.explode_ticks + 1 {
            session.tick(idle());
        }
        assert_eq!(session.phase, CombatPhase::GameOver);
        assert!(session
            .take_events()
            .contains(&CombatEvent::GameOver { score: 12_345 }));

        // Restart wipes the run
        session.tick(CombatInput {
            start: true,
            ..Default::default()
        });
        assert_eq!(session.phase, CombatPhase::Playing);
        assert_eq!(session.level, 1);
        assert_eq!(session.lives, session.tuning.lives);
        assert_eq!(session.score, 0);
    }

    #[test]
    fn test_clearing_belt_advances_level() {
        let mut session = started();
        session.asteroids.clear();
        lone_asteroid(&mut session, 10.0, Durability::Simple);
        let dead = session.asteroids.remove(0);
        let t = session.tuning.clone();
        session.shatter(dead, &t);
        session.take_events();
        session.tick(idle());
        assert_eq!(session.level, 2);
        assert!(!session.asteroids.is_empty());
        let events = session.take_events();
        assert!(events.contains(&CombatEvent::LevelCleared { level: 1 }));
        assert!(events
            .iter()
            .any(|e| matches!(e, CombatEvent::LevelStarted { level: 2, .. })));
    }

    #[test]
    fn test_black_hole_pulls_ship() {
        let mut session = started();
        session.asteroids.clear();
        session.asteroids.push(far_corner_asteroid());
        session.black_hole = Some(crate::combat::BlackHole {
            pos: session.ship.pos + Vec2::new(300.0, 0.0),
            radius: 20.0,
            pull_radius: 500.0,
        });
        for _ in 0..30 {
            session.tick(idle());
        }
        assert!(session.ship.vel.x > 0.0);
    }

    #[test]
    fn test_black_hole_core_is_lethal() {
        let mut session = started();
        session.ship.protection_ticks = 0;
        session.asteroids.clear();
        session.asteroids.push(far_corner_asteroid());
        session.black_hole = Some(crate::combat::BlackHole {
            pos: session.ship.pos,
            radius: 20.0,
            pull_radius: 500.0,
        });
        session.tick(idle());
        assert_eq!(session.phase, CombatPhase::Exploding);
    }

    #[test]
    fn test_laser_grid_beam_is_lethal() {
        let mut session = started();
        session.ship.protection_ticks = 0;
        session.asteroids.clear();
        session.asteroids.push(far_corner_asteroid());
        session.laser_grid = Some(crate::combat::LaserGrid {
            angle: 0.0,
            beams: 4,
        });
        // Park the ship on the first beam (pointing along +x from center)
        session.ship.pos = session.field_center() + Vec2::new(100.0, 0.0);
        session.ship.vel = Vec2::ZERO;
        session.tick(idle());
        assert_eq!(session.phase, CombatPhase::Exploding);
    }

    #[test]
    fn test_bitcoin_token_pays_out() {
        let mut session = started();
        session.take_events();
        session.tokens.push(Token {
            pos: session.ship.pos,
            vel: Vec2::ZERO,
            kind: TokenKind::Bitcoin { reward: 70_000 },
            ticks_left: 600,
        });
        session.tick(idle());
        assert_eq!(session.score, 70_000);
        assert!(!session
            .tokens
            .iter()
            .any(|tok| matches!(tok.kind, TokenKind::Bitcoin { .. })));
        assert!(session.take_events().iter().any(|e| matches!(
            e,
            CombatEvent::TokenCollected(TokenKind::Bitcoin { .. })
        )));
    }

    #[test]
    fn test_shield_token_grants_invulnerability() {
        let mut session = started();
        session.ship.protection_ticks = 0;
        session.tokens.push(Token {
            pos: session.ship.pos,
            vel: Vec2::ZERO,
            kind: TokenKind::PowerUp(PowerUpKind::Shield),
            ticks_left: 600,
        });
        session.tick(idle());
        assert!(session.ship.shield_ticks > 0);
        assert!(session.ship.invulnerable());
    }

    #[test]
    fn test_burst_token_fires_volley() {
        let mut session = started();
        session.asteroids.clear();
        session.asteroids.push(far_corner_asteroid());
        session.tokens.push(Token {
            pos: session.ship.pos,
            vel: Vec2::ZERO,
            kind: TokenKind::PowerUp(PowerUpKind::LaserBurst),
            ticks_left: 600,
        });
        session.tick(idle());
        assert!(session.lasers.len() >= BURST_BOLTS as usize);
    }

    #[test]
    fn test_enemy_lifecycle() {
        let mut session = started();
        session.asteroids.clear();
        session.asteroids.push(far_corner_asteroid());
        session.ship.pos = Vec2::new(200.0, 600.0);
        let t = session.tuning.clone();
        session.spawn_enemy(&t);
        assert!(session.enemy.is_some());
        session.take_events();

        // It closes in and eventually shoots
        let mut fired = false;
        for _ in 0..t.enemy_shoot_interval_ticks + 5 {
            session.tick(idle());
            if session.take_events().contains(&CombatEvent::EnemyFired) {
                fired = true;
                break;
            }
            if session.phase != CombatPhase::Playing {
                break;
            }
        }
        assert!(fired, "enemy never fired");
    }

    #[test]
    fn test_enemy_kill_drops_bounty() {
        let mut session = started();
        session.asteroids.clear();
        session.asteroids.push(far_corner_asteroid());
        let t = session.tuning.clone();
        session.enemy = Some(EnemyShip {
            pos: session.ship.pos + Vec2::new(0.0, -150.0),
            prev_pos: session.ship.pos + Vec2::new(0.0, -150.0),
            vel: Vec2::ZERO,
            shoot_timer: 10_000,
        });
        session.take_events();
        session.tick(CombatInput {
            fire: true,
            ..Default::default()
        });
        let mut destroyed = false;
        for _ in 0..60 {
            session.tick(idle());
            if session
                .take_events()
                .iter()
                .any(|e| matches!(e, CombatEvent::EnemyDestroyed { .. }))
            {
                destroyed = true;
                break;
            }
        }
        assert!(destroyed, "enemy survived the bolt");
        assert_eq!(session.score, t.score_enemy);
        assert!(session.enemy.is_none());
        assert!(session
            .tokens
            .iter()
            .any(|tok| matches!(tok.kind, TokenKind::Bitcoin { .. })));
    }

    #[test]
    fn test_spawn_protection_expires() {
        let mut session = started();
        let ticks = session.ship.protection_ticks;
        assert!(ticks > 0);
        for _ in 0..ticks {
            session.tick(idle());
        }
        assert_eq!(session.ship.protection_ticks, 0);
    }

    #[test]
    fn test_pause_freezes_everything() {
        let mut session = started();
        let before_tick = session.tick;
        let before_pos = session.ship.pos;
        session.tick(CombatInput {
            pause: true,
            thrust: true,
            ..Default::default()
        });
        session.tick(CombatInput {
            thrust: true,
            ..Default::default()
        });
        assert_eq!(session.tick, before_tick);
        assert_eq!(session.ship.pos, before_pos);
    }

    #[test]
    fn test_deterministic_replay() {
        let script = |session: &mut CombatSession| {
            session.tick(CombatInput {
                start: true,
                ..Default::default()
            });
            for i in 0..3000u32 {
                session.tick(CombatInput {
                    thrust: i % 5 < 2,
                    turn_right: i % 3 == 0,
                    fire: i % 9 == 0,
                    ..Default::default()
                });
            }
        };
        let mut a = CombatSession::new(99, CombatTuning::default());
        let mut b = CombatSession::new(99, CombatTuning::default());
        script(&mut a);
        script(&mut b);
        assert_eq!(a.ship.pos, b.ship.pos);
        assert_eq!(a.score, b.score);
        assert_eq!(a.level, b.level);
        assert_eq!(a.lives, b.lives);
        assert_eq!(a.asteroids.len(), b.asteroids.len());
    }
}
