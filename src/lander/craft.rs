//! Lander kinematics
//!
//! Semi-implicit Euler at a fixed tick: thrust and gravity feed velocity,
//! velocity feeds position, with exponential damping toward rest. Landing is
//! a distinct kinematic regime, not a special case of free flight: while
//! landed the craft settles its residual tilt at a fixed rate and gravity is
//! off.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::lander::delivery::CargoKind;
use crate::tuning::LanderTuning;
use crate::{normalize_angle, signed_tilt};

/// Discrete thrust inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thrusters {
    pub main: bool,
    pub left: bool,
    pub right: bool,
}

impl Thrusters {
    pub fn any(&self) -> bool {
        self.main || self.left || self.right
    }
}

/// The player craft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lander {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Orientation in [0, 2π), 0 = upright
    pub angle: f32,
    pub angular_vel: f32,
    pub thrusters: Thrusters,
    /// Accumulated damage, clamped to [0, max_damage]
    pub damage: f32,
    /// Cargo held, in pickup order
    pub cargo: Vec<CargoKind>,
    /// Mid-settle: tilt is being driven to zero at a fixed rate
    pub settling: bool,
    /// Docked at the mothership repair pad
    pub repairing: bool,
    /// Severity of the most recent touchdown
    pub last_impact: f32,
    /// Previous tick pose, for render interpolation
    pub prev_pos: Vec2,
    pub prev_angle: f32,
    /// Craft half-width in pixels
    pub size: f32,
}

impl Lander {
    pub fn new(spawn: Vec2, t: &LanderTuning) -> Self {
        Self {
            pos: spawn,
            vel: Vec2::ZERO,
            angle: 0.0,
            angular_vel: 0.0,
            thrusters: Thrusters::default(),
            damage: 0.0,
            cargo: Vec::new(),
            settling: false,
            repairing: false,
            last_impact: 0.0,
            prev_pos: spawn,
            prev_angle: 0.0,
            size: t.lander_size,
        }
    }

    /// HUD-scale speed
    pub fn speed(&self, t: &LanderTuning) -> f32 {
        self.vel.length() * t.speed_scale
    }

    /// Signed tilt in [-π, π)
    pub fn tilt(&self) -> f32 {
        signed_tilt(self.angle)
    }

    /// Lowest point of the craft
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size * 1.5
    }

    /// Advance one tick. `landed` selects the settling regime.
    pub fn integrate(&mut self, landed: bool, t: &LanderTuning) {
        self.prev_pos = self.pos;
        self.prev_angle = self.angle;

        if landed {
            self.settle(t);
            return;
        }

        if self.thrusters.main {
            self.vel.x += self.angle.sin() * t.thrust_power;
            self.vel.y -= self.angle.cos() * t.thrust_power;
        }
        if self.thrusters.left {
            self.angular_vel -= t.rotation_power;
        }
        if self.thrusters.right {
            self.angular_vel += t.rotation_power;
        }

        self.vel.y += t.gravity;

        self.angular_vel *= t.rotation_damping;
        self.angle = normalize_angle(self.angle + self.angular_vel);

        self.vel *= t.damping;
        self.pos += self.vel;
    }

    /// Drive residual tilt to zero at a fixed rate, then hold still
    fn settle(&mut self, t: &LanderTuning) {
        let tilt = self.tilt();
        if tilt.abs() > 0.01 {
            self.settling = true;
            let step = -tilt.signum() * t.settling_speed;
            self.angle = normalize_angle(self.angle + step);
            if self.tilt().abs() < t.settling_speed {
                self.angle = 0.0;
                self.settling = false;
            }
        } else {
            self.angle = 0.0;
            self.angular_vel = 0.0;
            self.settling = false;
        }

        if !self.settling {
            self.vel = Vec2::ZERO;
        }
    }

    /// Graduated touchdown severity: how far past the thresholds the contact
    /// was, weighted toward speed
    pub fn landing_impact(&self, t: &LanderTuning) -> f32 {
        let speed_part = self.speed(t) / t.max_landing_speed;
        let tilt_part = self.tilt().abs();
        speed_part * 0.7 + tilt_part * 0.3
    }

    /// Apply touchdown damage; returns false when the craft is destroyed
    pub fn apply_impact(&mut self, impact: f32, t: &LanderTuning) -> bool {
        self.last_impact = impact;
        if impact > t.impact_threshold {
            self.damage =
                (self.damage + (impact - t.impact_threshold) * t.impact_damage_factor)
                    .clamp(0.0, t.max_damage);
        }
        self.damage < t.max_damage
    }

    /// Take external damage (sky events), clamped
    pub fn take_damage(&mut self, amount: f32, t: &LanderTuning) {
        self.damage = (self.damage + amount).clamp(0.0, t.max_damage);
    }

    /// One tick of docked repairs
    pub fn update_repairs(&mut self, t: &LanderTuning) {
        if self.repairing && self.damage > 0.0 {
            self.damage = (self.damage - t.repair_rate / crate::consts::TICK_RATE as f32).max(0.0);
            if self.damage == 0.0 {
                self.repairing = false;
            }
        }
    }

    /// Forward-integrate gravity-only flight for the HUD trajectory line
    pub fn predict_trajectory(&self, t: &LanderTuning) -> Vec<Vec2> {
        const STEPS: usize = 100;
        const STEP_SIZE: f32 = 2.0;
        let mut points = Vec::with_capacity(STEPS);
        let mut pos = self.pos;
        let mut vel = self.vel;
        for _ in 0..STEPS {
            vel.y += t.gravity * STEP_SIZE;
            pos += vel * STEP_SIZE;
            points.push(pos);
        }
        points
    }
}
