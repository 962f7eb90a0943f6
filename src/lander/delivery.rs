//! Supply rocket and cargo flow
//!
//! A delivery rocket cycles through one state machine: it descends onto the
//! freight pad, unloads one crate per destination pad, lifts off, and waits
//! for the next scheduled delivery. The lander picks crates up off the pad
//! and flies them to the matching destination. Crates that get picked up or
//! delivered move to a fading list so the renderer can dissolve them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::lander::terrain::{Pad, PadRole};

/// Crate destination, one per delivery pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CargoKind {
    Methane,
    Geothermal,
    Nuclear,
}

impl CargoKind {
    pub const ALL: [CargoKind; 3] = [CargoKind::Methane, CargoKind::Geothermal, CargoKind::Nuclear];

    /// The pad this crate must be delivered to
    pub fn destination(&self) -> PadRole {
        match self {
            CargoKind::Methane => PadRole::Methane,
            CargoKind::Geothermal => PadRole::Geothermal,
            CargoKind::Nuclear => PadRole::Nuclear,
        }
    }
}

/// A crate sitting on the freight pad
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CargoBox {
    pub pos: Vec2,
    pub kind: CargoKind,
}

/// A crate dissolving out of the scene
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FadingBox {
    pub pos: Vec2,
    pub kind: CargoKind,
    pub ticks_left: u32,
}

/// Rocket flight state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RocketState {
    /// Parked off-screen until the next delivery is scheduled
    Waiting,
    /// Descending onto the freight pad
    Arriving,
    /// Touched down, pre-unload pause
    Landed,
    /// Pushing crates out one at a time
    Unloading,
    /// Climbing back out of the scene
    Departing,
}

/// How far a crate can be from the craft center and still be grabbed
pub const PICKUP_RADIUS: f32 = 40.0;

const DESCENT_SPEED: f32 = 1.5;
const CLIMB_SPEED: f32 = 2.0;
const LANDED_PAUSE_TICKS: u32 = 60;
const UNLOAD_INTERVAL_TICKS: u32 = 45;
const FADE_TICKS: u32 = 60;
const DEPART_ALTITUDE: f32 = -200.0;
const ROCKET_HEIGHT: f32 = 60.0;

/// The supply rocket and its cargo buckets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRocket {
    pub pos: Vec2,
    pub state: RocketState,
    /// Pad surface the rocket lands on
    pad_x: f32,
    pad_y: f32,
    pad_width: f32,
    /// Countdown inside the Landed and Unloading states
    timer: u32,
    /// Crates still inside the rocket, unloaded front to back
    manifest: Vec<CargoKind>,
    /// Crates sitting on the pad
    pub unloaded: Vec<CargoBox>,
    /// Crates dissolving after pickup or delivery
    pub fading: Vec<FadingBox>,
}

impl DeliveryRocket {
    pub fn new(freight_pad: &Pad) -> Self {
        Self {
            pos: Vec2::new(freight_pad.x + freight_pad.width / 2.0, DEPART_ALTITUDE),
            state: RocketState::Waiting,
            pad_x: freight_pad.x,
            pad_y: freight_pad.y,
            pad_width: freight_pad.width,
            timer: 0,
            manifest: Vec::new(),
            unloaded: Vec::new(),
            fading: Vec::new(),
        }
    }

    /// Begin a delivery run with a full manifest
    pub fn start_delivery(&mut self) {
        if self.state != RocketState::Waiting {
            return;
        }
        self.pos = Vec2::new(self.pad_x + self.pad_width / 2.0, DEPART_ALTITUDE);
        self.manifest = CargoKind::ALL.to_vec();
        self.state = RocketState::Arriving;
        log::debug!("delivery rocket inbound");
    }

    /// Whether every crate from the current run has left the pad
    pub fn run_complete(&self) -> bool {
        self.state == RocketState::Waiting && self.manifest.is_empty() && self.unloaded.is_empty()
    }

    /// Advance one tick
    pub fn update(&mut self) {
        match self.state {
            RocketState::Waiting => {}
            RocketState::Arriving => {
                self.pos.y += DESCENT_SPEED;
                if self.pos.y >= self.pad_y - ROCKET_HEIGHT / 2.0 {
                    self.pos.y = self.pad_y - ROCKET_HEIGHT / 2.0;
                    self.state = RocketState::Landed;
                    self.timer = LANDED_PAUSE_TICKS;
                }
            }
            RocketState::Landed => {
                self.timer = self.timer.saturating_sub(1);
                if self.timer == 0 {
                    self.state = RocketState::Unloading;
                    self.timer = UNLOAD_INTERVAL_TICKS;
                }
            }
            RocketState::Unloading => {
                self.timer = self.timer.saturating_sub(1);
                if self.timer == 0 {
                    if let Some(kind) = self.manifest.pop() {
                        // Crates line up to the left of the rocket
                        let slot = self.unloaded.len() as f32;
                        self.unloaded.push(CargoBox {
                            pos: Vec2::new(self.pad_x + 30.0 + slot * 35.0, self.pad_y - 10.0),
                            kind,
                        });
                        self.timer = UNLOAD_INTERVAL_TICKS;
                    }
                    if self.manifest.is_empty() {
                        self.state = RocketState::Departing;
                    }
                }
            }
            RocketState::Departing => {
                self.pos.y -= CLIMB_SPEED;
                if self.pos.y <= DEPART_ALTITUDE {
                    self.state = RocketState::Waiting;
                }
            }
        }

        self.fading.retain_mut(|f| {
            f.ticks_left = f.ticks_left.saturating_sub(1);
            f.ticks_left > 0
        });
    }

    /// Grab the nearest crate within reach, moving it to the fading bucket
    pub fn collect(&mut self, at: Vec2) -> Option<CargoKind> {
        let idx = self
            .unloaded
            .iter()
            .enumerate()
            .filter(|(_, b)| b.pos.distance(at) <= PICKUP_RADIUS)
            .min_by(|(_, a), (_, b)| {
                a.pos
                    .distance(at)
                    .partial_cmp(&b.pos.distance(at))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)?;
        let taken = self.unloaded.remove(idx);
        self.fading.push(FadingBox {
            pos: taken.pos,
            kind: taken.kind,
            ticks_left: FADE_TICKS,
        });
        Some(taken.kind)
    }

    /// Record a delivered crate dissolving at the destination pad
    pub fn deliver(&mut self, at: Vec2, kind: CargoKind) {
        self.fading.push(FadingBox {
            pos: at,
            kind,
            ticks_left: FADE_TICKS,
        });
    }
}
