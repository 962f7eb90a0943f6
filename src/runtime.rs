//! Fixed-timestep driver and deferred-effect scheduling
//!
//! The simulation advances at a constant tick rate regardless of display
//! refresh: wall-clock deltas are accumulated, clamped, and drained in
//! `SIM_DT` steps. Renderers interpolate between the previous and current
//! tick using `alpha()`.
//!
//! Deferred effects ("start next delivery in 3 seconds") live in an
//! epoch-tagged queue polled once per tick. A session reset bumps the epoch
//! so that entries scheduled by a previous level can never mutate the new
//! one.

use crate::consts::{MAX_FRAME_DELTA, MAX_SUBSTEPS, SIM_DT};

/// Wall-clock accumulator draining fixed simulation steps
#[derive(Debug, Clone, Default)]
pub struct FixedStepper {
    accumulator: f32,
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame's wall-clock delta, returning how many fixed ticks to
    /// run. The delta is clamped and the substep count capped so a stalled
    /// frame cannot trigger a catch-up spiral.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.min(MAX_FRAME_DELTA).max(0.0);
        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            // Drop the backlog rather than spiraling
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        steps
    }

    /// Fraction of a tick left in the accumulator, for render interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator / SIM_DT).clamp(0.0, 1.0)
    }
}

/// A queued effect due at a future simulation tick
#[derive(Debug, Clone)]
struct Deferred<E> {
    due_tick: u64,
    epoch: u64,
    effect: E,
}

/// Epoch-tagged deferred-effect queue
///
/// Effects are keyed by absolute simulation tick. `reset()` bumps the epoch
/// and discards everything pending; any entry that somehow survives a reset
/// carries a stale epoch and is dropped on drain instead of firing.
#[derive(Debug, Clone)]
pub struct DeferredQueue<E> {
    epoch: u64,
    entries: Vec<Deferred<E>>,
}

impl<E> Default for DeferredQueue<E> {
    fn default() -> Self {
        Self {
            epoch: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> DeferredQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation counter
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schedule `effect` to fire once `now + delay_ticks` is reached
    pub fn schedule(&mut self, now: u64, delay_ticks: u64, effect: E) {
        self.entries.push(Deferred {
            due_tick: now + delay_ticks,
            epoch: self.epoch,
            effect,
        });
    }

    /// Atomically discard all pending effects and invalidate stragglers
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.entries.clear();
    }

    /// Remove and return every effect due at or before `now`
    pub fn drain_due(&mut self, now: u64) -> Vec<E> {
        let epoch = self.epoch;
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].epoch != epoch {
                // Stale entry from a previous session
                self.entries.swap_remove(i);
            } else if self.entries[i].due_tick <= now {
                due.push(self.entries.swap_remove(i).effect);
            } else {
                i += 1;
            }
        }
        due
    }
}
