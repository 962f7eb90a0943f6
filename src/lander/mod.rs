//! Cargo-delivery lander simulation
//!
//! Deterministic, headless, fixed timestep. The session owns everything:
//! craft, terrain, mothership, delivery rocket, sky events, and the deferred
//! queue. Renderers consume `Snapshot`s, audio consumes drained
//! `GameEvent`s.

pub mod collision;
pub mod craft;
pub mod delivery;
pub mod sky;
pub mod state;
pub mod terrain;
pub mod tick;

pub use collision::{LandingSite, Mothership, Outcome};
pub use craft::Lander;
pub use delivery::{CargoKind, DeliveryRocket, RocketState};
pub use sky::{SkyEvent, SkyEventManager};
pub use state::{GameEvent, GamePhase, LanderSession, Snapshot, TickInput};
pub use terrain::{Pad, PadRole, Structure, Terrain};
