//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (entity vectors, insertion order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{blast_contains, first_blast_hit};
pub use state::{
    BlastZone, GameEvent, GamePhase, GameState, Interceptor, Particle, ParticleKind, Raider,
    MAX_PARTICLES,
};
pub use tick::{TickInput, tick};
