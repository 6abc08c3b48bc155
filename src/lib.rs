//! Ashfall - an arcade defense game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, leveling)
//! - `renderer`: WebGPU rendering pipeline
//! - `audio`: Procedural Web Audio cues (wasm only)
//! - `tuning`: Data-driven game balance

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod renderer;
pub mod sim;
pub mod tuning;

pub use tuning::Tuning;

use glam::Vec2;

/// Playfield geometry constants
pub mod consts {
    /// Virtual playfield size in pixels, y grows downward
    pub const WORLD_WIDTH: f32 = 1280.0;
    pub const WORLD_HEIGHT: f32 = 720.0;

    /// Fixed launch point for interceptors (bottom center)
    pub const LAUNCH_X: f32 = WORLD_WIDTH / 2.0;
    pub const LAUNCH_Y: f32 = WORLD_HEIGHT - 20.0;

    /// Raiders enter above the visible field
    pub const RAIDER_SPAWN_Y: f32 = -80.0;
    /// A raider whose y passes this has breached the bastion
    pub const BREACH_Y: f32 = WORLD_HEIGHT - 10.0;
}

/// Fixed launch point as a vector
#[inline]
pub fn launch_point() -> Vec2 {
    Vec2::new(consts::LAUNCH_X, consts::LAUNCH_Y)
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Unit direction from `from` toward `to` (zero vector if coincident)
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}
