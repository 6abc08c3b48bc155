//! Data-driven game balance
//!
//! Every gameplay number that is not playfield geometry lives here, so
//! balance passes never touch simulation code. `GameState` owns a `Tuning`,
//! which means independent sessions can run different balance and tests can
//! pin exact values. Partial JSON overrides are supported: absent fields fall
//! back to the defaults.

use serde::{Deserialize, Serialize};

/// Gameplay balance values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Ammo capacity and per-shot cost
    pub ammo_max: i32,
    pub ammo_cost: i32,
    /// Regenerate `ammo_regen_step` every `ammo_regen_interval` ticks
    pub ammo_regen_interval: u64,
    pub ammo_regen_step: i32,

    /// Interceptor straight-line speed, px per tick
    pub interceptor_speed: f32,

    /// Blast zone expansion per tick and terminal radius, normal and massive
    pub blast_growth: f32,
    pub blast_growth_massive: f32,
    pub blast_max_radius: f32,
    pub blast_max_radius_massive: f32,
    /// Extra radius added to a blast when testing raider hits
    pub blast_hit_slack: f32,

    /// Score and debris per raider kill
    pub kill_score: u64,
    pub kill_debris: u32,

    /// Level progression
    pub kills_needed_base: u32,
    pub kills_needed_step: u32,
    pub difficulty_base: f32,
    pub difficulty_step: f32,

    /// Bastion integrity
    pub integrity_max: i32,
    pub breach_damage: i32,
    /// Integrity restored on level-up (capped at max)
    pub level_repair: i32,

    /// Raider spawn cadence: `max(floor, base - level * factor)` ticks
    pub spawn_base_interval: u64,
    pub spawn_level_factor: u64,
    pub spawn_floor_interval: u64,

    /// Raider speed: uniform in [min, max) plus difficulty scaling
    pub raider_speed_min: f32,
    pub raider_speed_max: f32,
    pub raider_speed_per_difficulty: f32,
    /// Lateral wobble: phase advance per tick and amplitude in px
    pub wobble_rate: f32,
    pub wobble_amplitude: f32,

    /// Cosmetic particle life decrement per tick
    pub particle_fade: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ammo_max: 100,
            ammo_cost: 5,
            ammo_regen_interval: 4,
            ammo_regen_step: 2,

            interceptor_speed: 30.0,

            blast_growth: 7.0,
            blast_growth_massive: 10.0,
            blast_max_radius: 90.0,
            blast_max_radius_massive: 250.0,
            blast_hit_slack: 30.0,

            kill_score: 50,
            kill_debris: 12,

            kills_needed_base: 10,
            kills_needed_step: 5,
            difficulty_base: 1.0,
            difficulty_step: 0.5,

            integrity_max: 100,
            breach_damage: 20,
            level_repair: 20,

            spawn_base_interval: 80,
            spawn_level_factor: 10,
            spawn_floor_interval: 8,

            raider_speed_min: 5.0,
            raider_speed_max: 7.0,
            raider_speed_per_difficulty: 2.0,
            wobble_rate: 0.15,
            wobble_amplitude: 3.0,

            particle_fade: 0.03,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON. Missing fields take default values, so a
    /// balance file only needs to list what it changes. Values that would
    /// stall the simulation are clamped into the valid range.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::sanitized)
    }

    /// Clamp values a hand-edited override could break: cadence intervals
    /// must be nonzero and the raider speed range non-empty.
    fn sanitized(mut self) -> Self {
        self.ammo_regen_interval = self.ammo_regen_interval.max(1);
        self.spawn_base_interval = self.spawn_base_interval.max(1);
        self.spawn_floor_interval = self.spawn_floor_interval.max(1);
        if self.raider_speed_max <= self.raider_speed_min {
            self.raider_speed_max = self.raider_speed_min + 0.1;
        }
        self
    }

    /// Spawn interval for a given level, clamped to the floor
    pub fn spawn_interval(&self, level: u32) -> u64 {
        self.spawn_base_interval
            .saturating_sub(level as u64 * self.spawn_level_factor)
            .max(self.spawn_floor_interval)
    }
}
