//! Game state and core simulation types
//!
//! All gameplay state for one session lives here, owned by a single
//! `GameState`. Entities never reference each other; cross-entity effects
//! (collisions, breaches, spawns) are mediated by the tick pipeline.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::tuning::Tuning;
use crate::{direction, distance, launch_point};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Title screen, simulation idle
    Menu,
    /// Active gameplay
    Playing,
    /// Run ended, waiting for restart
    GameOver,
}

/// Gameplay events emitted by the core during `tick`/`fire`, drained by the
/// shell once per frame and mapped to audio cues and UI signals. Delivery is
/// fire-and-forget: nothing flows back into the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// A run began (start or restart); ambient drone should come up
    RunStarted,
    /// An interceptor was launched
    ShotFired,
    /// A raider entered the field
    RaiderSpawned,
    /// A blast zone was created
    Detonation { massive: bool },
    /// Level threshold crossed; payload is the new level for the announcement
    LevelUp { level: u32 },
    /// A raider reached the bastion at this x coordinate
    Breach { x: f32 },
    /// Integrity hit zero; ambient drone should stop
    RunOver,
}

/// An interceptor in flight from the launch point toward a captured target
#[derive(Debug, Clone)]
pub struct Interceptor {
    pub origin: Vec2,
    pub target: Vec2,
    pub pos: Vec2,
    pub vel: Vec2,
    pub speed: f32,
    /// Straight-line distance from origin to target, fixed at fire time
    pub dist_total: f32,
    pub dist_traveled: f32,
    pub active: bool,
}

impl Interceptor {
    /// Aim from the fixed launch point at `target`; velocity is derived once
    /// and never changes
    pub fn new(target: Vec2, speed: f32) -> Self {
        let origin = launch_point();
        Self {
            origin,
            target,
            pos: origin,
            vel: direction(origin, target) * speed,
            speed,
            dist_total: distance(origin, target),
            dist_traveled: 0.0,
            active: true,
        }
    }

    /// One tick of straight-line motion
    pub fn advance(&mut self) {
        self.pos += self.vel;
        self.dist_traveled += self.speed;
    }

    /// Lifetime ends when cumulative travel reaches the initial distance,
    /// not when the position lands on the target. Overshoot terminates.
    pub fn arrived(&self) -> bool {
        self.dist_traveled >= self.dist_total
    }
}

/// An expanding blast: both the visual fireball and the kill hitbox
#[derive(Debug, Clone)]
pub struct BlastZone {
    pub center: Vec2,
    pub radius: f32,
    pub growth: f32,
    pub max_radius: f32,
    pub massive: bool,
    pub active: bool,
}

impl BlastZone {
    pub fn new(center: Vec2, massive: bool, tuning: &Tuning) -> Self {
        let (growth, max_radius) = if massive {
            (tuning.blast_growth_massive, tuning.blast_max_radius_massive)
        } else {
            (tuning.blast_growth, tuning.blast_max_radius)
        };
        Self {
            center,
            radius: 1.0,
            growth,
            max_radius,
            massive,
            active: true,
        }
    }

    /// Expand by the fixed rate; deactivate on reaching max radius
    pub fn advance(&mut self) {
        if self.radius < self.max_radius {
            self.radius += self.growth;
        } else {
            self.active = false;
        }
    }

    /// How far the visual expansion has progressed, 0..1
    pub fn expansion(&self) -> f32 {
        (self.radius / self.max_radius).clamp(0.0, 1.0)
    }
}

/// A descending enemy craft. Heading and speed are fixed at spawn; only the
/// wobble phase advances, giving a lateral weave on top of the base dive.
#[derive(Debug, Clone)]
pub struct Raider {
    pub pos: Vec2,
    /// Unit vector from spawn toward the aim point on the bottom edge
    pub heading: Vec2,
    pub speed: f32,
    pub wobble_phase: f32,
    pub wobble_rate: f32,
    pub wobble_amplitude: f32,
    pub active: bool,
}

impl Raider {
    /// One tick of motion: base dive plus lateral wobble
    pub fn advance(&mut self) {
        self.wobble_phase += self.wobble_rate;
        let sway = self.wobble_phase.cos() * self.wobble_amplitude;
        self.pos.x += self.heading.x * self.speed + sway;
        self.pos.y += self.heading.y * self.speed;
    }

    /// True once the raider has passed the bastion line
    pub fn breached(&self) -> bool {
        self.pos.y > BREACH_Y
    }
}

/// Cosmetic particle category, mapped to a color by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    /// Glowing interceptor exhaust
    Trail,
    /// Dark soot shed by raiders
    Soot,
    /// Grey debris from a kill
    Debris,
}

/// A short-lived cosmetic particle; no gameplay interaction
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life; also used as draw alpha
    pub life: f32,
    pub kind: ParticleKind,
}

impl Particle {
    pub fn advance(&mut self, fade: f32) {
        self.pos += self.vel;
        self.life -= fade;
    }
}

/// Particle cap; oldest are evicted first when exceeded
pub const MAX_PARTICLES: usize = 512;

/// Complete session state. The simulation is the sole mutator; collaborators
/// get read-only snapshots plus the drained event queue.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,

    pub phase: GamePhase,
    /// Simulation clock, advanced once per tick while Playing
    pub tick: u64,

    pub score: u64,
    pub level: u32,
    /// Bastion integrity in [0, integrity_max]; 0 ends the run
    pub integrity: i32,
    /// Interceptor ammo in [0, ammo_max]
    pub ammo: i32,
    pub kills_this_level: u32,
    pub kills_needed: u32,
    /// Feeds raider speed; grows every level-up
    pub difficulty: f32,

    /// Renderer-facing shake intensity, set on breach, decays per tick
    pub screen_shake: f32,

    pub interceptors: Vec<Interceptor>,
    pub blasts: Vec<BlastZone>,
    pub raiders: Vec<Raider>,
    pub particles: Vec<Particle>,

    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self::new_with_tuning(seed, Tuning::default())
    }

    pub fn new_with_tuning(seed: u64, tuning: Tuning) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            tick: 0,
            score: 0,
            level: 1,
            integrity: tuning.integrity_max,
            ammo: tuning.ammo_max,
            kills_this_level: 0,
            kills_needed: tuning.kills_needed_base,
            difficulty: tuning.difficulty_base,
            screen_shake: 0.0,
            interceptors: Vec::new(),
            blasts: Vec::new(),
            raiders: Vec::new(),
            particles: Vec::new(),
            events: Vec::new(),
            tuning,
        };
        state.reset_run();
        state
    }

    fn reset_run(&mut self) {
        self.tick = 0;
        self.score = 0;
        self.level = 1;
        self.integrity = self.tuning.integrity_max;
        self.ammo = self.tuning.ammo_max;
        self.kills_this_level = 0;
        self.kills_needed = self.tuning.kills_needed_base;
        self.difficulty = self.tuning.difficulty_base;
        self.screen_shake = 0.0;
        self.interceptors.clear();
        self.blasts.clear();
        self.raiders.clear();
        self.particles.clear();
    }

    /// Start a run from the menu, or restart after game over. No-op while
    /// already Playing.
    pub fn start(&mut self) {
        match self.phase {
            GamePhase::Menu | GamePhase::GameOver => {
                self.reset_run();
                self.phase = GamePhase::Playing;
                self.push_event(GameEvent::RunStarted);
                log::info!("Run started (seed {})", self.seed);
            }
            GamePhase::Playing => {}
        }
    }

    /// Launch one interceptor from the fixed launch point toward `target`.
    /// Silent no-op unless Playing with ammo to spare; there is no cooldown
    /// beyond the ammo gate.
    pub fn fire(&mut self, target: Vec2) {
        if self.phase != GamePhase::Playing {
            return;
        }
        if self.ammo < self.tuning.ammo_cost {
            return;
        }
        self.ammo -= self.tuning.ammo_cost;
        self.interceptors
            .push(Interceptor::new(target, self.tuning.interceptor_speed));
        self.push_event(GameEvent::ShotFired);
    }

    /// Spawn one raider at a random x on the top edge, diving toward a random
    /// x on the bottom edge. Speed scales with difficulty.
    pub(crate) fn spawn_raider(&mut self) {
        let spawn = Vec2::new(self.rng.random_range(0.0..WORLD_WIDTH), RAIDER_SPAWN_Y);
        let aim = Vec2::new(self.rng.random_range(0.0..WORLD_WIDTH), WORLD_HEIGHT);
        let speed = self
            .rng
            .random_range(self.tuning.raider_speed_min..self.tuning.raider_speed_max)
            + self.difficulty * self.tuning.raider_speed_per_difficulty;
        let raider = Raider {
            pos: spawn,
            heading: direction(spawn, aim),
            speed,
            wobble_phase: self.rng.random_range(0.0..std::f32::consts::TAU),
            wobble_rate: self.tuning.wobble_rate,
            wobble_amplitude: self.tuning.wobble_amplitude,
            active: true,
        };
        self.raiders.push(raider);
        self.push_event(GameEvent::RaiderSpawned);
    }

    /// Add a blast zone and announce it
    pub(crate) fn spawn_blast(&mut self, center: Vec2, massive: bool) {
        self.blasts
            .push(BlastZone::new(center, massive, &self.tuning));
        self.push_event(GameEvent::Detonation { massive });
    }

    /// Push a particle, evicting the oldest when at cap
    pub(crate) fn push_particle(&mut self, pos: Vec2, vel: Vec2, life: f32, kind: ParticleKind) {
        if self.particles.len() >= MAX_PARTICLES {
            self.particles.remove(0);
        }
        self.particles.push(Particle {
            pos,
            vel,
            life,
            kind,
        });
    }

    /// Burst of debris particles with randomized velocities
    pub(crate) fn spawn_debris(&mut self, pos: Vec2, count: u32) {
        for _ in 0..count {
            let vel = Vec2::new(
                self.rng.random_range(-2.5..2.5),
                self.rng.random_range(-2.5..2.5),
            );
            self.push_particle(pos, vel, 1.0, ParticleKind::Debris);
        }
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events accumulated since the last drain. Called by the shell
    /// right after each tick; this is the cue delivery point.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = GameState::new(7);
        assert_eq!(state.phase, GamePhase::Menu);
        assert_eq!(state.level, 1);
        assert_eq!(state.ammo, 100);
        assert_eq!(state.integrity, 100);
        assert!(state.interceptors.is_empty());
        assert!(state.raiders.is_empty());
    }

    #[test]
    fn test_start_resets_and_plays() {
        let mut state = GameState::new(7);
        state.start();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.drain_events(), vec![GameEvent::RunStarted]);

        // Starting again mid-run is a no-op
        state.score = 500;
        state.start();
        assert_eq!(state.score, 500);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut state = GameState::new(7);
        state.start();
        state.score = 1234;
        state.integrity = 0;
        state.phase = GamePhase::GameOver;

        state.start();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(state.integrity, 100);
        assert_eq!(state.tick, 0);
    }

    #[test]
    fn test_fire_deducts_ammo_and_spawns_one() {
        let mut state = GameState::new(7);
        state.start();
        state.drain_events();

        state.fire(Vec2::new(500.0, 500.0));
        assert_eq!(state.interceptors.len(), 1);
        assert!(state.interceptors[0].active);
        assert_eq!(state.ammo, 95);
        assert_eq!(state.drain_events(), vec![GameEvent::ShotFired]);
    }

    #[test]
    fn test_fire_rejected_without_ammo() {
        let mut state = GameState::new(7);
        state.start();
        state.ammo = 4;
        state.drain_events();

        state.fire(Vec2::new(500.0, 500.0));
        assert!(state.interceptors.is_empty());
        assert_eq!(state.ammo, 4);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_fire_noop_outside_playing() {
        let mut state = GameState::new(7);
        state.fire(Vec2::new(500.0, 500.0));
        assert!(state.interceptors.is_empty());
        assert_eq!(state.ammo, 100);
    }

    #[test]
    fn test_interceptor_constant_velocity() {
        let mut shot = Interceptor::new(Vec2::new(640.0, 100.0), 30.0);
        let v0 = shot.vel;
        for _ in 0..5 {
            shot.advance();
            assert_eq!(shot.vel, v0);
            assert!((shot.vel.length() - 30.0).abs() < 1e-3);
        }
        assert!((shot.dist_traveled - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_interceptor_overshoot_terminates() {
        // Target 45 px away, speed 30: not arrived after one tick, arrived
        // after two even though position has overshot the target
        let target = launch_point() + Vec2::new(0.0, -45.0);
        let mut shot = Interceptor::new(target, 30.0);
        shot.advance();
        assert!(!shot.arrived());
        shot.advance();
        assert!(shot.arrived());
        assert!(shot.dist_traveled > shot.dist_total);
    }

    #[test]
    fn test_blast_grows_then_dies() {
        let tuning = Tuning::default();
        let mut blast = BlastZone::new(Vec2::ZERO, false, &tuning);
        assert_eq!(blast.radius, 1.0);

        let mut ticks = 0;
        while blast.active {
            blast.advance();
            ticks += 1;
            assert!(ticks < 1000, "blast never deactivated");
        }
        assert!(blast.radius >= tuning.blast_max_radius);
    }

    #[test]
    fn test_massive_blast_uses_massive_tier() {
        let tuning = Tuning::default();
        let blast = BlastZone::new(Vec2::ZERO, true, &tuning);
        assert_eq!(blast.max_radius, tuning.blast_max_radius_massive);
        assert_eq!(blast.growth, tuning.blast_growth_massive);
    }

    #[test]
    fn test_raider_heading_fixed_under_wobble() {
        let mut raider = Raider {
            pos: Vec2::new(100.0, -80.0),
            heading: Vec2::new(0.0, 1.0),
            speed: 6.0,
            wobble_phase: 0.0,
            wobble_rate: 0.15,
            wobble_amplitude: 3.0,
            active: true,
        };
        let heading = raider.heading;
        let speed = raider.speed;
        for _ in 0..50 {
            raider.advance();
        }
        assert_eq!(raider.heading, heading);
        assert_eq!(raider.speed, speed);
        // Vertical progress is exactly speed per tick regardless of wobble
        assert!((raider.pos.y - (-80.0 + 50.0 * 6.0)).abs() < 1e-3);
    }

    #[test]
    fn test_particle_cap_evicts_oldest() {
        let mut state = GameState::new(7);
        state.start();
        for i in 0..(MAX_PARTICLES + 10) {
            state.push_particle(
                Vec2::new(i as f32, 0.0),
                Vec2::ZERO,
                1.0,
                ParticleKind::Trail,
            );
        }
        assert_eq!(state.particles.len(), MAX_PARTICLES);
        // The first ten were evicted
        assert_eq!(state.particles[0].pos.x, 10.0);
    }

    #[test]
    fn test_spawn_raider_is_seeded() {
        let mut a = GameState::new(42);
        let mut b = GameState::new(42);
        a.start();
        b.start();
        a.spawn_raider();
        b.spawn_raider();
        assert_eq!(a.raiders[0].pos, b.raiders[0].pos);
        assert_eq!(a.raiders[0].speed, b.raiders[0].speed);
    }
}
