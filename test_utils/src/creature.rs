//! Deterministic movement and animation collaborators.

use glam::Vec3;
use menagerie::entity::{AgentBody, EntityId};
use menagerie::motion::{turn_body, AgentRig};
use menagerie::vector_math::{flatten, safe_normalize};
use menagerie::world::{AnimationSink, Locomotion};

/// A [`Locomotion`] with fixed stats that records every landed attack.
///
/// Attacks land whenever they are attempted; the cooldown is the
/// controller's business. Tests advance [`TestCreature::now`] alongside the
/// time they pass to the controller so attack times can be checked.
#[derive(Debug, Clone)]
pub struct TestCreature {
    /// Units per second.
    pub speed: f32,
    /// Radians per second.
    pub turn_rate: f32,
    /// Attack reach.
    pub attack_range: f32,
    /// Seconds between attacks reported to the controller.
    pub attack_cooldown: f32,
    /// Reported death state.
    pub dead: bool,
    /// Simulated time stamped on recorded attacks.
    pub now: f64,
    /// Every landed attack as `(target, time)`.
    pub attacks: Vec<(EntityId, f64)>,
}

impl Default for TestCreature {
    fn default() -> Self {
        Self {
            speed: 2.0,
            turn_rate: std::f32::consts::TAU,
            attack_range: 1.5,
            attack_cooldown: 1.0,
            dead: false,
            now: 0.0,
            attacks: Vec::new(),
        }
    }
}

impl TestCreature {
    /// A creature moving at `speed` units per second.
    pub fn with_speed(speed: f32) -> Self {
        Self {
            speed,
            ..Self::default()
        }
    }

    /// Times of landed attacks, oldest first.
    pub fn attack_times(&self) -> Vec<f64> {
        self.attacks.iter().map(|(_, at)| *at).collect()
    }
}

impl Locomotion for TestCreature {
    fn move_speed(&self) -> f32 {
        self.speed
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn attack_range(&self) -> f32 {
        self.attack_range
    }

    fn attack_cooldown(&self) -> f32 {
        self.attack_cooldown
    }

    fn move_in_direction(&mut self, body: &mut AgentBody, direction: Vec3, speed_factor: f32, dt: f32) {
        body.position += safe_normalize(flatten(direction)) * self.speed * speed_factor * dt;
    }

    fn rotate_towards(&mut self, body: &mut AgentBody, direction: Vec3, turn_rate_factor: f32, dt: f32) {
        turn_body(body, direction, self.turn_rate * turn_rate_factor * dt);
    }

    fn try_attack(&mut self, target: EntityId) -> bool {
        self.attacks.push((target, self.now));
        true
    }
}

/// An [`AnimationSink`] that remembers what it was told.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingAnimation {
    /// Latest walk state.
    pub walking: bool,
    /// Number of idle poses played.
    pub idles: u32,
    /// Number of times walking was switched on from off.
    pub walk_starts: u32,
}

impl AnimationSink for RecordingAnimation {
    fn set_walking(&mut self, walking: bool) {
        if walking && !self.walking {
            self.walk_starts += 1;
        }
        self.walking = walking;
    }

    fn set_idle(&mut self) {
        self.walking = false;
        self.idles += 1;
    }
}

/// Bundles a body with both test collaborators.
pub fn agent_rig<'a>(
    body: &'a mut AgentBody,
    creature: &'a mut TestCreature,
    animation: &'a mut RecordingAnimation,
) -> AgentRig<'a> {
    AgentRig::new(body)
        .with_locomotion(creature)
        .with_animation(animation)
}
