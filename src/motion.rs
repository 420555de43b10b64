//! Per-tick view of one agent and the shared movement primitive.
//!
//! [`AgentRig`] bundles the body both controllers write with the optional
//! collaborators that move and animate it. Missing collaborators degrade to
//! direct position writes and skipped animation signals.
use glam::Vec3;
use log::warn;

use crate::boundary::BoundaryOracle;
use crate::entity::{AgentBody, EntityId};
use crate::vector_math::{horizontal_direction, horizontal_distance, lerp_angle, wrap_angle, yaw_of};
use crate::world::{AnimationSink, Locomotion};
use crate::{FALLBACK_MOVE_SPEED, FALLBACK_TURN_RATE};

/// Steps shorter than this count as no progress.
const MIN_PROGRESS: f32 = 1e-4;

/// Mutable access to one agent for the duration of a tick.
pub struct AgentRig<'a> {
    /// Position and facing.
    pub body: &'a mut AgentBody,
    /// Movement primitive; `None` falls back to direct position writes.
    pub locomotion: Option<&'a mut dyn Locomotion>,
    /// Animation target; `None` skips visual signals.
    pub animation: Option<&'a mut dyn AnimationSink>,
}

impl<'a> AgentRig<'a> {
    /// A rig with no collaborators attached.
    pub fn new(body: &'a mut AgentBody) -> Self {
        Self {
            body,
            locomotion: None,
            animation: None,
        }
    }

    /// Attaches a movement primitive.
    #[must_use]
    pub fn with_locomotion(mut self, locomotion: &'a mut dyn Locomotion) -> Self {
        self.locomotion = Some(locomotion);
        self
    }

    /// Attaches an animation sink.
    #[must_use]
    pub fn with_animation(mut self, animation: &'a mut dyn AnimationSink) -> Self {
        self.animation = Some(animation);
        self
    }

    /// Current world position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    /// Movement speed reported by the primitive, or the fallback speed.
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        self.locomotion
            .as_deref()
            .map_or(FALLBACK_MOVE_SPEED, |locomotion| locomotion.move_speed())
    }

    /// Whether the primitive reports the agent dead. Agents without one never
    /// die.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.locomotion
            .as_deref()
            .is_some_and(|locomotion| locomotion.is_dead())
    }

    /// Attack range reported by the primitive.
    #[must_use]
    pub fn attack_range(&self) -> Option<f32> {
        self.locomotion
            .as_deref()
            .map(|locomotion| locomotion.attack_range())
    }

    /// Attack cooldown reported by the primitive.
    #[must_use]
    pub fn attack_cooldown(&self) -> Option<f32> {
        self.locomotion
            .as_deref()
            .map(|locomotion| locomotion.attack_cooldown())
    }

    /// Forwards the walking flag to the animation sink, if any.
    pub fn set_walking(&mut self, walking: bool) {
        if let Some(animation) = self.animation.as_deref_mut() {
            animation.set_walking(walking);
        }
    }

    /// Forwards the idle signal to the animation sink, if any.
    pub fn set_idle(&mut self) {
        if let Some(animation) = self.animation.as_deref_mut() {
            animation.set_walking(false);
            animation.set_idle();
        }
    }

    /// Moves along `direction` for one tick.
    pub fn translate(&mut self, direction: Vec3, speed_factor: f32, dt: f32) {
        match self.locomotion.as_deref_mut() {
            Some(locomotion) => locomotion.move_in_direction(self.body, direction, speed_factor, dt),
            None => {
                self.body.position += direction * FALLBACK_MOVE_SPEED * speed_factor * dt;
            }
        }
    }

    /// Turns towards `direction` for one tick.
    pub fn face(&mut self, direction: Vec3, turn_rate_factor: f32, dt: f32) {
        match self.locomotion.as_deref_mut() {
            Some(locomotion) => locomotion.rotate_towards(self.body, direction, turn_rate_factor, dt),
            None => turn_body(self.body, direction, FALLBACK_TURN_RATE * turn_rate_factor * dt),
        }
    }

    /// Attempts an attack, which never lands without a primitive.
    pub fn try_attack(&mut self, target: EntityId) -> bool {
        self.locomotion
            .as_deref_mut()
            .is_some_and(|locomotion| locomotion.try_attack(target))
    }
}

/// Turns `body` towards a horizontal `direction` by at most `max_turn`
/// radians along the shortest arc.
pub fn turn_body(body: &mut AgentBody, direction: Vec3, max_turn: f32) {
    let target = yaw_of(direction);
    let gap = wrap_angle(target - body.yaw).abs();
    let t = if gap <= max_turn { 1.0 } else { max_turn / gap };
    body.yaw = lerp_angle(body.yaw, target, t);
}

/// Warn-once bookkeeping for collaborators an agent is missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingCollaborators {
    locomotion_reported: bool,
    animation_reported: bool,
}

impl MissingCollaborators {
    /// Logs each missing collaborator of `rig` the first time it is seen.
    pub fn check(&mut self, owner: &str, rig: &AgentRig<'_>) {
        if rig.locomotion.is_none() && !self.locomotion_reported {
            self.locomotion_reported = true;
            warn!("{owner}: no movement primitive attached; writing positions directly");
        }
        if rig.animation.is_none() && !self.animation_reported {
            self.animation_reported = true;
            warn!("{owner}: no animation sink attached; skipping animation signals");
        }
    }
}

/// Result of one [`step_towards`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Already within the arrival distance; nothing moved.
    Arrived,
    /// The agent moved this tick.
    Moved,
    /// The boundary or a zero speed prevented any progress.
    Blocked,
}

/// Moves the agent one tick towards `target`, never leaving the arena.
///
/// The step is shortened so it neither overshoots `target` nor crosses out of
/// the oracle's safe area; in the latter case it stops at the furthest safe
/// point along the step.
pub fn step_towards(
    rig: &mut AgentRig<'_>,
    oracle: &BoundaryOracle,
    target: Vec3,
    arrive_distance: f32,
    speed_factor: f32,
    dt: f32,
) -> StepOutcome {
    let position = rig.position();
    let distance = horizontal_distance(position, target);
    let Some(direction) = horizontal_direction(position, target) else {
        rig.set_walking(false);
        return StepOutcome::Arrived;
    };
    if distance <= arrive_distance {
        rig.set_walking(false);
        return StepOutcome::Arrived;
    }

    let full = rig.move_speed() * speed_factor * dt;
    if full <= 0.0 || !full.is_finite() {
        rig.set_walking(false);
        return StepOutcome::Blocked;
    }

    let mut length = full.min(distance);
    let desired = position + direction * length;
    if !oracle.is_safe(desired) {
        let clamped = oracle.closest_safe_point(position, desired);
        length = horizontal_distance(position, clamped);
    }
    if length < MIN_PROGRESS {
        rig.set_walking(false);
        return StepOutcome::Blocked;
    }

    rig.translate(direction, speed_factor * length / full, dt);
    rig.set_walking(true);
    StepOutcome::Moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryRegion;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    fn step_without_primitive_writes_position_directly() {
        let mut body = AgentBody::at(Vec3::ZERO);
        let mut rig = AgentRig::new(&mut body);
        let outcome = step_towards(
            &mut rig,
            &BoundaryOracle::unbounded(),
            Vec3::new(10.0, 0.0, 0.0),
            0.1,
            1.0,
            0.5,
        );
        assert_eq!(outcome, StepOutcome::Moved);
        assert_relative_eq!(body.position.x, FALLBACK_MOVE_SPEED * 0.5);
    }

    #[rstest]
    fn step_does_not_overshoot_target() {
        let mut body = AgentBody::at(Vec3::ZERO);
        let mut rig = AgentRig::new(&mut body);
        step_towards(
            &mut rig,
            &BoundaryOracle::unbounded(),
            Vec3::new(0.25, 0.0, 0.0),
            0.0,
            1.0,
            1.0,
        );
        assert_relative_eq!(body.position.x, 0.25, epsilon = 1e-5);
    }

    #[rstest]
    fn step_stops_at_boundary() {
        let oracle = BoundaryOracle::unbounded().with_region(BoundaryRegion::circle(Vec3::ZERO, 1.0));
        let mut body = AgentBody::at(Vec3::new(0.5, 0.0, 0.0));
        let mut rig = AgentRig::new(&mut body);
        let first = step_towards(&mut rig, &oracle, Vec3::new(10.0, 0.0, 0.0), 0.1, 1.0, 1.0);
        assert_eq!(first, StepOutcome::Moved);
        assert!(oracle.is_safe(body.position));

        let mut edge = AgentBody::at(Vec3::new(0.999_99, 0.0, 0.0));
        let mut rig = AgentRig::new(&mut edge);
        let second = step_towards(&mut rig, &oracle, Vec3::new(10.0, 0.0, 0.0), 0.1, 1.0, 1.0);
        assert_eq!(second, StepOutcome::Blocked);
        assert_relative_eq!(edge.position.x, 0.999_99);
    }

    #[rstest]
    fn fallback_face_turns_at_bounded_rate() {
        let mut body = AgentBody::at(Vec3::ZERO);
        let mut rig = AgentRig::new(&mut body);
        rig.face(Vec3::NEG_Z, 1.0, 0.25);
        assert_relative_eq!(body.yaw.abs(), FALLBACK_TURN_RATE * 0.25, epsilon = 1e-5);
    }
}
