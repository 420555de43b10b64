//! Idle/turn/move wandering around a spawn anchor.
//!
//! [`WanderingController`] runs an explicit phase machine advanced once per
//! tick. Every phase is a small time-bounded unit of work, and any external
//! command replaces the phase field outright, so no two movement phases can
//! ever drive the same agent.
//!
//! When a step would carry the agent outside its wander radius the move is
//! abandoned and a boundary recovery runs: a short pause, a turn back towards
//! the anchor with some jitter, and a bounded walk inward.

mod waypoint;

use std::sync::Arc;

use glam::Vec3;
use log::{debug, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::boundary::BoundaryOracle;
use crate::config::WanderConfig;
use crate::entity::AgentBody;
use crate::motion::{AgentRig, MissingCollaborators};
use crate::vector_math::{
    ease_in_out, horizontal_direction, horizontal_distance, lerp_angle, rotate_yaw, yaw_of,
};
use crate::world::ObstacleProbe;

use waypoint::{clamp_to_radius, sample, Selector};
pub use waypoint::{WaypointChoice, WaypointSource};

/// Externally visible phase of a [`WanderingController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WanderMode {
    /// Not driving the agent.
    Disabled,
    /// Waiting before choosing the next waypoint.
    Idle,
    /// Rotating to face the current waypoint.
    Turning,
    /// Walking to the current waypoint.
    Moving,
    /// Pausing, turning or walking back inside the wander radius.
    Recovering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegKind {
    Wander,
    Forced,
    Recovery,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Leg {
    target: Vec3,
    elapsed: f32,
    timeout: f32,
    kind: LegKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Turn {
    from_yaw: f32,
    to_yaw: f32,
    elapsed: f32,
    duration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Disabled,
    Idle { remaining: f32, signalled: bool },
    Turning { turn: Turn, leg: Leg },
    Moving(Leg),
    RecoveryPause { remaining: f32 },
}

impl Phase {
    const fn mode(&self) -> WanderMode {
        match self {
            Self::Disabled => WanderMode::Disabled,
            Self::Idle { .. } => WanderMode::Idle,
            Self::RecoveryPause { .. } => WanderMode::Recovering,
            Self::Turning { leg, .. } | Self::Moving(leg) if matches!(leg.kind, LegKind::Recovery) => {
                WanderMode::Recovering
            }
            Self::Turning { .. } => WanderMode::Turning,
            Self::Moving(_) => WanderMode::Moving,
        }
    }
}

/// Per-agent wandering state machine.
pub struct WanderingController {
    config: WanderConfig,
    spawn_anchor: Vec3,
    oracle: Arc<BoundaryOracle>,
    probe: Option<Arc<dyn ObstacleProbe>>,
    rng: ChaCha8Rng,
    phase: Phase,
    waypoint: Vec3,
    last_source: Option<WaypointSource>,
    missing: MissingCollaborators,
    driving: bool,
}

impl std::fmt::Debug for WanderingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WanderingController")
            .field("spawn_anchor", &self.spawn_anchor)
            .field("phase", &self.phase)
            .field("waypoint", &self.waypoint)
            .field("has_probe", &self.probe.is_some())
            .finish_non_exhaustive()
    }
}

impl WanderingController {
    /// Creates a disabled controller anchored at `spawn_anchor`.
    ///
    /// `seed` fixes the random stream so runs are reproducible. Inverted
    /// `min_*`/`max_*` pairs are clamped so that the maximum equals the
    /// minimum.
    #[must_use]
    pub fn new(mut config: WanderConfig, spawn_anchor: Vec3, oracle: Arc<BoundaryOracle>, seed: u64) -> Self {
        clamp_inverted("wait time", config.min_wait_time, &mut config.max_wait_time);
        clamp_inverted(
            "wander distance",
            config.min_wander_distance,
            &mut config.max_wander_distance,
        );
        clamp_inverted(
            "recovery target ratio",
            config.recovery_target_min_ratio,
            &mut config.recovery_target_max_ratio,
        );
        Self {
            config,
            spawn_anchor,
            oracle,
            probe: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
            phase: Phase::Disabled,
            waypoint: spawn_anchor,
            last_source: None,
            missing: MissingCollaborators::default(),
            driving: false,
        }
    }

    /// Attaches an obstacle probe consulted during waypoint selection.
    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn ObstacleProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Current phase.
    #[must_use]
    pub const fn mode(&self) -> WanderMode {
        self.phase.mode()
    }

    /// Whether the controller is doing anything at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self.phase, Phase::Disabled)
    }

    /// Whether the last tick wrote the agent's position or facing.
    #[must_use]
    pub const fn is_driving(&self) -> bool {
        self.driving
    }

    /// The waypoint most recently committed to.
    #[must_use]
    pub const fn current_waypoint(&self) -> Vec3 {
        self.waypoint
    }

    /// Ladder rung that produced the most recent selected waypoint.
    #[must_use]
    pub const fn last_waypoint_source(&self) -> Option<WaypointSource> {
        self.last_source
    }

    /// Point the wander radius is measured from.
    #[must_use]
    pub const fn spawn_anchor(&self) -> Vec3 {
        self.spawn_anchor
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &WanderConfig {
        &self.config
    }

    /// Moves the anchor, and with it the ground height, to `anchor`.
    pub fn set_spawn_anchor(&mut self, anchor: Vec3) {
        self.spawn_anchor = anchor;
        self.waypoint = anchor;
    }

    /// Starts the cycle in `Idle`; does nothing if already running.
    pub fn enable(&mut self) {
        if !self.is_enabled() {
            self.phase = self.idle_phase();
            debug!("wander enabled at {}", self.spawn_anchor);
        }
    }

    /// Cancels whatever phase is in flight and stops driving the agent.
    pub fn disable(&mut self) {
        if self.is_enabled() {
            debug!("wander disabled from {:?}", self.mode());
        }
        self.phase = Phase::Disabled;
        self.driving = false;
    }

    /// Cancels the in-flight phase and restarts from a fresh `Idle` wait.
    pub fn force_idle(&mut self) {
        self.phase = self.idle_phase();
        debug!("wander forced idle");
    }

    /// Cancels the in-flight phase and commits to a freshly selected
    /// waypoint, turning towards it immediately.
    pub fn force_new_waypoint(&mut self, body: &AgentBody) {
        let choice = self.select_waypoint(body.position);
        self.phase = self.begin_turn(body, choice.point, LegKind::Wander, self.config.turn_duration);
        debug!("wander forced to new waypoint {}", choice.point);
    }

    /// Cancels the in-flight phase and heads along `direction`.
    ///
    /// The target lies one maximum wander distance away, pulled back inside
    /// the safe radius. A zero direction selects a waypoint normally. The
    /// normal cycle resumes once the leg ends.
    pub fn force_new_waypoint_towards(&mut self, direction: Vec3, body: &AgentBody) {
        let Some(heading) = horizontal_direction(Vec3::ZERO, direction) else {
            self.force_new_waypoint(body);
            return;
        };
        let limit = self.config.max_wander_radius * self.config.radius_safety_factor;
        let raw = body.position + heading * self.config.max_wander_distance;
        let target = self.selector().on_ground(clamp_to_radius(raw, self.spawn_anchor, limit));
        self.phase = self.begin_turn(body, target, LegKind::Forced, self.config.turn_duration);
        debug!("wander forced towards {heading}, target {target}");
    }

    /// Runs the selection ladder from `position`, recording the chosen rung.
    pub fn select_waypoint(&mut self, position: Vec3) -> WaypointChoice {
        let selector = Selector {
            config: &self.config,
            anchor: self.spawn_anchor,
            ground_height: self.ground_height(),
            oracle: &self.oracle,
            probe: self.probe.as_deref(),
        };
        let choice = selector.select(&mut self.rng, position);
        self.last_source = Some(choice.source);
        choice
    }

    /// Advances the active phase by `dt` seconds and returns whether the
    /// agent's position or facing was written.
    pub fn tick(&mut self, rig: &mut AgentRig<'_>, dt: f32) -> bool {
        self.driving = false;
        if !self.is_enabled() {
            return false;
        }
        self.missing.check("wandering controller", rig);
        if !(dt.is_finite() && dt > 0.0) {
            return false;
        }
        let before = self.mode();
        let phase = self.phase;
        self.phase = match phase {
            Phase::Disabled => Phase::Disabled,
            Phase::Idle {
                remaining,
                signalled,
            } => self.advance_idle(rig, remaining, signalled, dt),
            Phase::Turning { turn, leg } => self.advance_turn(rig, turn, leg, dt),
            Phase::Moving(leg) => self.advance_move(rig, leg, dt),
            Phase::RecoveryPause { remaining } => self.advance_recovery_pause(rig, remaining, dt),
        };
        let after = self.mode();
        if before != after {
            debug!("wander {before:?} -> {after:?}");
        }
        self.driving
    }

    fn ground_height(&self) -> Option<f32> {
        self.config.snap_to_ground.then_some(self.spawn_anchor.y)
    }

    fn selector(&self) -> Selector<'_> {
        Selector {
            config: &self.config,
            anchor: self.spawn_anchor,
            ground_height: self.ground_height(),
            oracle: &self.oracle,
            probe: self.probe.as_deref(),
        }
    }

    fn idle_phase(&mut self) -> Phase {
        Phase::Idle {
            remaining: sample(&mut self.rng, self.config.min_wait_time, self.config.max_wait_time),
            signalled: false,
        }
    }

    fn begin_turn(&mut self, body: &AgentBody, target: Vec3, kind: LegKind, duration: f32) -> Phase {
        self.waypoint = target;
        let to_yaw = horizontal_direction(body.position, target).map_or(body.yaw, yaw_of);
        let timeout = if kind == LegKind::Recovery {
            self.config.recovery_timeout
        } else {
            self.config.move_timeout
        };
        Phase::Turning {
            turn: Turn {
                from_yaw: body.yaw,
                to_yaw,
                elapsed: 0.0,
                duration,
            },
            leg: Leg {
                target,
                elapsed: 0.0,
                timeout,
                kind,
            },
        }
    }

    fn advance_idle(&mut self, rig: &mut AgentRig<'_>, remaining: f32, signalled: bool, dt: f32) -> Phase {
        if !signalled {
            rig.set_idle();
        }
        let remaining = remaining - dt;
        if remaining > 0.0 {
            return Phase::Idle {
                remaining,
                signalled: true,
            };
        }
        let choice = self.select_waypoint(rig.position());
        self.begin_turn(rig.body, choice.point, LegKind::Wander, self.config.turn_duration)
    }

    fn advance_turn(&mut self, rig: &mut AgentRig<'_>, turn: Turn, leg: Leg, dt: f32) -> Phase {
        let elapsed = turn.elapsed + dt;
        let t = if turn.duration > 0.0 {
            (elapsed / turn.duration).min(1.0)
        } else {
            1.0
        };
        rig.body.yaw = lerp_angle(turn.from_yaw, turn.to_yaw, ease_in_out(t));
        self.driving = true;
        if t >= 1.0 {
            Phase::Moving(leg)
        } else {
            Phase::Turning {
                turn: Turn { elapsed, ..turn },
                leg,
            }
        }
    }

    fn finish_leg(&mut self, rig: &mut AgentRig<'_>, leg: Leg, reason: &str) -> Phase {
        rig.set_walking(false);
        debug!("wander {:?} leg ended: {reason}", leg.kind);
        self.idle_phase()
    }

    fn advance_move(&mut self, rig: &mut AgentRig<'_>, leg: Leg, dt: f32) -> Phase {
        let position = rig.position();
        let radius = self.config.max_wander_radius;
        let remaining = horizontal_distance(position, leg.target);
        if remaining <= self.config.reached_threshold {
            return self.finish_leg(rig, leg, "reached");
        }
        if leg.kind == LegKind::Recovery
            && horizontal_distance(position, self.spawn_anchor) <= radius * self.config.recovery_return_ratio
        {
            return self.finish_leg(rig, leg, "back inside radius");
        }
        if leg.elapsed >= leg.timeout {
            return self.finish_leg(rig, leg, "timed out");
        }
        let Some(direction) = horizontal_direction(position, leg.target) else {
            return self.finish_leg(rig, leg, "reached");
        };

        let elapsed = leg.elapsed + dt;
        let full = rig.move_speed() * self.config.speed_factor * dt;
        if !(full.is_finite() && full > 0.0) {
            rig.set_walking(false);
            return Phase::Moving(Leg { elapsed, ..leg });
        }
        let length = full.min(remaining);
        let next = position + direction * length;

        if leg.kind != LegKind::Recovery {
            let leaves_radius = self.config.restrict_to_boundary
                && horizontal_distance(next, self.spawn_anchor) > radius;
            if leaves_radius || !self.oracle.is_safe(next) {
                rig.set_walking(false);
                rig.set_idle();
                debug!("wander step to {next} leaves the safe area; recovering");
                return Phase::RecoveryPause {
                    remaining: self.config.recovery_idle_time,
                };
            }
        } else if !self.oracle.is_safe(next) {
            return self.finish_leg(rig, leg, "arena edge");
        }

        rig.translate(direction, self.config.speed_factor * length / full, dt);
        if let Some(height) = self.ground_height() {
            rig.body.position.y = height;
        }
        rig.set_walking(true);
        self.driving = true;
        Phase::Moving(Leg { elapsed, ..leg })
    }

    fn advance_recovery_pause(&mut self, rig: &mut AgentRig<'_>, remaining: f32, dt: f32) -> Phase {
        let remaining = remaining - dt;
        if remaining > 0.0 {
            return Phase::RecoveryPause { remaining };
        }
        let config = &self.config;
        let (jitter_bound, min_ratio, max_ratio, radius, duration) = (
            config.recovery_jitter_degrees,
            config.recovery_target_min_ratio,
            config.recovery_target_max_ratio,
            config.max_wander_radius,
            config.recovery_turn_duration,
        );
        let inward = horizontal_direction(rig.position(), self.spawn_anchor)
            .unwrap_or_else(|| rig.body.forward());
        let jitter = sample(&mut self.rng, -jitter_bound, jitter_bound).to_radians();
        let heading = rotate_yaw(inward, jitter);
        let distance = radius * sample(&mut self.rng, min_ratio, max_ratio);
        let target = self.selector().on_ground(self.spawn_anchor - heading * distance);
        self.begin_turn(rig.body, target, LegKind::Recovery, duration)
    }
}

fn clamp_inverted(name: &str, min: f32, max: &mut f32) {
    if min > *max {
        warn!("inverted {name} range {min}..{}; clamping maximum to {min}", *max);
        *max = min;
    }
}

#[cfg(test)]
mod tests;
