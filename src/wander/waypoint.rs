//! Waypoint selection ladder.
//!
//! Candidates are tried from most to least preferred: random points around
//! the agent, a short step towards the spawn anchor, and finally the agent's
//! own position. Selection always returns within the retry budget.
use std::f32::consts::TAU;

use glam::Vec3;
use log::debug;
use rand::Rng;

use crate::boundary::BoundaryOracle;
use crate::config::WanderConfig;
use crate::vector_math::{direction_from_yaw, flatten, horizontal_direction, horizontal_distance, safe_normalize};
use crate::world::ObstacleProbe;

/// Which rung of the selection ladder produced a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaypointSource {
    /// A random candidate that passed every check.
    Random,
    /// A short step towards the spawn anchor.
    TowardAnchor,
    /// No usable candidate; the agent stays where it is.
    Stationary,
}

/// A selected waypoint and the rung it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaypointChoice {
    /// Point to walk to.
    pub point: Vec3,
    /// Ladder rung that produced `point`.
    pub source: WaypointSource,
}

/// Inputs shared by every rung.
pub(super) struct Selector<'a> {
    pub config: &'a WanderConfig,
    pub anchor: Vec3,
    pub ground_height: Option<f32>,
    pub oracle: &'a BoundaryOracle,
    pub probe: Option<&'a dyn ObstacleProbe>,
}

/// Uniform sample from `[min, max]`, or `min` when the range is empty.
pub(super) fn sample(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

/// Pulls `point` horizontally back inside `limit` of `anchor`.
pub(super) fn clamp_to_radius(point: Vec3, anchor: Vec3, limit: f32) -> Vec3 {
    let offset = flatten(point - anchor);
    let length = offset.length();
    if length <= limit || length <= f32::EPSILON {
        return point;
    }
    let clamped = anchor + offset * (limit / length);
    Vec3::new(clamped.x, point.y, clamped.z)
}

impl Selector<'_> {
    pub(super) fn on_ground(&self, point: Vec3) -> Vec3 {
        self.ground_height
            .map_or(point, |height| Vec3::new(point.x, height, point.z))
    }

    fn clear(&self, from: Vec3, to: Vec3) -> bool {
        !self.probe.is_some_and(|probe| probe.blocked(from, to)) && self.oracle.is_path_safe(from, to)
    }

    fn within_limit(&self, point: Vec3) -> bool {
        horizontal_distance(point, self.anchor)
            <= self.config.max_wander_radius * self.config.radius_safety_factor
    }

    pub(super) fn select(&self, rng: &mut impl Rng, position: Vec3) -> WaypointChoice {
        let config = self.config;
        let to_anchor = horizontal_direction(position, self.anchor);
        let far = horizontal_distance(position, self.anchor)
            > config.max_wander_radius * config.far_from_anchor_ratio;

        for attempt in 0..config.waypoint_attempts {
            let mut direction = direction_from_yaw(rng.gen_range(0.0..TAU));
            let mut distance = sample(rng, config.min_wander_distance, config.max_wander_distance);
            if far {
                distance *= config.far_distance_bias;
                if let Some(inward) = to_anchor {
                    let blended = safe_normalize(direction.lerp(inward, config.anchor_blend));
                    direction = if blended == Vec3::ZERO { inward } else { blended };
                }
            }
            let candidate = self.on_ground(position + direction * distance);
            if self.within_limit(candidate) && self.clear(position, candidate) {
                debug!("waypoint {candidate} accepted on attempt {attempt}");
                return WaypointChoice {
                    point: candidate,
                    source: WaypointSource::Random,
                };
            }
        }

        if let Some(inward) = to_anchor {
            let step = config
                .min_wander_distance
                .min(horizontal_distance(position, self.anchor));
            let candidate = self.on_ground(position + inward * step);
            if self.clear(position, candidate) {
                debug!("random waypoints exhausted; stepping towards anchor");
                return WaypointChoice {
                    point: candidate,
                    source: WaypointSource::TowardAnchor,
                };
            }
        }

        debug!("no usable waypoint; staying at {position}");
        WaypointChoice {
            point: position,
            source: WaypointSource::Stationary,
        }
    }
}
