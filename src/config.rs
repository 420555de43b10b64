//! Serde-backed configuration for controllers, arenas and scenarios.
//!
//! Every struct deserialises with `#[serde(default)]`, so a JSON file only
//! needs the values it overrides. Call `validate` before use; the controllers
//! assume validated input and only clamp the few inconsistencies they can
//! detect at runtime.
use std::fs;
use std::path::Path;

use anyhow::Context;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::behaviour::BehaviourMode;
use crate::boundary::{BoundaryOracle, BoundaryRegion, EmptyRegionPolicy};
use crate::constants::*;

/// Reasons a configuration is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A distance, duration or speed is negative, NaN or infinite.
    #[error("{field} must be finite and non-negative, got {value}")]
    InvalidQuantity {
        /// Offending field.
        field: &'static str,
        /// Value found.
        value: f32,
    },
    /// A `min_*` value exceeds its `max_*` partner.
    #[error("{min_field} ({min}) exceeds {max_field} ({max})")]
    InvertedRange {
        /// Name of the lower bound.
        min_field: &'static str,
        /// Name of the upper bound.
        max_field: &'static str,
        /// Lower bound found.
        min: f32,
        /// Upper bound found.
        max: f32,
    },
    /// A ratio lies outside `(0, 1]`.
    #[error("{field} must lie in (0, 1], got {value}")]
    RatioOutOfRange {
        /// Offending field.
        field: &'static str,
        /// Value found.
        value: f32,
    },
    /// Waypoint selection needs at least one random attempt.
    #[error("waypoint_attempts must be at least one")]
    ZeroAttempts,
    /// A boundary region has no interior once its margin is applied.
    #[error("boundary region {index} has no interior after its margin")]
    DegenerateRegion {
        /// Position of the region in the configured list.
        index: usize,
    },
    /// Hostiles would be noticed further away than they are chased.
    #[error("sensor_range ({sensor_range}) exceeds give_up_range ({give_up_range})")]
    SensorBeyondGiveUp {
        /// Hostile sensing radius found.
        sensor_range: f32,
        /// Chase limit found.
        give_up_range: f32,
    },
    /// The simulation step must be strictly positive.
    #[error("tick_seconds must be positive, got {0}")]
    InvalidTick(f32),
}

fn quantity(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidQuantity { field, value })
    }
}

fn ratio(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::RatioOutOfRange { field, value })
    }
}

fn range(
    (min_field, min): (&'static str, f32),
    (max_field, max): (&'static str, f32),
) -> Result<(), ConfigError> {
    quantity(min_field, min)?;
    quantity(max_field, max)?;
    if min > max {
        return Err(ConfigError::InvertedRange {
            min_field,
            max_field,
            min,
            max,
        });
    }
    Ok(())
}

/// Tuning for the idle/turn/move wandering cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Shortest idle pause in seconds.
    pub min_wait_time: f32,
    /// Longest idle pause in seconds.
    pub max_wait_time: f32,
    /// Shortest wander leg.
    pub min_wander_distance: f32,
    /// Longest wander leg.
    pub max_wander_distance: f32,
    /// Radius around the spawn anchor the agent must stay within.
    pub max_wander_radius: f32,
    /// Fraction of the radius a waypoint may occupy.
    pub radius_safety_factor: f32,
    /// Fraction of the radius beyond which selection biases inward.
    pub far_from_anchor_ratio: f32,
    /// Distance multiplier applied while far from the anchor.
    pub far_distance_bias: f32,
    /// Weight of the anchor direction when far from the anchor.
    pub anchor_blend: f32,
    /// Random candidates tried before falling back.
    pub waypoint_attempts: u32,
    /// Turn-to-face duration in seconds.
    pub turn_duration: f32,
    /// Turn duration while recovering from the boundary.
    pub recovery_turn_duration: f32,
    /// Horizontal distance at which a waypoint counts as reached.
    pub reached_threshold: f32,
    /// Hard limit on one move attempt in seconds.
    pub move_timeout: f32,
    /// Multiplier on the agent's move speed while wandering.
    pub speed_factor: f32,
    /// Abort moves that would leave the wander radius.
    pub restrict_to_boundary: bool,
    /// Pin the agent's Y to the spawn anchor's ground height.
    pub snap_to_ground: bool,
    /// Pause before the recovery turn in seconds.
    pub recovery_idle_time: f32,
    /// Half-width of the recovery heading jitter in degrees.
    pub recovery_jitter_degrees: f32,
    /// Recovery target distance from the anchor, lower bound, as a fraction
    /// of the radius.
    pub recovery_target_min_ratio: f32,
    /// Recovery target distance from the anchor, upper bound.
    pub recovery_target_max_ratio: f32,
    /// Recovery ends once back under this fraction of the radius.
    pub recovery_return_ratio: f32,
    /// Hard limit on the recovery move in seconds.
    pub recovery_timeout: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            min_wait_time: MIN_WAIT_TIME,
            max_wait_time: MAX_WAIT_TIME,
            min_wander_distance: MIN_WANDER_DISTANCE,
            max_wander_distance: MAX_WANDER_DISTANCE,
            max_wander_radius: MAX_WANDER_RADIUS,
            radius_safety_factor: RADIUS_SAFETY_FACTOR,
            far_from_anchor_ratio: FAR_FROM_ANCHOR_RATIO,
            far_distance_bias: FAR_DISTANCE_BIAS,
            anchor_blend: ANCHOR_BLEND,
            waypoint_attempts: WAYPOINT_ATTEMPTS,
            turn_duration: TURN_DURATION,
            recovery_turn_duration: RECOVERY_TURN_DURATION,
            reached_threshold: WAYPOINT_REACHED_THRESHOLD,
            move_timeout: MOVE_TIMEOUT,
            speed_factor: 1.0,
            restrict_to_boundary: true,
            snap_to_ground: true,
            recovery_idle_time: RECOVERY_IDLE_TIME,
            recovery_jitter_degrees: RECOVERY_JITTER_DEGREES,
            recovery_target_min_ratio: RECOVERY_TARGET_MIN_RATIO,
            recovery_target_max_ratio: RECOVERY_TARGET_MAX_RATIO,
            recovery_return_ratio: RECOVERY_RETURN_RATIO,
            recovery_timeout: RECOVERY_TIMEOUT,
        }
    }
}

impl WanderConfig {
    /// Checks ranges, ratios and budgets.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        range(
            ("min_wait_time", self.min_wait_time),
            ("max_wait_time", self.max_wait_time),
        )?;
        range(
            ("min_wander_distance", self.min_wander_distance),
            ("max_wander_distance", self.max_wander_distance),
        )?;
        range(
            ("recovery_target_min_ratio", self.recovery_target_min_ratio),
            ("recovery_target_max_ratio", self.recovery_target_max_ratio),
        )?;
        for (field, value) in [
            ("max_wander_radius", self.max_wander_radius),
            ("turn_duration", self.turn_duration),
            ("recovery_turn_duration", self.recovery_turn_duration),
            ("reached_threshold", self.reached_threshold),
            ("move_timeout", self.move_timeout),
            ("speed_factor", self.speed_factor),
            ("recovery_idle_time", self.recovery_idle_time),
            ("recovery_jitter_degrees", self.recovery_jitter_degrees),
            ("recovery_timeout", self.recovery_timeout),
            ("far_distance_bias", self.far_distance_bias),
            ("anchor_blend", self.anchor_blend),
        ] {
            quantity(field, value)?;
        }
        for (field, value) in [
            ("radius_safety_factor", self.radius_safety_factor),
            ("far_from_anchor_ratio", self.far_from_anchor_ratio),
            ("recovery_return_ratio", self.recovery_return_ratio),
            ("recovery_target_max_ratio", self.recovery_target_max_ratio),
        ] {
            ratio(field, value)?;
        }
        if self.waypoint_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }
}

/// Tuning for the companion behaviour state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviourConfig {
    /// Mode entered when the controller starts.
    pub initial_mode: BehaviourMode,
    /// Range at which hostiles are noticed.
    pub sensor_range: f32,
    /// Range at which collectible items are noticed.
    pub loot_sensor_range: f32,
    /// Lost targets further than this are no longer chased.
    pub give_up_range: f32,
    /// Distance to the anchor tolerated before following.
    pub follow_distance: f32,
    /// Distance behind the anchor at which formation slots sit.
    pub formation_radius: f32,
    /// Half-angle of the formation spread in degrees.
    pub formation_spread_degrees: f32,
    /// Seconds between formation slot recomputations.
    pub formation_refresh_interval: f32,
    /// Distance at which an item is picked up.
    pub pickup_distance: f32,
    /// Distance at which a carried item is handed off.
    pub delivery_distance: f32,
    /// Where carried items go; the anchor, then the spawn point, when unset.
    pub delivery_point: Option<Vec3>,
    /// Speed multiplier while chasing.
    pub chase_speed_factor: f32,
    /// Speed multiplier while following, fetching and carrying.
    pub travel_speed_factor: f32,
    /// Turn rate multiplier when facing targets.
    pub turn_rate_factor: f32,
    /// Attack range used when the agent has no movement primitive.
    pub fallback_attack_range: f32,
    /// Whether the agent looks for loot at all.
    pub collect_loot: bool,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            initial_mode: BehaviourMode::Following,
            sensor_range: SENSOR_RANGE,
            loot_sensor_range: LOOT_SENSOR_RANGE,
            give_up_range: GIVE_UP_RANGE,
            follow_distance: FOLLOW_DISTANCE,
            formation_radius: FORMATION_RADIUS,
            formation_spread_degrees: FORMATION_SPREAD_DEGREES,
            formation_refresh_interval: FORMATION_REFRESH_INTERVAL,
            pickup_distance: PICKUP_DISTANCE,
            delivery_distance: DELIVERY_DISTANCE,
            delivery_point: None,
            chase_speed_factor: 1.2,
            travel_speed_factor: 1.0,
            turn_rate_factor: 1.0,
            fallback_attack_range: FALLBACK_ATTACK_RANGE,
            collect_loot: true,
        }
    }
}

impl BehaviourConfig {
    /// Checks every distance, duration and factor.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("sensor_range", self.sensor_range),
            ("loot_sensor_range", self.loot_sensor_range),
            ("give_up_range", self.give_up_range),
            ("follow_distance", self.follow_distance),
            ("formation_radius", self.formation_radius),
            ("formation_spread_degrees", self.formation_spread_degrees),
            ("formation_refresh_interval", self.formation_refresh_interval),
            ("pickup_distance", self.pickup_distance),
            ("delivery_distance", self.delivery_distance),
            ("chase_speed_factor", self.chase_speed_factor),
            ("travel_speed_factor", self.travel_speed_factor),
            ("turn_rate_factor", self.turn_rate_factor),
            ("fallback_attack_range", self.fallback_attack_range),
        ] {
            quantity(field, value)?;
        }
        if self.sensor_range > self.give_up_range {
            return Err(ConfigError::SensorBeyondGiveUp {
                sensor_range: self.sensor_range,
                give_up_range: self.give_up_range,
            });
        }
        Ok(())
    }
}

/// Arena regions and the policy for an empty arena.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Regions a point must be inside to be safe.
    pub regions: Vec<BoundaryRegion>,
    /// Answer when `regions` is empty.
    pub empty_policy: EmptyRegionPolicy,
}

impl ArenaConfig {
    /// Rejects regions without an interior.
    ///
    /// # Errors
    /// Returns [`ConfigError::DegenerateRegion`] for the first bad region.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, region) in self.regions.iter().enumerate() {
            let has_interior = match *region {
                BoundaryRegion::Circle { radius, margin, .. } => radius - margin > 0.0,
                BoundaryRegion::Box {
                    half_extents,
                    margin,
                    ..
                } => half_extents.x - margin > 0.0 && half_extents.y - margin > 0.0,
            };
            if !has_interior {
                return Err(ConfigError::DegenerateRegion { index });
            }
        }
        Ok(())
    }

    /// Builds the oracle shared by every agent in the arena.
    #[must_use]
    pub fn build(&self) -> BoundaryOracle {
        BoundaryOracle::new(self.regions.clone(), self.empty_policy)
    }
}

/// Stats for one spawned creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureSpawn {
    /// Spawn position; also the wander anchor.
    pub position: Vec3,
    /// Move speed in units per second.
    pub move_speed: f32,
    /// Turn rate in radians per second.
    pub turn_rate: f32,
    /// Attack reach.
    pub attack_range: f32,
    /// Seconds between attacks.
    pub attack_cooldown: f32,
    /// Damage per landed attack.
    pub attack_damage: u32,
    /// Starting health.
    pub health: u32,
}

impl Default for CreatureSpawn {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            move_speed: 2.0,
            turn_rate: std::f32::consts::TAU,
            attack_range: FALLBACK_ATTACK_RANGE,
            attack_cooldown: 1.0,
            attack_damage: 10,
            health: 50,
        }
    }
}

impl CreatureSpawn {
    /// A default creature at `position`.
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// A complete headless arena run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Seed for every controller's random stream.
    pub seed: u64,
    /// Simulated seconds per tick.
    pub tick_seconds: f32,
    /// Simulated seconds to run.
    pub duration_seconds: f32,
    /// Arena geometry.
    pub arena: ArenaConfig,
    /// Wandering tuning shared by every agent.
    pub wander: WanderConfig,
    /// Companion tuning shared by every ally.
    pub behaviour: BehaviourConfig,
    /// Position of the formation leader (the player stand-in).
    pub leader: Vec3,
    /// Allied companions.
    pub allies: Vec<CreatureSpawn>,
    /// Hostile wanderers.
    pub hostiles: Vec<CreatureSpawn>,
    /// Collectible item positions.
    pub loot: Vec<Vec3>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            tick_seconds: crate::TICK_SECONDS,
            duration_seconds: 60.0,
            arena: ArenaConfig {
                regions: vec![BoundaryRegion::circle(Vec3::ZERO, 30.0).with_margin(1.0)],
                empty_policy: EmptyRegionPolicy::FailOpen,
            },
            wander: WanderConfig::default(),
            behaviour: BehaviourConfig::default(),
            leader: Vec3::ZERO,
            allies: vec![
                CreatureSpawn::at(Vec3::new(-2.0, 0.0, -2.0)),
                CreatureSpawn::at(Vec3::new(2.0, 0.0, -2.0)),
            ],
            hostiles: vec![CreatureSpawn {
                attack_damage: 5,
                health: 30,
                ..CreatureSpawn::at(Vec3::new(12.0, 0.0, 12.0))
            }],
            loot: vec![Vec3::new(-5.0, 0.0, 4.0), Vec3::new(6.0, 0.0, -3.0)],
        }
    }
}

impl ScenarioConfig {
    /// Validates every nested section.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_seconds.is_finite() && self.tick_seconds > 0.0) {
            return Err(ConfigError::InvalidTick(self.tick_seconds));
        }
        quantity("duration_seconds", self.duration_seconds)?;
        self.arena.validate()?;
        self.wander.validate()?;
        self.behaviour.validate()
    }
}

/// Reads and validates a scenario from a JSON file.
///
/// # Errors
/// Fails when the file cannot be read, is not valid JSON for
/// [`ScenarioConfig`], or does not validate.
pub fn load_scenario(path: &Path) -> anyhow::Result<ScenarioConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    let scenario: ScenarioConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse scenario {}", path.display()))?;
    scenario
        .validate()
        .with_context(|| format!("invalid scenario {}", path.display()))?;
    Ok(scenario)
}
