//! Tuning constants shared by the behaviour controllers.
//!
//! Most of these act as defaults for the configuration structs in
//! [`crate::config`]; the remainder are fixed algorithm budgets that are not
//! exposed to configuration.

/// Number of bisection steps used by `BoundaryOracle::closest_safe_point`.
///
/// Ten halvings resolve a 100 unit segment to roughly 0.1 units.
pub const BOUNDARY_BISECTION_STEPS: u32 = 10;
/// Distance between samples when validating a path against the boundary.
pub const PATH_SAMPLE_STEP: f32 = 0.5;

/// Default number of random waypoint candidates tried before falling back.
pub const WAYPOINT_ATTEMPTS: u32 = 8;
/// Default fraction of the wander radius a waypoint may occupy.
pub const RADIUS_SAFETY_FACTOR: f32 = 0.85;
/// Fraction of the wander radius beyond which waypoint selection biases
/// towards the spawn anchor.
pub const FAR_FROM_ANCHOR_RATIO: f32 = 0.7;
/// Distance multiplier applied to candidates when the agent is far out.
pub const FAR_DISTANCE_BIAS: f32 = 0.5;
/// Weight of the anchor direction when blending candidate headings.
pub const ANCHOR_BLEND: f32 = 0.5;

/// Default minimum idle time in seconds.
pub const MIN_WAIT_TIME: f32 = 1.0;
/// Default maximum idle time in seconds.
pub const MAX_WAIT_TIME: f32 = 3.0;
/// Default minimum distance of a wander leg.
pub const MIN_WANDER_DISTANCE: f32 = 2.0;
/// Default maximum distance of a wander leg.
pub const MAX_WANDER_DISTANCE: f32 = 6.0;
/// Default radius around the spawn anchor an agent may roam.
pub const MAX_WANDER_RADIUS: f32 = 10.0;
/// Default duration of the turn-to-face phase in seconds.
pub const TURN_DURATION: f32 = 0.5;
/// Turn duration used while recovering from the boundary.
pub const RECOVERY_TURN_DURATION: f32 = 0.8;
/// Horizontal distance at which a waypoint counts as reached.
pub const WAYPOINT_REACHED_THRESHOLD: f32 = 0.3;
/// Hard limit on a single move attempt in seconds.
pub const MOVE_TIMEOUT: f32 = 8.0;

/// Pause before a boundary recovery turn in seconds.
pub const RECOVERY_IDLE_TIME: f32 = 0.5;
/// Half-width of the random heading jitter applied during recovery, degrees.
pub const RECOVERY_JITTER_DEGREES: f32 = 20.0;
/// Lower bound of the recovery target distance as a fraction of the radius.
pub const RECOVERY_TARGET_MIN_RATIO: f32 = 0.4;
/// Upper bound of the recovery target distance as a fraction of the radius.
pub const RECOVERY_TARGET_MAX_RATIO: f32 = 0.6;
/// Recovery ends once the agent is back under this fraction of the radius.
pub const RECOVERY_RETURN_RATIO: f32 = 0.7;
/// Hard limit on the recovery move in seconds.
pub const RECOVERY_TIMEOUT: f32 = 6.0;

/// Default range at which allies notice hostiles.
pub const SENSOR_RANGE: f32 = 8.0;
/// Default range at which allies notice collectible items.
pub const LOOT_SENSOR_RANGE: f32 = 6.0;
/// Default distance beyond which a lost target is no longer chased.
pub const GIVE_UP_RANGE: f32 = 15.0;
/// Default distance to the anchor an ally tolerates before following.
pub const FOLLOW_DISTANCE: f32 = 3.0;
/// Default distance behind the anchor at which formation slots sit.
pub const FORMATION_RADIUS: f32 = 2.0;
/// Default half-angle of the formation spread in degrees.
pub const FORMATION_SPREAD_DEGREES: f32 = 30.0;
/// Default interval between formation slot recomputations in seconds.
pub const FORMATION_REFRESH_INTERVAL: f32 = 0.5;
/// Default distance at which an item can be picked up.
pub const PICKUP_DISTANCE: f32 = 1.0;
/// Default distance at which a carried item is handed off.
pub const DELIVERY_DISTANCE: f32 = 1.5;
/// Attack range assumed when no movement primitive reports one.
pub const FALLBACK_ATTACK_RANGE: f32 = 1.5;
/// Speed used for direct position writes when no movement primitive exists.
pub const FALLBACK_MOVE_SPEED: f32 = 2.0;
/// Turn rate in radians per second used when no movement primitive exists.
pub const FALLBACK_TURN_RATE: f32 = std::f32::consts::PI;

/// Simulated seconds per tick used when no scenario overrides it.
pub const TICK_SECONDS: f32 = 0.05;
/// Height above its carrier at which a carried item rides.
pub const CARRY_HEIGHT: f32 = 1.0;

/// Controller events retained by the simulation's behaviour log.
pub const BEHAVIOUR_LOG_CAPACITY: usize = 4096;
