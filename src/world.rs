//! Collaborator contracts the behaviour core is driven through.
//!
//! Everything outside the controllers (physics, animation, the scene graph,
//! inventory) is reached through these traits. Implementations are injected
//! either at controller construction ([`ObstacleProbe`]) or per tick
//! ([`Surroundings`], [`Locomotion`], [`AnimationSink`]).
use glam::Vec3;

use crate::entity::{AgentBody, AnchorState, Classification, EntityId, FormationSlot, ItemStatus, Sighting};

/// The "living entity" capability that owns an agent's physical movement.
///
/// `move_in_direction` is expected to displace the body by
/// `direction * move_speed() * speed_factor * dt`; callers scale
/// `speed_factor` down to shorten a step.
#[cfg_attr(test, mockall::automock)]
pub trait Locomotion {
    /// Base movement speed in units per second.
    fn move_speed(&self) -> f32;
    /// Whether the agent has died.
    fn is_dead(&self) -> bool;
    /// Distance at which an attack can land.
    fn attack_range(&self) -> f32;
    /// Minimum simulated seconds between two successful attacks.
    fn attack_cooldown(&self) -> f32;
    /// Moves the body along a horizontal `direction`.
    fn move_in_direction(&mut self, body: &mut AgentBody, direction: Vec3, speed_factor: f32, dt: f32);
    /// Turns the body towards a horizontal `direction`.
    fn rotate_towards(&mut self, body: &mut AgentBody, direction: Vec3, turn_rate_factor: f32, dt: f32);
    /// Attempts an attack on `target`, returning whether it landed.
    fn try_attack(&mut self, target: EntityId) -> bool;
}

/// Fire-and-forget animation signals.
pub trait AnimationSink {
    /// Switches the walk cycle on or off.
    fn set_walking(&mut self, walking: bool);
    /// Plays the idle pose.
    fn set_idle(&mut self);
}

/// Raycast probe used to reject waypoints behind obstacles.
#[cfg_attr(test, mockall::automock)]
pub trait ObstacleProbe: Send + Sync {
    /// Returns `true` when something blocks the straight path `from -> to`.
    fn blocked(&self, from: Vec3, to: Vec3) -> bool;
}

/// Overlap and lookup queries over the scene.
pub trait Sensing {
    /// Objects of `classification` within `radius` of `origin`.
    fn sense(&self, origin: Vec3, radius: f32, classification: Classification) -> Vec<Sighting>;
    /// Current state of `id`, or `None` once it is destroyed or dead.
    fn locate(&self, id: EntityId) -> Option<Sighting>;
}

/// Attachment of items to carrying agents.
pub trait ItemHandling {
    /// Current state of `item`, or `None` once it no longer exists.
    fn item_status(&self, item: EntityId) -> Option<ItemStatus>;
    /// Attaches `item` to `carrier`. Fails if another agent already holds it.
    fn attach(&mut self, item: EntityId, carrier: EntityId) -> bool;
    /// Detaches `item` from `carrier`, leaving it where it is.
    fn release(&mut self, item: EntityId, carrier: EntityId);
}

/// Destination for delivered items.
pub trait InventorySink {
    /// Hands `item` over; the core forgets about it afterwards.
    fn deliver(&mut self, item: EntityId, carrier: EntityId);
}

/// Formation anchor and sibling roster.
pub trait FormationRoster {
    /// The anchor followers keep formation around, usually the player.
    fn anchor(&self) -> Option<AnchorState>;
    /// The slot of `agent` among currently alive siblings.
    fn slot_of(&self, agent: EntityId) -> FormationSlot;
}

/// Everything a behaviour controller needs from the world in one tick.
pub trait Surroundings: Sensing + ItemHandling + InventorySink + FormationRoster {}

impl<T> Surroundings for T where T: Sensing + ItemHandling + InventorySink + FormationRoster {}
