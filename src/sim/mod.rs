//! Bevy ECS integration for the behaviour controllers.
//!
//! This module re-exports the plugin, the per-tick snapshot and the systems
//! that drive [`crate::components::Brain`] and
//! [`crate::components::Wanderer`] components inside a Bevy app.

mod plugin;
mod snapshot;
mod spawn;
mod strike_inbox;
mod systems;

use bevy::prelude::Entity;

use crate::entity::EntityId;

pub use plugin::{CreaturePlugin, SimulationError};
pub use snapshot::{ItemCommand, WorldSnapshot};
pub use spawn::{spawn_scenario, SpawnedScenario};
pub use strike_inbox::{Strike, StrikeInbox};
pub use systems::{
    advance_clock_system, apply_item_commands_system, body_from_transform, build_snapshot_system,
    drive_brains_system, drive_wanderers_system, resolve_strikes_system, Arena, BehaviourLog,
    CreatureMotor, Delivery, DeliveryLedger, SimClock,
};

/// Stable identifier the controllers use for a Bevy entity.
#[must_use]
pub fn entity_id(entity: Entity) -> EntityId {
    EntityId(entity.to_bits())
}
