//! Bevy plugin wiring the creature systems into the schedule.

use bevy::ecs::prelude::On;
use bevy::prelude::*;
use log::error;
use thiserror::Error;

use crate::components::{Gait, Health};
use crate::entity::EntityId;

use super::snapshot::WorldSnapshot;
use super::strike_inbox::StrikeInbox;
use super::systems::{
    advance_clock_system, apply_item_commands_system, build_snapshot_system, drive_brains_system,
    drive_wanderers_system, resolve_strikes_system, Arena, BehaviourLog, DeliveryLedger, SimClock,
};

/// Event raised when a queued command names an entity the world no longer
/// resolves.
///
/// Observers log these events using Bevy's Events V2 pipeline so diagnostics
/// remain visible even when `bevy_log` is disabled.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// A strike hit a creature that is not in the arena.
    #[error("{attacker:?} struck unknown target {target:?}")]
    UnknownTarget {
        /// Creature that attacked.
        attacker: EntityId,
        /// The unresolved target.
        target: EntityId,
    },
    /// An item command named an item that is not in the arena.
    #[error("item command for unknown item {item:?}")]
    UnknownItem {
        /// The unresolved item.
        item: EntityId,
    },
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value for Events V2."
)]
fn log_simulation_error(event: On<SimulationError>) {
    error!("simulation error: {}", event.event());
}

/// Bevy plugin installing the arena simulation resources and systems.
///
/// Existing [`Arena`] and [`SimClock`] resources are kept, so a scenario can
/// be spawned before or after the plugin is added.
#[derive(Default)]
pub struct CreaturePlugin;

impl Plugin for CreaturePlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_simulation_error);
        app.register_type::<Health>().register_type::<Gait>();

        app.init_resource::<Arena>()
            .init_resource::<SimClock>()
            .init_resource::<WorldSnapshot>()
            .init_resource::<StrikeInbox>()
            .init_resource::<DeliveryLedger>()
            .init_resource::<BehaviourLog>();

        app.add_systems(
            Update,
            (
                advance_clock_system,
                build_snapshot_system,
                drive_wanderers_system,
                drive_brains_system,
                apply_item_commands_system,
                resolve_strikes_system,
            )
                .chain(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Creature, Team};
    use crate::config::CreatureSpawn;
    use crate::sim::strike_inbox::Strike;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(CreaturePlugin);
        app
    }

    #[rstest]
    fn plugin_initialises_resources() {
        let app = app();
        assert!(app.world().contains_resource::<Arena>());
        assert!(app.world().contains_resource::<SimClock>());
        assert!(app.world().contains_resource::<WorldSnapshot>());
        assert!(app.world().contains_resource::<StrikeInbox>());
        assert!(app.world().contains_resource::<DeliveryLedger>());
        assert!(app.world().contains_resource::<BehaviourLog>());
    }

    #[rstest]
    fn update_advances_clock() {
        let mut app = app();
        app.update();
        app.update();
        let clock = app.world().resource::<SimClock>();
        assert_relative_eq!(clock.now, 2.0 * f64::from(clock.step));
    }

    #[rstest]
    fn strike_on_unknown_target_is_dropped() {
        let mut app = app();
        app.world_mut().resource_mut::<StrikeInbox>().push(Strike {
            attacker: EntityId(1),
            target: EntityId(u64::MAX),
            damage: 3,
        });
        app.update();
        assert!(app.world().resource::<StrikeInbox>().is_empty());
    }

    #[rstest]
    fn creature_slain_last_tick_is_despawned() {
        let mut app = app();
        let victim = app
            .world_mut()
            .spawn((
                Team::Hostile,
                Health(0),
                Creature::from(&CreatureSpawn::default()),
                Transform::default(),
            ))
            .id();
        app.update();
        assert!(app.world().get_entity(victim).is_err());
    }
}
