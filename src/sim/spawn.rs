//! Populates a Bevy world from a [`ScenarioConfig`].

use std::sync::Arc;

use bevy::prelude::*;
use log::info;

use crate::behaviour::BehaviourController;
use crate::components::{Brain, Creature, Gait, Health, Loot, Team, Wanderer};
use crate::config::ScenarioConfig;
use crate::wander::WanderingController;

use super::entity_id;
use super::systems::{Arena, SimClock};

/// Entities created by [`spawn_scenario`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnedScenario {
    /// The formation leader.
    pub leader: Option<Entity>,
    /// Allied companions in configuration order.
    pub allies: Vec<Entity>,
    /// Hostile wanderers in configuration order.
    pub hostiles: Vec<Entity>,
    /// Loot items in configuration order.
    pub loot: Vec<Entity>,
}

/// Inserts the arena and clock resources and spawns every configured entity.
///
/// Each controller gets its own seed derived from the scenario seed, so a
/// scenario replays identically.
pub fn spawn_scenario(world: &mut World, scenario: &ScenarioConfig) -> SpawnedScenario {
    let oracle = Arc::new(scenario.arena.build());
    world.insert_resource(Arena(Arc::clone(&oracle)));
    world.insert_resource(SimClock::new(scenario.tick_seconds));

    let mut spawned = SpawnedScenario {
        leader: Some(
            world
                .spawn((
                    Team::Leader,
                    Health(u32::MAX),
                    Transform::from_translation(scenario.leader),
                ))
                .id(),
        ),
        ..SpawnedScenario::default()
    };

    let mut seed = scenario.seed;
    for spawn in &scenario.allies {
        let entity = world.spawn_empty().id();
        let wander = WanderingController::new(
            scenario.wander.clone(),
            spawn.position,
            Arc::clone(&oracle),
            seed,
        );
        let brain = BehaviourController::new(
            entity_id(entity),
            scenario.behaviour.clone(),
            wander,
            Arc::clone(&oracle),
        );
        world.entity_mut(entity).insert((
            Team::Ally,
            Health(spawn.health),
            Creature::from(spawn),
            Gait::default(),
            Brain(brain),
            Transform::from_translation(spawn.position),
        ));
        spawned.allies.push(entity);
        seed = seed.wrapping_add(1);
    }

    for spawn in &scenario.hostiles {
        let mut wander = WanderingController::new(
            scenario.wander.clone(),
            spawn.position,
            Arc::clone(&oracle),
            seed,
        );
        wander.enable();
        let entity = world
            .spawn((
                Team::Hostile,
                Health(spawn.health),
                Creature::from(spawn),
                Gait::default(),
                Wanderer(wander),
                Transform::from_translation(spawn.position),
            ))
            .id();
        spawned.hostiles.push(entity);
        seed = seed.wrapping_add(1);
    }

    for position in &scenario.loot {
        let entity = world
            .spawn((Loot::default(), Transform::from_translation(*position)))
            .id();
        spawned.loot.push(entity);
    }

    info!(
        "spawned scenario: {} allies, {} hostiles, {} loot",
        spawned.allies.len(),
        spawned.hostiles.len(),
        spawned.loot.len()
    );
    spawned
}
