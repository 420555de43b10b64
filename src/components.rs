//! ECS component types used by the arena simulation.
//! Includes creature stats, health, team tags, loot state and the per-agent controllers.
use bevy::prelude::*;
use serde::Serialize;

use crate::behaviour::BehaviourController;
use crate::config::CreatureSpawn;
use crate::entity::{Classification, EntityId};
use crate::wander::WanderingController;
use crate::world::AnimationSink;

/// Which side a creature is on.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Team {
    /// The formation anchor standing in for the player.
    Leader,
    /// Companions driven by a [`Brain`].
    Ally,
    /// Wild creatures driven by a [`Wanderer`].
    Hostile,
}

impl Team {
    /// Classification other agents sense this team as.
    #[must_use]
    pub const fn classification(self) -> Classification {
        match self {
            Self::Leader | Self::Ally => Classification::Ally,
            Self::Hostile => Classification::Hostile,
        }
    }
}

/// Remaining hit points; zero means dead.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[reflect(Component, Default)]
pub struct Health(pub u32);

/// Movement and combat stats of a creature.
#[derive(Component, Debug, Clone, PartialEq, Serialize)]
pub struct Creature {
    /// Units per second.
    pub move_speed: f32,
    /// Radians per second.
    pub turn_rate: f32,
    /// Attack reach.
    pub attack_range: f32,
    /// Seconds between attacks.
    pub attack_cooldown: f32,
    /// Damage per landed attack.
    pub attack_damage: u32,
}

impl From<&CreatureSpawn> for Creature {
    fn from(spawn: &CreatureSpawn) -> Self {
        Self {
            move_speed: spawn.move_speed,
            turn_rate: spawn.turn_rate,
            attack_range: spawn.attack_range,
            attack_cooldown: spawn.attack_cooldown,
            attack_damage: spawn.attack_damage,
        }
    }
}

/// An item companions can pick up and deliver.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Loot {
    /// Whether the item still counts as collectible.
    pub collectible: bool,
    /// Agent carrying the item.
    pub holder: Option<EntityId>,
}

impl Default for Loot {
    fn default() -> Self {
        Self {
            collectible: true,
            holder: None,
        }
    }
}

/// Companion brain of an allied creature.
#[derive(Component, Debug, Deref, DerefMut)]
pub struct Brain(pub BehaviourController);

/// Wandering controller of a creature without a brain.
#[derive(Component, Debug, Deref, DerefMut)]
pub struct Wanderer(pub WanderingController);

/// Walk/idle animation state written through [`AnimationSink`].
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[reflect(Component, Default)]
pub struct Gait {
    /// Walk cycle playing.
    pub walking: bool,
    /// Number of idle poses requested so far.
    pub idle_poses: u32,
}

impl AnimationSink for Gait {
    fn set_walking(&mut self, walking: bool) {
        self.walking = walking;
    }

    fn set_idle(&mut self) {
        self.walking = false;
        self.idle_poses = self.idle_poses.saturating_add(1);
    }
}
