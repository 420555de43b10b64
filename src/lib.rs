//! Library crate providing the autonomous behaviour core for menagerie
//! creatures.
//!
//! Two controllers drive every agent: [`WanderingController`] picks and walks
//! to random waypoints around a spawn anchor, and [`BehaviourController`]
//! layers following, fighting and loot collection on top of it. Both keep
//! agents inside the arena described by a [`BoundaryOracle`]. The [`sim`]
//! module hosts them inside a Bevy app.
pub mod behaviour;
pub mod boundary;
pub mod components;
pub mod config;
pub mod constants;
pub mod entity;
pub mod logging;
pub mod motion;
pub mod numeric;
pub mod sim;
pub mod vector_math;
pub mod wander;
pub mod world;
pub use constants::*;

// Re-export commonly used items
pub use behaviour::{BehaviourController, BehaviourEvent, BehaviourMode, Driver};
pub use boundary::{BoundaryOracle, BoundaryRegion, EmptyRegionPolicy};
pub use components::{Brain, Creature, Gait, Health, Loot, Team, Wanderer};
pub use config::{
    load_scenario, ArenaConfig, BehaviourConfig, ConfigError, CreatureSpawn, ScenarioConfig,
    WanderConfig,
};
pub use entity::{AgentBody, AnchorState, Classification, EntityId, FormationSlot, ItemStatus, Sighting};
pub use logging::init as init_logging;
pub use motion::{step_towards, AgentRig, StepOutcome};
pub use sim::{spawn_scenario, CreaturePlugin, SimulationError};
pub use wander::{WanderMode, WanderingController, WaypointSource};
pub use world::{
    AnimationSink, FormationRoster, InventorySink, ItemHandling, Locomotion, ObstacleProbe,
    Sensing, Surroundings,
};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use menagerie::prelude::*;
    //! ```

    pub use crate::AgentBody;
    pub use crate::AgentRig;
    pub use crate::BehaviourController;
    pub use crate::BehaviourMode;
    pub use crate::BoundaryOracle;
    pub use crate::BoundaryRegion;
    pub use crate::CreaturePlugin;
    pub use crate::EntityId;
    pub use crate::WanderingController;
    pub use ordered_float::OrderedFloat;
}
