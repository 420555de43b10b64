//! Value types describing agents and the things they perceive.
//!
//! The behaviour core never owns scene objects. It refers to them through
//! [`EntityId`] handles and reads their state through the collaborator traits
//! in [`crate::world`].
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::vector_math::{direction_from_yaw, horizontal_distance};

/// Opaque identifier of a scene object (agent, player or item).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl EntityId {
    /// Returns the raw identifier.
    #[must_use]
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

/// Team/tag classification used to filter sensing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Creatures allied agents fight.
    Hostile,
    /// Friendly agents, including the player.
    Ally,
    /// Items that may be picked up and delivered.
    Collectible,
    /// Anything the core should ignore, such as an item reclassified while
    /// en route.
    Inert,
}

/// One result of a sensing query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    /// Identifier of the sensed object.
    pub id: EntityId,
    /// Its world position at query time.
    pub position: Vec3,
    /// Its classification at query time.
    pub classification: Classification,
}

/// Attachment and classification state of an item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemStatus {
    /// World position of the item.
    pub position: Vec3,
    /// Current classification; anything but `Collectible` is not pursued.
    pub classification: Classification,
    /// Agent currently carrying the item, if any.
    pub holder: Option<EntityId>,
}

impl ItemStatus {
    /// Whether `agent` may still commit to picking this item up.
    #[must_use]
    pub fn available_to(&self, agent: EntityId) -> bool {
        self.classification == Classification::Collectible
            && self.holder.is_none_or(|holder| holder == agent)
    }
}

/// Position and facing of an agent, the state both controllers write.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AgentBody {
    /// World position; Y is usually pinned to the ground height.
    pub position: Vec3,
    /// Facing about +Y in radians; zero faces +Z.
    pub yaw: f32,
}

impl AgentBody {
    /// Creates a body at `position` facing +Z.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self { position, yaw: 0.0 }
    }

    /// Horizontal unit vector the body faces.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        direction_from_yaw(self.yaw)
    }

    /// Horizontal distance from the body to `point`.
    #[must_use]
    pub fn distance_to(&self, point: Vec3) -> f32 {
        horizontal_distance(self.position, point)
    }
}

/// An agent's place among its living siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormationSlot {
    /// Zero-based index among currently alive siblings.
    pub index: usize,
    /// Number of currently alive siblings, including this agent.
    pub count: usize,
}

impl Default for FormationSlot {
    fn default() -> Self {
        Self { index: 0, count: 1 }
    }
}

/// The anchor a following agent keeps formation around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorState {
    /// World position of the anchor.
    pub position: Vec3,
    /// Horizontal direction the anchor faces.
    pub forward: Vec3,
    /// Whether the anchor is currently moving.
    pub moving: bool,
}
