//! Per-tick read model of the arena handed to companion brains.
//!
//! The snapshot is rebuilt at the start of every tick from the ECS world.
//! Brains sense and claim through it; claims update the snapshot at once, so
//! two brains racing for one item in the same tick see each other's claim,
//! and are queued as [`ItemCommand`]s for the ECS to apply afterwards.

use bevy::prelude::{Entity, Resource};
use glam::Vec3;
use hashbrown::HashMap;

use crate::components::{Loot, Team};
use crate::entity::{AnchorState, Classification, EntityId, FormationSlot, ItemStatus, Sighting};
use crate::vector_math::{horizontal_distance, safe_normalize};
use crate::world::{FormationRoster, InventorySink, ItemHandling, Sensing};

use super::entity_id;

/// Leader displacement per tick below which it counts as standing still.
const STILL_EPSILON: f32 = 1e-4;

/// Item change requested by a brain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCommand {
    /// Attach `item` to `carrier`.
    Attach {
        /// The item.
        item: EntityId,
        /// The carrying agent.
        carrier: EntityId,
    },
    /// Drop `item` where it is.
    Release {
        /// The item.
        item: EntityId,
    },
    /// Hand `item` to the inventory and remove it from the arena.
    Deliver {
        /// The item.
        item: EntityId,
        /// The agent that carried it.
        carrier: EntityId,
    },
}

/// Arena state as of the start of the current tick.
#[derive(Resource, Debug, Default)]
pub struct WorldSnapshot {
    creatures: HashMap<EntityId, Sighting>,
    items: HashMap<EntityId, ItemStatus>,
    entities: HashMap<EntityId, Entity>,
    roster: Vec<EntityId>,
    leader: Option<AnchorState>,
    leader_previous: Option<Vec3>,
    commands: Vec<ItemCommand>,
}

impl WorldSnapshot {
    /// Forgets the previous tick, remembering only where the leader stood.
    pub fn begin(&mut self) {
        self.leader_previous = self.leader.map(|anchor| anchor.position);
        self.leader = None;
        self.creatures.clear();
        self.items.clear();
        self.entities.clear();
        self.roster.clear();
        self.commands.clear();
    }

    /// Records a living creature.
    pub fn insert_creature(&mut self, entity: Entity, team: Team, position: Vec3) {
        let id = entity_id(entity);
        self.entities.insert(id, entity);
        self.creatures.insert(
            id,
            Sighting {
                id,
                position,
                classification: team.classification(),
            },
        );
        if team == Team::Ally {
            self.roster.push(id);
        }
    }

    /// Records an item.
    pub fn insert_item(&mut self, entity: Entity, loot: &Loot, position: Vec3) {
        let id = entity_id(entity);
        self.entities.insert(id, entity);
        let classification = if loot.collectible {
            Classification::Collectible
        } else {
            Classification::Inert
        };
        self.items.insert(
            id,
            ItemStatus {
                position,
                classification,
                holder: loot.holder,
            },
        );
    }

    /// Records the formation leader.
    pub fn set_leader(&mut self, position: Vec3, forward: Vec3) {
        let moving = self
            .leader_previous
            .is_some_and(|previous| horizontal_distance(previous, position) > STILL_EPSILON);
        self.leader = Some(AnchorState {
            position,
            forward: safe_normalize(forward),
            moving,
        });
    }

    /// Orders the ally roster so slot indices are stable between ticks.
    pub fn finish(&mut self) {
        self.roster.sort_unstable();
    }

    /// Bevy entity behind `id`, if it was alive at the start of the tick.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    /// Removes and yields queued item commands in request order.
    pub fn drain_commands(&mut self) -> std::vec::Drain<'_, ItemCommand> {
        self.commands.drain(..)
    }
}

impl Sensing for WorldSnapshot {
    fn sense(&self, origin: Vec3, radius: f32, classification: Classification) -> Vec<Sighting> {
        let within = |position: Vec3| horizontal_distance(origin, position) <= radius;
        let mut found: Vec<Sighting> = self
            .creatures
            .values()
            .filter(|sighting| sighting.classification == classification && within(sighting.position))
            .copied()
            .collect();
        found.extend(
            self.items
                .iter()
                .filter(|(_, status)| status.classification == classification && within(status.position))
                .map(|(id, status)| Sighting {
                    id: *id,
                    position: status.position,
                    classification: status.classification,
                }),
        );
        found.sort_unstable_by_key(|sighting| sighting.id);
        found
    }

    fn locate(&self, id: EntityId) -> Option<Sighting> {
        self.creatures.get(&id).copied()
    }
}

impl ItemHandling for WorldSnapshot {
    fn item_status(&self, item: EntityId) -> Option<ItemStatus> {
        self.items.get(&item).copied()
    }

    fn attach(&mut self, item: EntityId, carrier: EntityId) -> bool {
        let Some(status) = self.items.get_mut(&item) else {
            return false;
        };
        if status.holder.is_some_and(|holder| holder != carrier) {
            return false;
        }
        status.holder = Some(carrier);
        self.commands.push(ItemCommand::Attach { item, carrier });
        true
    }

    fn release(&mut self, item: EntityId, carrier: EntityId) {
        if let Some(status) = self.items.get_mut(&item) {
            if status.holder == Some(carrier) {
                status.holder = None;
            }
        }
        self.commands.push(ItemCommand::Release { item });
    }
}

impl InventorySink for WorldSnapshot {
    fn deliver(&mut self, item: EntityId, carrier: EntityId) {
        self.items.remove(&item);
        self.commands.push(ItemCommand::Deliver { item, carrier });
    }
}

impl FormationRoster for WorldSnapshot {
    fn anchor(&self) -> Option<AnchorState> {
        self.leader
    }

    fn slot_of(&self, agent: EntityId) -> FormationSlot {
        let index = self
            .roster
            .iter()
            .position(|id| *id == agent)
            .unwrap_or_default();
        FormationSlot {
            index,
            count: self.roster.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::World;
    use rstest::rstest;

    fn snapshot_with_item() -> (WorldSnapshot, EntityId) {
        let mut snapshot = WorldSnapshot::default();
        let entity = World::new().spawn_empty().id();
        snapshot.insert_item(entity, &Loot::default(), Vec3::new(1.0, 0.0, 0.0));
        (snapshot, entity_id(entity))
    }

    #[rstest]
    fn second_claim_in_same_tick_fails() {
        let (mut snapshot, item) = snapshot_with_item();
        assert!(snapshot.attach(item, EntityId(100)));
        assert!(!snapshot.attach(item, EntityId(200)));
        let commands: Vec<_> = snapshot.drain_commands().collect();
        assert_eq!(
            commands,
            vec![ItemCommand::Attach {
                item,
                carrier: EntityId(100)
            }]
        );
    }

    #[rstest]
    fn delivered_item_disappears() {
        let (mut snapshot, item) = snapshot_with_item();
        snapshot.deliver(item, EntityId(100));
        assert!(snapshot.item_status(item).is_none());
        assert!(snapshot
            .sense(Vec3::ZERO, 5.0, Classification::Collectible)
            .is_empty());
    }

    #[rstest]
    fn leader_moving_flag_tracks_displacement() {
        let mut snapshot = WorldSnapshot::default();
        snapshot.set_leader(Vec3::ZERO, Vec3::Z);
        snapshot.begin();
        snapshot.set_leader(Vec3::ZERO, Vec3::Z);
        assert!(snapshot.anchor().is_some_and(|anchor| !anchor.moving));
        snapshot.begin();
        snapshot.set_leader(Vec3::X, Vec3::Z);
        assert!(snapshot.anchor().is_some_and(|anchor| anchor.moving));
    }

    #[rstest]
    fn empty_roster_reports_zero_siblings() {
        let snapshot = WorldSnapshot::default();
        assert_eq!(
            snapshot.slot_of(EntityId(3)),
            FormationSlot { index: 0, count: 0 }
        );
    }
}
