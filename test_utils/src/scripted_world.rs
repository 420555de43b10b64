//! In-memory [`Surroundings`](menagerie::world::Surroundings) for driving a
//! behaviour controller without an ECS.

use std::collections::BTreeMap;

use glam::Vec3;
use menagerie::entity::{AnchorState, Classification, EntityId, FormationSlot, ItemStatus, Sighting};
use menagerie::vector_math::horizontal_distance;
use menagerie::world::{FormationRoster, InventorySink, ItemHandling, Sensing};

/// A hand-scripted scene: creatures, items, an anchor and a sibling roster.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWorld {
    /// Living creatures by id.
    pub creatures: BTreeMap<EntityId, Sighting>,
    /// Items by id.
    pub items: BTreeMap<EntityId, ItemStatus>,
    /// Formation anchor.
    pub anchor: Option<AnchorState>,
    /// Living siblings in slot order.
    pub roster: Vec<EntityId>,
    /// Deliveries as `(item, carrier)`.
    pub delivered: Vec<(EntityId, EntityId)>,
    /// Items released without delivery.
    pub released: Vec<EntityId>,
}

impl ScriptedWorld {
    /// Places (or moves) a creature.
    pub fn put_creature(&mut self, id: EntityId, position: Vec3, classification: Classification) {
        self.creatures.insert(
            id,
            Sighting {
                id,
                position,
                classification,
            },
        );
    }

    /// Places (or moves) a hostile creature.
    pub fn put_hostile(&mut self, id: EntityId, position: Vec3) {
        self.put_creature(id, position, Classification::Hostile);
    }

    /// Removes a creature as if it died.
    pub fn kill(&mut self, id: EntityId) {
        self.creatures.remove(&id);
    }

    /// Places an unheld collectible item.
    pub fn put_item(&mut self, id: EntityId, position: Vec3) {
        self.items.insert(
            id,
            ItemStatus {
                position,
                classification: Classification::Collectible,
                holder: None,
            },
        );
    }

    /// Changes an item's classification.
    pub fn reclassify(&mut self, id: EntityId, classification: Classification) {
        if let Some(item) = self.items.get_mut(&id) {
            item.classification = classification;
        }
    }

    /// Sets the formation anchor.
    pub fn set_anchor(&mut self, position: Vec3, forward: Vec3, moving: bool) {
        self.anchor = Some(AnchorState {
            position,
            forward,
            moving,
        });
    }

    /// Holder of an item, if the item still exists.
    pub fn holder_of(&self, id: EntityId) -> Option<EntityId> {
        self.items.get(&id).and_then(|item| item.holder)
    }
}

impl Sensing for ScriptedWorld {
    fn sense(&self, origin: Vec3, radius: f32, classification: Classification) -> Vec<Sighting> {
        let creatures = self.creatures.values().copied();
        let items = self.items.iter().map(|(id, item)| Sighting {
            id: *id,
            position: item.position,
            classification: item.classification,
        });
        let mut found: Vec<Sighting> = creatures
            .chain(items)
            .filter(|sighting| {
                sighting.classification == classification
                    && horizontal_distance(origin, sighting.position) <= radius
            })
            .collect();
        found.sort_by_key(|sighting| sighting.id);
        found
    }

    fn locate(&self, id: EntityId) -> Option<Sighting> {
        self.creatures.get(&id).copied()
    }
}

impl ItemHandling for ScriptedWorld {
    fn item_status(&self, item: EntityId) -> Option<ItemStatus> {
        self.items.get(&item).copied()
    }

    fn attach(&mut self, item: EntityId, carrier: EntityId) -> bool {
        match self.items.get_mut(&item) {
            Some(status) if status.holder.is_none_or(|holder| holder == carrier) => {
                status.holder = Some(carrier);
                true
            }
            _ => false,
        }
    }

    fn release(&mut self, item: EntityId, carrier: EntityId) {
        if let Some(status) = self.items.get_mut(&item) {
            if status.holder == Some(carrier) {
                status.holder = None;
            }
        }
        self.released.push(item);
    }
}

impl InventorySink for ScriptedWorld {
    fn deliver(&mut self, item: EntityId, carrier: EntityId) {
        self.items.remove(&item);
        self.delivered.push((item, carrier));
    }
}

impl FormationRoster for ScriptedWorld {
    fn anchor(&self) -> Option<AnchorState> {
        self.anchor
    }

    fn slot_of(&self, agent: EntityId) -> FormationSlot {
        let index = self
            .roster
            .iter()
            .position(|id| *id == agent)
            .unwrap_or_default();
        FormationSlot {
            index,
            count: self.roster.len().max(1),
        }
    }
}
