//! Systems bridging the behaviour controllers with Bevy ECS.
//!
//! Each tick runs the chain installed by [`super::CreaturePlugin`]: the clock
//! advances, a [`WorldSnapshot`] is rebuilt, wanderers and brains write their
//! bodies back into `Transform`, queued item commands are applied and landed
//! strikes are resolved.

use std::collections::VecDeque;
use std::sync::Arc;

use bevy::prelude::*;
use log::{debug, info};

use crate::behaviour::BehaviourEvent;
use crate::boundary::BoundaryOracle;
use crate::components::{Brain, Creature, Gait, Health, Loot, Team, Wanderer};
use crate::entity::{AgentBody, EntityId};
use crate::motion::{turn_body, AgentRig};
use crate::vector_math::{flatten, safe_normalize, yaw_of};
use crate::world::Locomotion;
use crate::{BEHAVIOUR_LOG_CAPACITY, CARRY_HEIGHT, TICK_SECONDS};

use super::snapshot::{ItemCommand, WorldSnapshot};
use super::strike_inbox::{Strike, StrikeInbox};
use super::{entity_id, SimulationError};

/// Shared arena boundary every controller was built with.
#[derive(Resource, Debug, Clone, Deref)]
pub struct Arena(pub Arc<BoundaryOracle>);

impl Default for Arena {
    fn default() -> Self {
        Self(Arc::new(BoundaryOracle::unbounded()))
    }
}

/// Simulated time.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    /// Seconds elapsed since the simulation started.
    pub now: f64,
    /// Seconds advanced per tick.
    pub step: f32,
}

impl SimClock {
    /// A clock at time zero advancing `step` seconds per tick.
    #[must_use]
    pub const fn new(step: f32) -> Self {
        Self { now: 0.0, step }
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(TICK_SECONDS)
    }
}

/// One item handed to the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// The delivered item.
    pub item: EntityId,
    /// The agent that carried it home.
    pub carrier: EntityId,
}

/// Items delivered so far, in delivery order.
#[derive(Resource, Debug, Default)]
pub struct DeliveryLedger {
    deliveries: Vec<Delivery>,
}

impl DeliveryLedger {
    /// Records a delivery.
    pub fn record(&mut self, delivery: Delivery) {
        self.deliveries.push(delivery);
    }

    /// Every delivery so far.
    #[must_use]
    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    /// Number of delivered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    /// Whether nothing has been delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }
}

/// Controller events drained from every brain, tagged with the emitting agent.
///
/// Holds at most `capacity` entries; the oldest are evicted first. Readers
/// either inspect the window with [`entries`](Self::entries) or take it with
/// [`drain`](Self::drain).
#[derive(Resource, Debug)]
pub struct BehaviourLog {
    entries: VecDeque<(EntityId, BehaviourEvent)>,
    capacity: usize,
    total: u64,
}

impl Default for BehaviourLog {
    fn default() -> Self {
        Self::with_capacity(BEHAVIOUR_LOG_CAPACITY)
    }
}

impl BehaviourLog {
    /// An empty log retaining at most `capacity` entries (minimum one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    /// Appends an event emitted by `agent`, evicting the oldest when full.
    pub fn record(&mut self, agent: EntityId, event: BehaviourEvent) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((agent, event));
        self.total += 1;
    }

    /// Retained events in emission order.
    pub fn entries(&self) -> impl Iterator<Item = &(EntityId, BehaviourEvent)> {
        self.entries.iter()
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no events are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events recorded since startup, including evicted and drained ones.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Takes every retained event, oldest first.
    pub fn drain(&mut self) -> Vec<(EntityId, BehaviourEvent)> {
        self.entries.drain(..).collect()
    }
}

/// [`Locomotion`] over a creature's ECS stats.
///
/// Attacks always land; the behaviour controller owns the cooldown gate and
/// the damage is queued in the [`StrikeInbox`].
pub struct CreatureMotor<'a> {
    id: EntityId,
    stats: &'a Creature,
    health: Health,
    strikes: &'a mut StrikeInbox,
}

impl<'a> CreatureMotor<'a> {
    /// Wraps the stats of creature `id`.
    pub fn new(id: EntityId, stats: &'a Creature, health: Health, strikes: &'a mut StrikeInbox) -> Self {
        Self {
            id,
            stats,
            health,
            strikes,
        }
    }
}

impl Locomotion for CreatureMotor<'_> {
    fn move_speed(&self) -> f32 {
        self.stats.move_speed
    }

    fn is_dead(&self) -> bool {
        self.health.0 == 0
    }

    fn attack_range(&self) -> f32 {
        self.stats.attack_range
    }

    fn attack_cooldown(&self) -> f32 {
        self.stats.attack_cooldown
    }

    fn move_in_direction(&mut self, body: &mut AgentBody, direction: Vec3, speed_factor: f32, dt: f32) {
        body.position += safe_normalize(flatten(direction)) * self.stats.move_speed * speed_factor * dt;
    }

    fn rotate_towards(&mut self, body: &mut AgentBody, direction: Vec3, turn_rate_factor: f32, dt: f32) {
        turn_body(body, direction, self.stats.turn_rate * turn_rate_factor * dt);
    }

    fn try_attack(&mut self, target: EntityId) -> bool {
        self.strikes.push(Strike {
            attacker: self.id,
            target,
            damage: self.stats.attack_damage,
        });
        true
    }
}

/// Reads the agent body out of a transform.
#[must_use]
pub fn body_from_transform(transform: &Transform) -> AgentBody {
    AgentBody {
        position: transform.translation,
        yaw: yaw_of(transform.rotation * Vec3::Z),
    }
}

fn write_body(transform: &mut Transform, body: AgentBody) {
    transform.translation = body.position;
    transform.rotation = Quat::from_rotation_y(body.yaw);
}

/// Advances [`SimClock`] by one step.
pub fn advance_clock_system(mut clock: ResMut<SimClock>) {
    clock.now += f64::from(clock.step);
}

/// Rebuilds the [`WorldSnapshot`] from living creatures and loot.
pub fn build_snapshot_system(
    mut snapshot: ResMut<WorldSnapshot>,
    creatures: Query<(Entity, &Team, &Health, &Transform)>,
    loot: Query<(Entity, &Loot, &Transform)>,
) {
    snapshot.begin();
    for (entity, team, health, transform) in &creatures {
        if health.0 == 0 {
            continue;
        }
        if *team == Team::Leader {
            snapshot.set_leader(transform.translation, transform.rotation * Vec3::Z);
        }
        snapshot.insert_creature(entity, *team, transform.translation);
    }
    for (entity, item, transform) in &loot {
        snapshot.insert_item(entity, item, transform.translation);
    }
    snapshot.finish();
}

type WandererRow<'w> = (
    Entity,
    &'w mut Wanderer,
    &'w mut Transform,
    &'w Creature,
    &'w Health,
    Option<&'w mut Gait>,
);

/// Ticks every creature driven only by a [`Wanderer`].
pub fn drive_wanderers_system(
    clock: Res<SimClock>,
    mut strikes: ResMut<StrikeInbox>,
    mut agents: Query<WandererRow<'_>, Without<Brain>>,
) {
    for (entity, mut wanderer, mut transform, stats, health, mut gait) in &mut agents {
        if health.0 == 0 {
            continue;
        }
        let before = body_from_transform(&transform);
        let mut body = before;
        let mut motor = CreatureMotor::new(entity_id(entity), stats, *health, strikes.as_mut());
        let mut rig = AgentRig::new(&mut body).with_locomotion(&mut motor);
        if let Some(gait) = gait.as_deref_mut() {
            rig = rig.with_animation(gait);
        }
        wanderer.tick(&mut rig, clock.step);
        if body != before {
            write_body(&mut transform, body);
        }
    }
}

type BrainRow<'w> = (
    Entity,
    &'w mut Brain,
    &'w mut Transform,
    &'w Creature,
    &'w Health,
    Option<&'w mut Gait>,
);

/// Ticks every companion brain against the current snapshot.
pub fn drive_brains_system(
    clock: Res<SimClock>,
    mut snapshot: ResMut<WorldSnapshot>,
    mut strikes: ResMut<StrikeInbox>,
    mut log: ResMut<BehaviourLog>,
    mut agents: Query<BrainRow<'_>, Without<Wanderer>>,
) {
    for (entity, mut brain, mut transform, stats, health, mut gait) in &mut agents {
        let id = entity_id(entity);
        let before = body_from_transform(&transform);
        let mut body = before;
        let mut motor = CreatureMotor::new(id, stats, *health, strikes.as_mut());
        let mut rig = AgentRig::new(&mut body).with_locomotion(&mut motor);
        if let Some(gait) = gait.as_deref_mut() {
            rig = rig.with_animation(gait);
        }
        brain.tick(&mut rig, &mut *snapshot, clock.now, clock.step);
        if body != before {
            write_body(&mut transform, body);
        }
        for event in brain.drain_events() {
            log.record(id, event);
        }
    }
}

/// Applies queued attach, release and delivery commands, then moves carried
/// loot along with its carrier.
pub fn apply_item_commands_system(
    mut commands: Commands,
    mut snapshot: ResMut<WorldSnapshot>,
    mut ledger: ResMut<DeliveryLedger>,
    mut items: Query<(&mut Loot, &mut Transform), Without<Creature>>,
    carriers: Query<&Transform, With<Creature>>,
) {
    let pending: Vec<ItemCommand> = snapshot.drain_commands().collect();
    for command in pending {
        let item = match command {
            ItemCommand::Attach { item, .. }
            | ItemCommand::Release { item }
            | ItemCommand::Deliver { item, .. } => item,
        };
        let Some((entity, mut loot)) = snapshot
            .entity(item)
            .and_then(|entity| items.get_mut(entity).ok().map(|(loot, _)| (entity, loot)))
        else {
            commands.trigger(SimulationError::UnknownItem { item });
            continue;
        };
        match command {
            ItemCommand::Attach { carrier, .. } => loot.holder = Some(carrier),
            ItemCommand::Release { .. } => loot.holder = None,
            ItemCommand::Deliver { carrier, .. } => {
                info!("{carrier:?} delivered {item:?}");
                ledger.record(Delivery { item, carrier });
                commands.entity(entity).despawn();
            }
        }
    }

    for (mut loot, mut transform) in &mut items {
        let Some(holder) = loot.holder else {
            continue;
        };
        match snapshot
            .entity(holder)
            .and_then(|entity| carriers.get(entity).ok())
        {
            Some(carrier) => {
                transform.translation = carrier.translation + Vec3::Y * CARRY_HEIGHT;
            }
            None => {
                debug!("carrier {holder:?} is gone; dropping its item");
                loot.holder = None;
            }
        }
    }
}

/// Despawns creatures that died last tick, then applies this tick's strikes.
///
/// A creature reaching zero health survives until the next tick so its brain
/// observes the death and releases what it carries.
pub fn resolve_strikes_system(
    mut commands: Commands,
    snapshot: Res<WorldSnapshot>,
    mut strikes: ResMut<StrikeInbox>,
    mut victims: Query<(Entity, &mut Health), With<Creature>>,
) {
    for (entity, health) in &victims {
        if health.0 == 0 {
            commands.entity(entity).despawn();
        }
    }

    for strike in strikes.drain() {
        let Some(mut health) = snapshot
            .entity(strike.target)
            .and_then(|entity| victims.get_mut(entity).ok())
            .map(|(_, health)| health)
        else {
            commands.trigger(SimulationError::UnknownTarget {
                attacker: strike.attacker,
                target: strike.target,
            });
            continue;
        };
        if health.0 == 0 {
            continue;
        }
        health.0 = health.0.saturating_sub(strike.damage);
        debug!(
            "{:?} hit {:?} for {}; {} left",
            strike.attacker, strike.target, strike.damage, health.0
        );
        if health.0 == 0 {
            info!("{:?} was slain by {:?}", strike.target, strike.attacker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behaviour::BehaviourMode;
    use rstest::rstest;

    fn changed(to: BehaviourMode) -> BehaviourEvent {
        BehaviourEvent::ModeChanged {
            from: BehaviourMode::Idle,
            to,
        }
    }

    #[rstest]
    fn behaviour_log_evicts_oldest_beyond_capacity() {
        let mut log = BehaviourLog::with_capacity(2);
        log.record(EntityId(1), changed(BehaviourMode::Following));
        log.record(EntityId(1), changed(BehaviourMode::Wandering));
        log.record(EntityId(2), changed(BehaviourMode::Attacking));
        assert_eq!(log.len(), 2);
        assert_eq!(log.total(), 3);
        let agents: Vec<_> = log.entries().map(|(agent, _)| *agent).collect();
        assert_eq!(agents, vec![EntityId(1), EntityId(2)]);
    }

    #[rstest]
    fn behaviour_log_drain_empties_the_window() {
        let mut log = BehaviourLog::default();
        log.record(EntityId(3), changed(BehaviourMode::Following));
        assert_eq!(log.drain(), vec![(EntityId(3), changed(BehaviourMode::Following))]);
        assert!(log.is_empty());
        assert_eq!(log.total(), 1);
    }
}
