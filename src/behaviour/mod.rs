//! Companion behaviour state machine.
//!
//! [`BehaviourController`] sits above a [`WanderingController`] and decides,
//! once per tick, whether its agent idles, follows the anchor, wanders,
//! fights, fetches loot, carries loot home or walks back into its wander
//! radius. It either moves the agent itself through
//! [`step_towards`](crate::motion::step_towards) or defers to the wandering
//! controller, never both in the same tick.
//!
//! Priorities per tick, highest first:
//!
//! 1. death, which is terminal;
//! 2. carrying an item to the delivery point;
//! 3. noticing a hostile and switching to `Attacking`;
//! 4. the current mode's own work, including the lost-target chase.
//!
//! Interruptions remember the mode they interrupted and restore it when they
//! end.

mod formation;
mod mode;

use std::sync::Arc;

use glam::Vec3;
use hashbrown::HashSet;
use log::{debug, info, warn};
use ordered_float::OrderedFloat;

use crate::boundary::BoundaryOracle;
use crate::config::BehaviourConfig;
use crate::entity::{AgentBody, Classification, EntityId, Sighting};
use crate::motion::{step_towards, AgentRig, MissingCollaborators, StepOutcome};
use crate::vector_math::{horizontal_direction, horizontal_distance};
use crate::wander::WanderingController;
use crate::world::Surroundings;
use crate::WAYPOINT_REACHED_THRESHOLD;

use formation::FormationTracker;
pub use formation::{slot_angle, slot_position};
pub use mode::{BehaviourEvent, BehaviourMode, Driver};

/// Fraction of the attack range an attacker closes to before striking.
const APPROACH_FRACTION: f32 = 0.8;

/// Per-agent companion brain.
#[derive(Debug)]
pub struct BehaviourController {
    id: EntityId,
    config: BehaviourConfig,
    oracle: Arc<BoundaryOracle>,
    wander: WanderingController,
    mode: BehaviourMode,
    original_mode: BehaviourMode,
    target: Option<EntityId>,
    last_known: Option<Vec3>,
    detected_item: Option<EntityId>,
    carried_item: Option<EntityId>,
    unreachable_items: HashSet<EntityId>,
    last_attack: Option<f64>,
    formation: FormationTracker,
    events: Vec<BehaviourEvent>,
    missing: MissingCollaborators,
    driver: Driver,
}

impl BehaviourController {
    /// Creates a controller for agent `id` in the configured initial mode.
    ///
    /// `wander` must share `oracle`; it is enabled here when the initial mode
    /// is `Wandering` and disabled otherwise. A `sensor_range` beyond
    /// `give_up_range` is clamped to it.
    #[must_use]
    pub fn new(
        id: EntityId,
        mut config: BehaviourConfig,
        mut wander: WanderingController,
        oracle: Arc<BoundaryOracle>,
    ) -> Self {
        let mode = if config.initial_mode.is_resumable() {
            config.initial_mode
        } else {
            warn!(
                "{id:?}: initial mode {:?} needs a target; starting Idle",
                config.initial_mode
            );
            BehaviourMode::Idle
        };
        if config.sensor_range > config.give_up_range {
            warn!(
                "{id:?}: sensor range {} exceeds give-up range {}; clamping",
                config.sensor_range, config.give_up_range
            );
            config.sensor_range = config.give_up_range;
        }
        if mode == BehaviourMode::Wandering {
            wander.enable();
        } else {
            wander.disable();
        }
        Self {
            id,
            config,
            oracle,
            wander,
            mode,
            original_mode: mode,
            target: None,
            last_known: None,
            detected_item: None,
            carried_item: None,
            unreachable_items: HashSet::new(),
            last_attack: None,
            formation: FormationTracker::default(),
            events: Vec::new(),
            missing: MissingCollaborators::default(),
            driver: Driver::None,
        }
    }

    /// Identifier of the controlled agent.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> BehaviourMode {
        self.mode
    }

    /// Mode restored once the current interruption ends.
    #[must_use]
    pub const fn original_mode(&self) -> BehaviourMode {
        self.original_mode
    }

    /// Hostile currently engaged, if it is still known to exist.
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Last position the engaged hostile was seen at.
    #[must_use]
    pub const fn last_known_position(&self) -> Option<Vec3> {
        self.last_known
    }

    /// Item being walked to.
    #[must_use]
    pub const fn detected_item(&self) -> Option<EntityId> {
        self.detected_item
    }

    /// Item being carried.
    #[must_use]
    pub const fn carried_item(&self) -> Option<EntityId> {
        self.carried_item
    }

    /// Simulated time of the last landed attack.
    #[must_use]
    pub const fn last_attack_time(&self) -> Option<f64> {
        self.last_attack
    }

    /// Which controller wrote the body during the last tick.
    #[must_use]
    pub const fn last_driver(&self) -> Driver {
        self.driver
    }

    /// The owned wandering controller.
    #[must_use]
    pub const fn wander(&self) -> &WanderingController {
        &self.wander
    }

    /// Takes every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<BehaviourEvent> {
        std::mem::take(&mut self.events)
    }

    /// Applies an owner's command (follow, wander or stay).
    ///
    /// Fights, loot pursuits and returns are cancelled on the spot. A carried
    /// item is still delivered first; the command becomes the mode resumed
    /// afterwards. Commanding `Wandering` re-anchors the wander radius at the
    /// agent's current position. Other modes and dead agents ignore the
    /// command.
    pub fn set_mode(&mut self, mode: BehaviourMode, body: &AgentBody) {
        if self.mode == BehaviourMode::Dead || !mode.is_resumable() {
            debug!("{:?}: ignoring command {mode:?} in {:?}", self.id, self.mode);
            return;
        }
        if mode == BehaviourMode::Wandering {
            self.wander.set_spawn_anchor(body.position);
        }
        if self.mode == BehaviourMode::Carrying {
            self.original_mode = mode;
            return;
        }
        self.target = None;
        self.last_known = None;
        self.detected_item = None;
        self.original_mode = mode;
        if self.mode == mode && mode == BehaviourMode::Wandering {
            self.wander.force_new_waypoint(body);
        }
        self.enter(mode, body);
    }

    /// Advances the controller by one tick.
    ///
    /// `now` is the simulated time in seconds used for attack cooldowns and
    /// `dt` the tick length.
    pub fn tick(&mut self, rig: &mut AgentRig<'_>, world: &mut dyn Surroundings, now: f64, dt: f32) {
        self.driver = Driver::None;
        if self.mode == BehaviourMode::Dead {
            return;
        }
        self.missing.check("behaviour controller", rig);
        if rig.is_dead() {
            self.die(rig, world);
            return;
        }

        if self.mode == BehaviourMode::Carrying {
            self.carry(rig, world, dt);
            return;
        }

        self.sense_hostiles(rig, world);
        if self.config.collect_loot && self.mode.is_resumable() {
            self.sense_loot(rig, world);
        }

        match self.mode {
            BehaviourMode::Attacking => self.fight(rig, world, now, dt),
            BehaviourMode::GoingToLoot => self.fetch(rig, world, dt),
            BehaviourMode::Carrying => self.carry(rig, world, dt),
            BehaviourMode::Returning => self.return_home(rig, dt),
            BehaviourMode::Following => self.follow(rig, world, dt),
            BehaviourMode::Wandering => {
                self.wander.enable();
                if self.wander.tick(rig, dt) {
                    self.driver = Driver::Wander;
                }
            }
            BehaviourMode::Idle => rig.set_walking(false),
            BehaviourMode::Dead => {}
        }
    }

    fn enter(&mut self, next: BehaviourMode, body: &AgentBody) {
        let previous = self.mode;
        if previous == next {
            return;
        }
        self.mode = next;
        if next == BehaviourMode::Wandering {
            self.wander.enable();
            self.wander.force_new_waypoint(body);
        } else {
            self.wander.disable();
        }
        if next == BehaviourMode::Following {
            self.formation.reset();
        }
        info!("{:?}: {previous:?} -> {next:?}", self.id);
        self.events.push(BehaviourEvent::ModeChanged {
            from: previous,
            to: next,
        });
    }

    /// Restores the interrupted mode, walking home first when a resumed
    /// wander would start outside the wander radius.
    fn resume(&mut self, body: &AgentBody) {
        let mode = self.original_mode;
        let radius = self.wander.config().max_wander_radius;
        if mode == BehaviourMode::Wandering && body.distance_to(self.wander.spawn_anchor()) > radius {
            self.enter(BehaviourMode::Returning, body);
        } else {
            self.enter(mode, body);
        }
    }

    /// Records the mode to restore when an interruption starts from the
    /// current mode.
    fn remember_mode(&mut self) {
        match self.mode {
            mode if mode.is_resumable() => self.original_mode = mode,
            BehaviourMode::Returning => self.original_mode = BehaviourMode::Wandering,
            _ => {}
        }
    }

    fn die(&mut self, rig: &mut AgentRig<'_>, world: &mut dyn Surroundings) {
        if let Some(item) = self.carried_item.take() {
            world.release(item, self.id);
        }
        self.target = None;
        self.last_known = None;
        self.detected_item = None;
        rig.set_walking(false);
        self.enter(BehaviourMode::Dead, rig.body);
    }

    fn attack_range(&self, rig: &AgentRig<'_>) -> f32 {
        rig.attack_range().unwrap_or(self.config.fallback_attack_range)
    }

    fn nearest(&self, origin: Vec3, sightings: Vec<Sighting>) -> Option<Sighting> {
        sightings
            .into_iter()
            .filter(|sighting| sighting.id != self.id)
            .min_by_key(|sighting| OrderedFloat(horizontal_distance(origin, sighting.position)))
    }

    fn sense_hostiles(&mut self, rig: &mut AgentRig<'_>, world: &dyn Surroundings) {
        let fighting = self.mode == BehaviourMode::Attacking && self.target.is_some();
        if fighting {
            return;
        }
        let origin = rig.position();
        let sightings = world.sense(origin, self.config.sensor_range, Classification::Hostile);
        let Some(hostile) = self.nearest(origin, sightings) else {
            return;
        };
        if self.mode != BehaviourMode::Attacking {
            self.remember_mode();
            if let Some(item) = self.detected_item.take() {
                debug!("{:?}: dropping pursuit of {item:?} to fight", self.id);
            }
        }
        debug!("{:?}: engaging {:?}", self.id, hostile.id);
        self.target = Some(hostile.id);
        self.last_known = Some(hostile.position);
        self.enter(BehaviourMode::Attacking, rig.body);
    }

    fn sense_loot(&mut self, rig: &mut AgentRig<'_>, world: &dyn Surroundings) {
        let origin = rig.position();
        let sightings: Vec<Sighting> = world
            .sense(origin, self.config.loot_sensor_range, Classification::Collectible)
            .into_iter()
            .filter(|sighting| !self.unreachable_items.contains(&sighting.id))
            .filter(|sighting| {
                world
                    .item_status(sighting.id)
                    .is_some_and(|status| status.available_to(self.id))
            })
            .collect();
        let Some(item) = self.nearest(origin, sightings) else {
            return;
        };
        self.remember_mode();
        self.detected_item = Some(item.id);
        debug!("{:?}: spotted {:?}", self.id, item.id);
        self.enter(BehaviourMode::GoingToLoot, rig.body);
    }

    fn disengage(&mut self, body: &AgentBody) {
        self.target = None;
        self.last_known = None;
        self.resume(body);
    }

    fn fight(&mut self, rig: &mut AgentRig<'_>, world: &dyn Surroundings, now: f64, dt: f32) {
        let sighting = self.target.and_then(|target| {
            world
                .locate(target)
                .filter(|sighting| sighting.classification == Classification::Hostile)
        });
        let Some(sighting) = sighting else {
            if let Some(lost) = self.target.take() {
                debug!("{:?}: lost {lost:?}; chasing last known position", self.id);
            }
            self.chase_last_known(rig, dt);
            return;
        };
        let position = rig.position();
        let distance = horizontal_distance(position, sighting.position);
        if distance > self.config.give_up_range {
            debug!("{:?}: {:?} out of range; giving up", self.id, sighting.id);
            self.disengage(rig.body);
            return;
        }
        self.last_known = Some(sighting.position);
        self.driver = Driver::Behaviour;

        let Some(direction) = horizontal_direction(position, sighting.position) else {
            self.strike(rig, sighting.id, now);
            return;
        };
        rig.face(direction, self.config.turn_rate_factor, dt);

        let range = self.attack_range(rig);
        if distance > range {
            let approach = sighting.position - direction * (range * APPROACH_FRACTION);
            step_towards(
                rig,
                &self.oracle,
                approach,
                WAYPOINT_REACHED_THRESHOLD,
                self.config.chase_speed_factor,
                dt,
            );
            return;
        }
        rig.set_walking(false);
        self.strike(rig, sighting.id, now);
    }

    fn strike(&mut self, rig: &mut AgentRig<'_>, target: EntityId, now: f64) {
        let cooldown = f64::from(rig.attack_cooldown().unwrap_or(0.0));
        let ready = self.last_attack.is_none_or(|last| now >= last + cooldown);
        if ready && rig.try_attack(target) {
            self.last_attack = Some(now);
            self.events.push(BehaviourEvent::AttackLanded { target });
        }
    }

    fn chase_last_known(&mut self, rig: &mut AgentRig<'_>, dt: f32) {
        let Some(spot) = self.last_known else {
            self.disengage(rig.body);
            return;
        };
        let range = self.attack_range(rig);
        let distance = horizontal_distance(rig.position(), spot);
        if distance <= range || distance > self.config.give_up_range {
            self.disengage(rig.body);
            return;
        }
        match step_towards(rig, &self.oracle, spot, range, self.config.chase_speed_factor, dt) {
            StepOutcome::Moved => self.driver = Driver::Behaviour,
            StepOutcome::Arrived | StepOutcome::Blocked => self.disengage(rig.body),
        }
    }

    fn abandon_item(&mut self, body: &AgentBody, item: EntityId) {
        debug!("{:?}: abandoning {item:?}", self.id);
        self.detected_item = None;
        self.resume(body);
    }

    fn fetch(&mut self, rig: &mut AgentRig<'_>, world: &mut dyn Surroundings, dt: f32) {
        let Some(item) = self.detected_item else {
            self.resume(rig.body);
            return;
        };
        let Some(status) = world
            .item_status(item)
            .filter(|status| status.available_to(self.id))
        else {
            self.abandon_item(rig.body, item);
            return;
        };

        if rig.body.distance_to(status.position) <= self.config.pickup_distance {
            rig.set_walking(false);
            if world.attach(item, self.id) {
                self.detected_item = None;
                self.carried_item = Some(item);
                info!("{:?}: picked up {item:?}", self.id);
                self.enter(BehaviourMode::Carrying, rig.body);
            } else {
                self.abandon_item(rig.body, item);
            }
            return;
        }

        match step_towards(
            rig,
            &self.oracle,
            status.position,
            self.config.pickup_distance,
            self.config.travel_speed_factor,
            dt,
        ) {
            StepOutcome::Moved | StepOutcome::Arrived => self.driver = Driver::Behaviour,
            StepOutcome::Blocked => {
                self.unreachable_items.insert(item);
                self.abandon_item(rig.body, item);
            }
        }
    }

    fn delivery_point(&self, world: &dyn Surroundings) -> Vec3 {
        self.config
            .delivery_point
            .or_else(|| world.anchor().map(|anchor| anchor.position))
            .unwrap_or_else(|| self.wander.spawn_anchor())
    }

    fn carry(&mut self, rig: &mut AgentRig<'_>, world: &mut dyn Surroundings, dt: f32) {
        let Some(item) = self.carried_item else {
            self.resume(rig.body);
            return;
        };
        if world.item_status(item).is_none() {
            debug!("{:?}: carried {item:?} vanished", self.id);
            self.carried_item = None;
            self.resume(rig.body);
            return;
        }
        let destination = self.delivery_point(world);
        let outcome = if rig.body.distance_to(destination) <= self.config.delivery_distance {
            StepOutcome::Arrived
        } else {
            step_towards(
                rig,
                &self.oracle,
                destination,
                self.config.delivery_distance,
                self.config.travel_speed_factor,
                dt,
            )
        };
        match outcome {
            StepOutcome::Moved => self.driver = Driver::Behaviour,
            StepOutcome::Arrived | StepOutcome::Blocked => {
                if outcome == StepOutcome::Blocked {
                    debug!("{:?}: delivery point unreachable; delivering here", self.id);
                }
                rig.set_walking(false);
                world.deliver(item, self.id);
                self.carried_item = None;
                info!("{:?}: delivered {item:?}", self.id);
                self.events.push(BehaviourEvent::ItemDelivered { item });
                self.resume(rig.body);
            }
        }
    }

    fn return_home(&mut self, rig: &mut AgentRig<'_>, dt: f32) {
        let anchor = self.wander.spawn_anchor();
        let config = self.wander.config();
        let home_radius = config.max_wander_radius * config.recovery_return_ratio;
        match step_towards(
            rig,
            &self.oracle,
            anchor,
            home_radius,
            self.config.travel_speed_factor,
            dt,
        ) {
            StepOutcome::Moved => self.driver = Driver::Behaviour,
            StepOutcome::Arrived | StepOutcome::Blocked => {
                self.enter(BehaviourMode::Wandering, rig.body);
            }
        }
    }

    fn follow(&mut self, rig: &mut AgentRig<'_>, world: &dyn Surroundings, dt: f32) {
        let Some(anchor) = world.anchor() else {
            rig.set_walking(false);
            return;
        };
        if !self.formation.is_active() && rig.body.distance_to(anchor.position) > self.config.follow_distance {
            self.formation.start();
        }
        if !self.formation.is_active() {
            rig.set_walking(false);
            return;
        }
        let (radius, spread) = (self.config.formation_radius, self.config.formation_spread_degrees);
        let id = self.id;
        let slot = self
            .formation
            .target(dt, self.config.formation_refresh_interval, anchor.moving, || {
                slot_position(&anchor, world.slot_of(id), radius, spread)
            });
        match step_towards(
            rig,
            &self.oracle,
            slot,
            WAYPOINT_REACHED_THRESHOLD,
            self.config.travel_speed_factor,
            dt,
        ) {
            StepOutcome::Moved => self.driver = Driver::Behaviour,
            StepOutcome::Arrived | StepOutcome::Blocked => self.formation.settle(),
        }
    }
}
