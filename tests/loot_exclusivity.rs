//! Two allies racing for the same item: exactly one carries and delivers it.

use std::sync::Arc;

use glam::Vec3;
use menagerie::behaviour::{BehaviourController, BehaviourEvent, BehaviourMode};
use menagerie::boundary::BoundaryOracle;
use menagerie::config::{BehaviourConfig, WanderConfig};
use menagerie::entity::{AgentBody, Classification, EntityId};
use menagerie::wander::WanderingController;
use rstest::rstest;
use test_utils::{agent_rig, ground, RecordingAnimation, ScriptedWorld, TestCreature};

const DT: f32 = 0.05;
const ITEM: EntityId = EntityId(90);

struct Ally {
    brain: BehaviourController,
    body: AgentBody,
    creature: TestCreature,
    animation: RecordingAnimation,
    carried_at_some_point: bool,
}

fn ally(id: u64, position: Vec3, oracle: &Arc<BoundaryOracle>) -> Ally {
    let wander = WanderingController::new(WanderConfig::default(), position, Arc::clone(oracle), id);
    Ally {
        brain: BehaviourController::new(EntityId(id), BehaviourConfig::default(), wander, Arc::clone(oracle)),
        body: AgentBody::at(position),
        creature: TestCreature::default(),
        animation: RecordingAnimation::default(),
        carried_at_some_point: false,
    }
}

fn race(world: &mut ScriptedWorld, allies: &mut [Ally], seconds: f32) {
    let mut now = 0.0_f64;
    while now < f64::from(seconds) {
        now += f64::from(DT);
        for ally in allies.iter_mut() {
            let mut rig = agent_rig(&mut ally.body, &mut ally.creature, &mut ally.animation);
            ally.brain.tick(&mut rig, &mut *world, now, DT);
            ally.carried_at_some_point |= ally.brain.carried_item().is_some();
        }
    }
}

fn scene() -> (ScriptedWorld, Vec<Ally>) {
    let oracle = Arc::new(BoundaryOracle::unbounded());
    let allies = vec![
        ally(1, ground(5.0, 1.0), &oracle),
        ally(2, ground(5.0, -1.0), &oracle),
    ];
    let mut world = ScriptedWorld::default();
    world.set_anchor(ground(0.0, 0.0), Vec3::Z, false);
    world.roster = vec![EntityId(1), EntityId(2)];
    world.put_item(ITEM, ground(4.0, 0.0));
    (world, allies)
}

#[rstest]
fn only_one_ally_ever_carries_the_item() {
    let (mut world, mut allies) = scene();
    race(&mut world, &mut allies, 15.0);

    let carriers = allies.iter().filter(|ally| ally.carried_at_some_point).count();
    assert_eq!(carriers, 1);
    assert_eq!(world.delivered.len(), 1);
    assert!(world.delivered.iter().all(|(item, _)| *item == ITEM));
    assert!(!world.items.contains_key(&ITEM));

    let deliveries: usize = allies
        .iter_mut()
        .map(|ally| {
            ally.brain
                .drain_events()
                .into_iter()
                .filter(|event| *event == BehaviourEvent::ItemDelivered { item: ITEM })
                .count()
        })
        .sum();
    assert_eq!(deliveries, 1);
    assert!(allies.iter().all(|ally| ally.brain.mode() != BehaviourMode::Carrying));
}

#[rstest]
fn item_turning_inert_is_left_alone() {
    let (mut world, mut allies) = scene();
    world.reclassify(ITEM, Classification::Inert);
    race(&mut world, &mut allies, 5.0);
    assert!(allies.iter().all(|ally| !ally.carried_at_some_point));
    assert!(world.delivered.is_empty());
    assert_eq!(world.holder_of(ITEM), None);
}
