//! Combat gating and mode resumption driven through the public API.

use std::sync::Arc;

use menagerie::behaviour::{BehaviourController, BehaviourEvent, BehaviourMode};
use menagerie::boundary::BoundaryOracle;
use menagerie::config::{BehaviourConfig, WanderConfig};
use menagerie::entity::{AgentBody, EntityId};
use menagerie::wander::WanderingController;
use rstest::{fixture, rstest};
use test_utils::{agent_rig, ground, RecordingAnimation, ScriptedWorld, TestCreature};

const DT: f32 = 0.05;
const ALLY: EntityId = EntityId(1);
const HOSTILE: EntityId = EntityId(50);

struct Duel {
    brain: BehaviourController,
    body: AgentBody,
    creature: TestCreature,
    animation: RecordingAnimation,
    world: ScriptedWorld,
    now: f64,
}

impl Duel {
    fn tick(&mut self) {
        self.now += f64::from(DT);
        self.creature.now = self.now;
        let mut rig = agent_rig(&mut self.body, &mut self.creature, &mut self.animation);
        self.brain.tick(&mut rig, &mut self.world, self.now, DT);
    }

    fn run(&mut self, seconds: f32) {
        let end = self.now + f64::from(seconds);
        while self.now < end {
            self.tick();
        }
    }
}

fn duel(initial_mode: BehaviourMode) -> Duel {
    let oracle = Arc::new(BoundaryOracle::unbounded());
    let config = BehaviourConfig {
        initial_mode,
        collect_loot: false,
        ..BehaviourConfig::default()
    };
    let wander = WanderingController::new(WanderConfig::default(), ground(0.0, 0.0), Arc::clone(&oracle), 21);
    let mut world = ScriptedWorld::default();
    world.set_anchor(ground(0.0, 0.0), glam::Vec3::Z, false);
    world.roster = vec![ALLY];
    Duel {
        brain: BehaviourController::new(ALLY, config, wander, oracle),
        body: AgentBody::at(ground(0.0, -2.0)),
        creature: TestCreature::default(),
        animation: RecordingAnimation::default(),
        world,
        now: 0.0,
    }
}

#[fixture]
fn following() -> Duel {
    duel(BehaviourMode::Following)
}

#[rstest]
fn attacks_are_spaced_by_the_cooldown(mut following: Duel) {
    following.world.put_hostile(HOSTILE, ground(0.0, -1.0));
    following.run(3.6);
    let times = following.creature.attack_times();
    assert_eq!(times.len(), 4, "attacks at {times:?}");
    for pair in times.windows(2) {
        if let [earlier, later] = pair {
            assert!(later - earlier >= 1.0 - 1e-9, "attacks at {times:?}");
        }
    }
    assert!(following
        .creature
        .attacks
        .iter()
        .all(|(target, _)| *target == HOSTILE));
}

#[rstest]
#[case(BehaviourMode::Following)]
#[case(BehaviourMode::Idle)]
#[case(BehaviourMode::Wandering)]
fn killing_the_target_restores_the_interrupted_mode(#[case] initial: BehaviourMode) {
    let mut duel = duel(initial);
    duel.world.put_hostile(HOSTILE, ground(0.0, -1.0));
    duel.tick();
    assert_eq!(duel.brain.mode(), BehaviourMode::Attacking);
    assert_eq!(duel.brain.original_mode(), initial);

    duel.world.kill(HOSTILE);
    duel.tick();
    assert_eq!(duel.brain.mode(), initial);
    assert!(duel.brain.target().is_none());

    let changes: Vec<_> = duel
        .brain
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, BehaviourEvent::ModeChanged { .. }))
        .collect();
    assert_eq!(
        changes,
        vec![
            BehaviourEvent::ModeChanged {
                from: initial,
                to: BehaviourMode::Attacking
            },
            BehaviourEvent::ModeChanged {
                from: BehaviourMode::Attacking,
                to: initial
            },
        ]
    );
}

#[rstest]
fn hostile_beyond_sensor_range_is_ignored(mut following: Duel) {
    following.world.put_hostile(HOSTILE, ground(0.0, 30.0));
    following.run(1.0);
    assert_ne!(following.brain.mode(), BehaviourMode::Attacking);
    assert!(following.creature.attacks.is_empty());
}

#[rstest]
fn dead_agent_stops_acting(mut following: Duel) {
    following.world.put_hostile(HOSTILE, ground(0.0, -1.0));
    following.creature.dead = true;
    following.run(2.0);
    assert_eq!(following.brain.mode(), BehaviourMode::Dead);
    assert!(following.creature.attacks.is_empty());

    following.brain.set_mode(BehaviourMode::Following, &AgentBody::default());
    assert_eq!(following.brain.mode(), BehaviourMode::Dead);
}
