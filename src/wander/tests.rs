//! Unit tests for the wandering phase machine and waypoint ladder.

use super::*;
use crate::boundary::BoundaryRegion;
use crate::vector_math::flatten;
use crate::world::MockObstacleProbe;
use approx::assert_relative_eq;
use rstest::{fixture, rstest};
use std::f32::consts::FRAC_PI_2;

const DT: f32 = 0.05;

fn probe(blocked: impl Fn(Vec3, Vec3) -> bool + Send + 'static) -> Arc<dyn ObstacleProbe> {
    let mut probe = MockObstacleProbe::new();
    probe.expect_blocked().returning(blocked);
    Arc::new(probe)
}

#[fixture]
fn config() -> WanderConfig {
    WanderConfig {
        max_wander_radius: 5.0,
        ..WanderConfig::default()
    }
}

fn controller(config: WanderConfig) -> WanderingController {
    WanderingController::new(config, Vec3::ZERO, Arc::new(BoundaryOracle::unbounded()), 11)
}

fn run(wander: &mut WanderingController, body: &mut AgentBody, seconds: f32) {
    let mut elapsed = 0.0;
    while elapsed < seconds {
        let mut rig = AgentRig::new(body);
        wander.tick(&mut rig, DT);
        elapsed += DT;
    }
}

#[rstest]
fn new_controller_is_disabled_until_enabled(config: WanderConfig) {
    let mut wander = controller(config);
    let mut body = AgentBody::at(Vec3::ZERO);
    assert_eq!(wander.mode(), WanderMode::Disabled);
    assert!(!wander.tick(&mut AgentRig::new(&mut body), DT));

    wander.enable();
    assert_eq!(wander.mode(), WanderMode::Idle);
    wander.disable();
    assert_eq!(wander.mode(), WanderMode::Disabled);
}

#[rstest]
fn random_waypoints_respect_safe_radius(config: WanderConfig) {
    let limit = config.max_wander_radius * config.radius_safety_factor;
    let mut wander = controller(config);
    for step in 0..50_u8 {
        let position = Vec3::new(f32::from(step % 7) * 0.5, 0.0, 0.0);
        let choice = wander.select_waypoint(position);
        match choice.source {
            WaypointSource::Random => {
                assert!(horizontal_distance(choice.point, Vec3::ZERO) <= limit + 1e-4);
            }
            WaypointSource::TowardAnchor | WaypointSource::Stationary => {
                assert!(horizontal_distance(choice.point, Vec3::ZERO) <= horizontal_distance(position, Vec3::ZERO));
            }
        }
    }
}

#[rstest]
fn ladder_steps_towards_anchor_when_random_candidates_fail() {
    let tight = WanderConfig {
        max_wander_radius: 1.0,
        ..WanderConfig::default()
    };
    let mut wander = controller(tight);
    let choice = wander.select_waypoint(Vec3::new(0.5, 0.0, 0.0));
    assert_eq!(choice.source, WaypointSource::TowardAnchor);
    assert_relative_eq!(choice.point.x, 0.0, epsilon = 1e-5);
    assert_eq!(wander.last_waypoint_source(), Some(WaypointSource::TowardAnchor));
}

#[rstest]
fn ladder_stays_put_when_everything_is_blocked(config: WanderConfig) {
    let mut wander = controller(config).with_probe(probe(|_, _| true));
    let position = Vec3::new(1.0, 0.0, 2.0);
    let choice = wander.select_waypoint(position);
    assert_eq!(choice.source, WaypointSource::Stationary);
    assert_eq!(choice.point, position);
}

#[rstest]
fn ladder_heads_home_when_probe_blocks_random_candidates(config: WanderConfig) {
    // Only paths pointing straight at the anchor are clear.
    let heads_home = |from: Vec3, to: Vec3| {
        let leg = flatten(to - from);
        let home = flatten(Vec3::ZERO - from);
        leg.cross(home).length() < 1e-3 && leg.dot(home) > 0.0
    };
    let mut wander = controller(config).with_probe(probe(move |from, to| !heads_home(from, to)));
    let position = Vec3::new(3.0, 0.0, 0.0);
    let choice = wander.select_waypoint(position);
    assert_eq!(choice.source, WaypointSource::TowardAnchor);
    assert!(horizontal_distance(choice.point, Vec3::ZERO) < horizontal_distance(position, Vec3::ZERO));
}

#[rstest]
fn ladder_stays_put_at_anchor_when_radius_is_too_small() {
    let tight = WanderConfig {
        max_wander_radius: 1.0,
        ..WanderConfig::default()
    };
    let mut wander = controller(tight);
    let choice = wander.select_waypoint(Vec3::ZERO);
    assert_eq!(choice.source, WaypointSource::Stationary);
}

#[rstest]
fn ladder_rejects_paths_leaving_the_arena(config: WanderConfig) {
    let oracle = BoundaryOracle::unbounded().with_region(BoundaryRegion::circle(Vec3::ZERO, 0.5));
    let mut wander = WanderingController::new(config, Vec3::ZERO, Arc::new(oracle), 3);
    let choice = wander.select_waypoint(Vec3::ZERO);
    assert_eq!(choice.source, WaypointSource::Stationary);
}

#[rstest]
fn same_seed_selects_same_waypoints(config: WanderConfig) {
    let mut first = controller(config.clone());
    let mut second = controller(config);
    for _ in 0..5 {
        assert_eq!(first.select_waypoint(Vec3::ZERO), second.select_waypoint(Vec3::ZERO));
    }
}

#[rstest]
fn turn_completes_before_any_movement(config: WanderConfig) {
    let turn_duration = config.turn_duration;
    let mut wander = controller(config);
    let mut body = AgentBody::at(Vec3::ZERO);
    wander.force_new_waypoint_towards(Vec3::X, &body);
    assert_eq!(wander.mode(), WanderMode::Turning);

    run(&mut wander, &mut body, turn_duration - DT * 1.5);
    assert_eq!(wander.mode(), WanderMode::Turning);
    assert_eq!(body.position, Vec3::ZERO);

    run(&mut wander, &mut body, DT * 2.0);
    assert_relative_eq!(body.yaw, FRAC_PI_2, epsilon = 1e-4);
    assert_eq!(wander.mode(), WanderMode::Moving);
}

#[rstest]
fn forced_target_is_clamped_inside_safe_radius(config: WanderConfig) {
    let limit = config.max_wander_radius * config.radius_safety_factor;
    let mut wander = controller(config);
    let body = AgentBody::at(Vec3::new(3.0, 0.0, 0.0));
    wander.force_new_waypoint_towards(Vec3::X, &body);
    assert_relative_eq!(wander.current_waypoint().x, limit, epsilon = 1e-4);
}

#[rstest]
fn normal_cycle_resumes_after_forced_leg(config: WanderConfig) {
    let mut wander = controller(config);
    let mut body = AgentBody::at(Vec3::ZERO);
    wander.enable();
    wander.force_new_waypoint_towards(Vec3::X, &body);
    let forced = wander.current_waypoint();

    let mut modes = vec![wander.mode()];
    let mut elapsed = 0.0;
    while elapsed < 15.0 {
        let mut rig = AgentRig::new(&mut body);
        wander.tick(&mut rig, DT);
        elapsed += DT;
        if modes.last() != Some(&wander.mode()) {
            modes.push(wander.mode());
        }
    }
    assert!(
        modes.starts_with(&[
            WanderMode::Turning,
            WanderMode::Moving,
            WanderMode::Idle,
            WanderMode::Turning,
            WanderMode::Moving,
        ]),
        "modes {modes:?}"
    );
    assert_ne!(wander.current_waypoint(), forced);
    assert!(wander.last_waypoint_source().is_some());
}

#[rstest]
fn inverted_ranges_are_clamped_to_their_minimum() {
    let wander = controller(WanderConfig {
        min_wait_time: 4.0,
        max_wait_time: 1.0,
        min_wander_distance: 3.0,
        max_wander_distance: 2.0,
        ..WanderConfig::default()
    });
    assert_relative_eq!(wander.config().max_wait_time, 4.0);
    assert_relative_eq!(wander.config().max_wander_distance, 3.0);
}

#[rstest]
fn force_idle_cancels_movement(config: WanderConfig) {
    let mut wander = controller(config);
    let mut body = AgentBody::at(Vec3::ZERO);
    wander.force_new_waypoint_towards(Vec3::Z, &body);
    run(&mut wander, &mut body, 1.0);
    assert_eq!(wander.mode(), WanderMode::Moving);

    wander.force_idle();
    assert_eq!(wander.mode(), WanderMode::Idle);
    let before = body.position;
    let mut rig = AgentRig::new(&mut body);
    assert!(!wander.tick(&mut rig, DT));
    assert_eq!(body.position, before);
}

#[rstest]
fn moving_snaps_to_ground_height(config: WanderConfig) {
    let anchor = Vec3::new(0.0, 2.0, 0.0);
    let mut wander = WanderingController::new(config, anchor, Arc::new(BoundaryOracle::unbounded()), 5);
    let mut body = AgentBody::at(Vec3::ZERO);
    wander.force_new_waypoint_towards(Vec3::Z, &body);
    run(&mut wander, &mut body, 1.0);
    assert_relative_eq!(body.position.y, 2.0);
}

#[rstest]
fn step_out_of_radius_triggers_recovery(config: WanderConfig) {
    let radius = config.max_wander_radius;
    let return_ratio = config.recovery_return_ratio;
    let mut wander = controller(config);
    let mut body = AgentBody::at(Vec3::new(6.0, 0.0, 0.0));
    wander.force_new_waypoint_towards(Vec3::Z, &body);

    let mut saw_recovery = false;
    let mut elapsed = 0.0;
    while elapsed < 10.0 {
        let mut rig = AgentRig::new(&mut body);
        wander.tick(&mut rig, DT);
        elapsed += DT;
        if wander.mode() == WanderMode::Recovering {
            saw_recovery = true;
        } else if saw_recovery {
            break;
        }
    }
    assert!(saw_recovery);
    assert_eq!(wander.mode(), WanderMode::Idle);
    assert!(horizontal_distance(body.position, Vec3::ZERO) <= radius * return_ratio + 0.2);
}

#[rstest]
fn agent_never_leaves_wander_radius(config: WanderConfig) {
    let radius = config.max_wander_radius;
    let mut wander = controller(config);
    let mut body = AgentBody::at(Vec3::ZERO);
    wander.enable();
    for _ in 0..20_000 {
        let mut rig = AgentRig::new(&mut body);
        wander.tick(&mut rig, DT);
        assert!(horizontal_distance(body.position, Vec3::ZERO) <= radius + 1e-3);
    }
}

#[rstest]
fn controller_is_driving_only_while_turning_or_moving(config: WanderConfig) {
    let mut wander = controller(config);
    let mut body = AgentBody::at(Vec3::ZERO);
    wander.force_idle();
    let mut rig = AgentRig::new(&mut body);
    assert!(!wander.tick(&mut rig, DT));
    assert!(!wander.is_driving());

    wander.force_new_waypoint_towards(Vec3::X, &body);
    let mut rig = AgentRig::new(&mut body);
    assert!(wander.tick(&mut rig, DT));
    assert!(wander.is_driving());
}
