// End-to-end route scenarios: search, execute, and physics together.
//
// Every test builds a small world, hands the bot some items, and runs the
// controller until the route finishes. Assertions are about where the bot
// ended up and what it changed in the world, not about exact tick counts;
// the physics stand-in is too crude for those to mean anything.

use std::time::Duration;

use blocknav_engine::controller::ControllerStatus;
use blocknav_engine::inventory::PlayerInventory;
use blocknav_engine::testing::BotEvent;
use blocknav_engine::types::Vec3i;
use blocknav_scenarios::{Scenario, TestWorld};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn walks_across_flat_ground() {
    init_logging();
    let goal = Vec3i::new(5, 0, 3);
    let mut scenario = Scenario::builder(TestWorld::flat(), Vec3i::ZERO, goal).build();
    assert_eq!(scenario.run(600), ControllerStatus::Finished);
    assert_eq!(scenario.feet(), goal);
    assert_eq!(scenario.searches(), 1);
    assert!(scenario.errors.is_empty());
}

#[test]
fn already_at_the_goal_finishes_without_moving() {
    init_logging();
    let mut scenario = Scenario::builder(TestWorld::flat(), Vec3i::ZERO, Vec3i::ZERO).build();
    assert_eq!(scenario.run(10), ControllerStatus::Finished);
    assert_eq!(scenario.ticks, 0);
    assert_eq!(scenario.feet(), Vec3i::ZERO);
}

#[test]
fn climbs_a_step_and_a_slab() {
    init_logging();
    let world = TestWorld::flat()
        .set(Vec3i::new(0, 0, 2), "oak_slab")
        .fill(Vec3i::new(-12, 0, 3), Vec3i::new(12, 0, 12), "stone");
    let goal = Vec3i::new(0, 1, 5);
    let mut scenario = Scenario::builder(world, Vec3i::ZERO, goal).build();
    assert_eq!(scenario.run(600), ControllerStatus::Finished);
    assert_eq!(scenario.feet(), goal);
}

#[test]
fn digs_through_a_wall() {
    init_logging();
    let world = TestWorld::flat().fill(Vec3i::new(-12, 0, 2), Vec3i::new(12, 3, 2), "stone");
    let goal = Vec3i::new(0, 0, 4);
    let mut scenario = Scenario::builder(world, Vec3i::ZERO, goal)
        .give("stone_pickaxe", 1)
        .build();
    let stone = scenario.bot.registry.state_by_name("stone").expect("standard block");
    let stone_before = scenario.bot.level.count(stone);
    assert_eq!(scenario.run(2_000), ControllerStatus::Finished);
    assert_eq!(scenario.feet(), goal);

    let broken = scenario
        .bot
        .events
        .iter()
        .filter(|e| matches!(e, BotEvent::FinishBreak(..)))
        .count();
    assert!(broken >= 2, "only {broken} blocks broken");
    assert_eq!(scenario.bot.level.count(stone), stone_before - broken);
}

#[test]
fn bridges_a_trench() {
    init_logging();
    let world = TestWorld::flat().clear(Vec3i::new(-12, -4, 2), Vec3i::new(12, -1, 3));
    let goal = Vec3i::new(0, 0, 5);
    let mut scenario = Scenario::builder(world, Vec3i::ZERO, goal)
        .give("dirt", 8)
        .build();
    assert_eq!(scenario.run(1_000), ControllerStatus::Finished);
    assert_eq!(scenario.feet(), goal);
    assert!(scenario.count_of("dirt") <= 6);
    assert!(
        scenario
            .bot
            .events
            .iter()
            .any(|e| matches!(e, BotEvent::Place { .. }))
    );
}

#[test]
fn towers_straight_up() {
    init_logging();
    let goal = Vec3i::new(0, 3, 0);
    let mut scenario = Scenario::builder(TestWorld::flat(), Vec3i::ZERO, goal)
        .give("dirt", 5)
        .build();
    assert_eq!(scenario.run(600), ControllerStatus::Finished);
    scenario.settle(40);
    assert!(scenario.bot.pose.on_ground);
    assert_eq!(scenario.feet(), goal);
    assert_eq!(scenario.count_of("dirt"), 2);
    for y in 0..3 {
        assert_eq!(scenario.name_at(Vec3i::new(0, y, 0)), "dirt");
    }
}

#[test]
fn jumps_a_one_block_gap() {
    init_logging();
    let world = TestWorld::flat().clear(Vec3i::new(-12, -4, 2), Vec3i::new(12, -1, 2));
    let goal = Vec3i::new(0, 0, 4);
    let mut scenario = Scenario::builder(world, Vec3i::ZERO, goal).build();
    assert_eq!(scenario.run(600), ControllerStatus::Finished);
    assert_eq!(scenario.feet(), goal);
}

#[test]
fn digs_straight_down() {
    init_logging();
    let goal = Vec3i::new(0, -3, 0);
    let mut scenario = Scenario::builder(TestWorld::flat(), Vec3i::ZERO, goal)
        .give("stone_pickaxe", 1)
        .build();
    assert_eq!(scenario.run(2_000), ControllerStatus::Finished);
    scenario.settle(20);
    assert_eq!(scenario.feet(), goal);
    for y in -3..0 {
        assert_eq!(scenario.name_at(Vec3i::new(0, y, 0)), "air");
    }
}

#[test]
fn partial_routes_are_continued() {
    init_logging();
    let goal = Vec3i::new(10, 0, 7);
    let mut scenario = Scenario::builder(TestWorld::flat(), Vec3i::ZERO, goal)
        .budget(8)
        .build();
    assert_eq!(scenario.run(3_000), ControllerStatus::Finished);
    assert_eq!(scenario.feet(), goal);
    assert!(scenario.searches() > 1, "expected several partial searches");
}

#[test]
fn cancelling_stops_the_bot() {
    init_logging();
    let goal = Vec3i::new(10, 0, 10);
    let mut scenario = Scenario::builder(TestWorld::flat(), Vec3i::ZERO, goal).build();
    assert_eq!(scenario.run(10), ControllerStatus::Running);

    scenario.controller.cancel();
    assert!(scenario.controller.wait_idle(Duration::from_secs(10)));
    let stopped_at = scenario.bot.pose.position;
    let ticks = scenario.ticks;

    assert_eq!(scenario.run(50), ControllerStatus::Cancelled);
    assert_eq!(scenario.ticks, ticks);
    assert_eq!(scenario.bot.pose.position, stopped_at);
    assert_ne!(scenario.feet(), goal);
}

#[test]
fn missing_blocks_at_execution_time_fail_the_route() {
    init_logging();
    let world = TestWorld::flat().clear(Vec3i::new(-12, -4, 2), Vec3i::new(12, -1, 3));
    let mut scenario = Scenario::builder(world, Vec3i::ZERO, Vec3i::new(0, 0, 5))
        .give("dirt", 8)
        .build();
    // The planner still sees the dirt from the first snapshot.
    scenario.bot.inventory = PlayerInventory::default();

    let status = scenario.run(1_000);
    assert!(matches!(status, ControllerStatus::Failed(_)), "{status:?}");
    assert_eq!(scenario.errors.len(), 1);
    assert!(scenario.errors[0].contains("inventory has none"));
}
