// The path executor: steps through a route one game tick at a time.
//
// `PathExecutor` owns a queue of `WorldAction`s and is ticked once per
// game tick by whatever drives the bot. Each `tick` call:
//
// 1. Finishes if the queue is empty.
// 2. Asks for recalculation if the front step is the recalculate marker,
//    if it has used up its `allowed_ticks`, or if the bot has drifted more
//    than `max_error_distance` blocks from the step's target.
// 3. Pops the front step if it is already completed and loops back to 1
//    in the same call, so finished steps never cost an idle tick.
// 4. Otherwise counts the tick and ticks the step.
//
// The executor is synchronous and owns no threads. Recalculation is
// reported as `ExecutorStatus::NeedsRecalculation`; acting on it (settle,
// search, install a fresh executor) is `controller.rs`'s job.
//
// See also: `world_action.rs` for the step contract, `controller.rs` for
// the lifecycle around this.
//
// **Critical constraint: one tick, one step tick.** At most one step is
// ticked per call. Completed steps are skipped, never ticked.

use crate::bot::BotConnection;
use crate::config::NavConfig;
use crate::error::ExecutionError;
use crate::world_action::WorldAction;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutorStatus {
    Running,
    Finished,
    NeedsRecalculation,
}

pub struct PathExecutor {
    queue: VecDeque<Box<dyn WorldAction>>,
    /// Ticks spent on the front step.
    ticks: u32,
    total_steps: usize,
    step_number: usize,
    max_error_distance: f64,
}

impl PathExecutor {
    pub fn new(actions: Vec<Box<dyn WorldAction>>, config: &NavConfig) -> Self {
        let total_steps = actions.len();
        Self {
            queue: actions.into(),
            ticks: 0,
            total_steps,
            step_number: 0,
            max_error_distance: config.max_error_distance,
        }
    }

    pub fn remaining_steps(&self) -> usize {
        self.queue.len()
    }

    /// Description of the step being worked on, for status displays.
    pub fn current_step(&self) -> Option<String> {
        self.queue.front().map(|step| step.to_string())
    }

    pub fn tick(
        &mut self,
        bot: &mut dyn BotConnection,
    ) -> Result<ExecutorStatus, ExecutionError> {
        loop {
            let Some(step) = self.queue.front_mut() else {
                log::info!("route finished after {} steps", self.total_steps);
                return Ok(ExecutorStatus::Finished);
            };

            if step.is_recalculate_marker() {
                log::info!("reached the end of a partial route, recalculating");
                return Ok(ExecutorStatus::NeedsRecalculation);
            }

            if self.ticks >= step.allowed_ticks() {
                log::warn!(
                    "step {}/{} ({step}) timed out after {} ticks, recalculating",
                    self.step_number + 1,
                    self.total_steps,
                    self.ticks
                );
                return Ok(ExecutorStatus::NeedsRecalculation);
            }

            if let Some(target) = step.target_position() {
                let distance = bot.pose().position.distance(target.bottom_center());
                if distance > self.max_error_distance {
                    log::warn!(
                        "bot is {distance:.1} blocks from {target} ({step}), recalculating"
                    );
                    return Ok(ExecutorStatus::NeedsRecalculation);
                }
            }

            if step.is_completed(&*bot) {
                self.queue.pop_front();
                self.ticks = 0;
                self.step_number += 1;
                log::info!("completed step {}/{}", self.step_number, self.total_steps);
                continue;
            }

            self.ticks += 1;
            step.tick(bot)?;
            return Ok(ExecutorStatus::Running);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockRegistry;
    use crate::testing::RecordingBot;
    use crate::types::{Vec3d, Vec3i};
    use crate::world::BlockGrid;
    use crate::world_action::RecalculatePathAction;
    use std::fmt;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Completes once ticked `needed` times; counts its ticks in `log`.
    struct Scripted {
        name: &'static str,
        needed: u32,
        done: u32,
        allowed: u32,
        target: Option<Vec3i>,
        log: Arc<AtomicU32>,
    }

    impl Scripted {
        fn new(name: &'static str, needed: u32, log: &Arc<AtomicU32>) -> Self {
            Self {
                name,
                needed,
                done: 0,
                allowed: 100,
                target: None,
                log: Arc::clone(log),
            }
        }

        fn boxed(self) -> Box<dyn WorldAction> {
            Box::new(self)
        }
    }

    impl fmt::Display for Scripted {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.name)
        }
    }

    impl WorldAction for Scripted {
        fn is_completed(&self, _bot: &dyn BotConnection) -> bool {
            self.done >= self.needed
        }

        fn tick(&mut self, _bot: &mut dyn BotConnection) -> Result<(), ExecutionError> {
            self.done += 1;
            self.log.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn allowed_ticks(&self) -> u32 {
            self.allowed
        }

        fn target_position(&self) -> Option<Vec3i> {
            self.target
        }
    }

    struct Failing;

    impl fmt::Display for Failing {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("failing")
        }
    }

    impl WorldAction for Failing {
        fn is_completed(&self, _bot: &dyn BotConnection) -> bool {
            false
        }

        fn tick(&mut self, _bot: &mut dyn BotConnection) -> Result<(), ExecutionError> {
            Err(ExecutionError::MissingItem {
                action: self.to_string(),
                wanted: "anything".to_string(),
            })
        }

        fn allowed_ticks(&self) -> u32 {
            10
        }

        fn target_position(&self) -> Option<Vec3i> {
            None
        }
    }

    fn bot() -> RecordingBot {
        let registry = Arc::new(BlockRegistry::standard());
        RecordingBot::new(registry, BlockGrid::new(Vec3i::ZERO, 1, 1, 1), Vec3i::ZERO)
    }

    #[test]
    fn empty_route_finishes_immediately() {
        let mut bot = bot();
        let mut executor = PathExecutor::new(Vec::new(), &NavConfig::default());
        assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::Finished));
    }

    #[test]
    fn timeout_triggers_on_the_tick_after_the_budget() {
        let mut bot = bot();
        let log = Arc::new(AtomicU32::new(0));
        let mut stuck = Scripted::new("stuck", u32::MAX, &log);
        stuck.allowed = 5;
        let mut executor = PathExecutor::new(vec![stuck.boxed()], &NavConfig::default());

        for tick in 1..=5 {
            assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::Running), "tick {tick}");
        }
        assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::NeedsRecalculation));
        assert_eq!(log.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn completed_steps_do_not_waste_a_tick() {
        let mut bot = bot();
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));
        let steps = vec![
            Scripted::new("first", 1, &first).boxed(),
            Scripted::new("second", 2, &second).boxed(),
        ];
        let mut executor = PathExecutor::new(steps, &NavConfig::default());

        // Tick 1 works on the first step.
        assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::Running));
        assert_eq!((first.load(Ordering::Relaxed), second.load(Ordering::Relaxed)), (1, 0));

        // Tick 2 sees the first step done and ticks the second right away.
        assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::Running));
        assert_eq!((first.load(Ordering::Relaxed), second.load(Ordering::Relaxed)), (1, 1));
        assert_eq!(executor.current_step().as_deref(), Some("second"));

        assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::Running));
        assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::Finished));
        assert_eq!(second.load(Ordering::Relaxed), 2);
        assert_eq!(executor.remaining_steps(), 0);
    }

    #[test]
    fn exposed_marker_recalculates_in_the_same_tick() {
        let mut bot = bot();
        let log = Arc::new(AtomicU32::new(0));
        let steps: Vec<Box<dyn WorldAction>> = vec![
            Scripted::new("walk", 1, &log).boxed(),
            Box::new(RecalculatePathAction),
        ];
        let mut executor = PathExecutor::new(steps, &NavConfig::default());
        assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::Running));
        assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::NeedsRecalculation));
        assert_eq!(log.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn drifting_away_recalculates() {
        let mut bot = bot();
        let log = Arc::new(AtomicU32::new(0));
        let mut walk = Scripted::new("walk", 10, &log);
        walk.target = Some(Vec3i::new(0, 0, 5));
        let config = NavConfig {
            max_error_distance: 8.0,
            ..NavConfig::default()
        };
        let mut executor = PathExecutor::new(vec![walk.boxed()], &config);

        assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::Running));
        bot.teleport(Vec3d::new(0.5, 0.0, -5.0));
        assert_eq!(executor.tick(&mut bot), Ok(ExecutorStatus::NeedsRecalculation));
        assert_eq!(log.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn step_errors_propagate() {
        let mut bot = bot();
        let steps: Vec<Box<dyn WorldAction>> = vec![Box::new(Failing)];
        let mut executor = PathExecutor::new(steps, &NavConfig::default());
        assert!(matches!(
            executor.tick(&mut bot),
            Err(ExecutionError::MissingItem { .. })
        ));
    }
}
