// World actions: the stateful terminal steps of an executing route.
//
// A `WorldAction` is one step of a route as it runs on a live bot. The
// graph only emits `PlannedAction` data. `PlannedAction::into_world_action`
// turns each one into a boxed action at the moment execution begins, so
// per-step state (ticks spent jumping, remaining dig ticks, whether the
// place packet went out) never leaks into the graph.
//
// The contract every action follows:
// - `is_completed` reads the bot and the level only.
// - `tick` resets the control inputs and then sets only what this tick
//   needs. It may turn the bot, swap items and send dig/place packets.
// - `allowed_ticks` is the budget the executor gives the step before it
//   gives up and recalculates.
//
// This file holds the movement family (walk, gap jump) and the recalculate
// marker. Digging and placing live in `block_break.rs` and
// `block_place.rs`; item swapping shared by both is in `equip.rs`.
//
// See also: `executor.rs` for the state machine that drives these,
// `bot.rs` for the connection trait.
//
// **Critical constraint: single-step scope.** An action never looks at
// the rest of the route. Timeouts, drift and replanning are the
// executor's business.

use crate::block_break::BlockBreakAction;
use crate::block_place::{BlockPlaceAction, JumpAndPlaceBelowAction};
use crate::bot::BotConnection;
use crate::collision::BOT_HALF_WIDTH;
use crate::config::NavConfig;
use crate::error::ExecutionError;
use crate::graph::PlannedAction;
use crate::types::{Vec3d, Vec3i, wrap_degrees};
use std::fmt;

/// Tick budget for walking, falling, gap jumps and towering.
pub const MOVEMENT_ALLOWED_TICKS: u32 = 100;
pub const BREAK_ALLOWED_TICKS: u32 = 400;
pub const PLACE_ALLOWED_TICKS: u32 = 60;

/// How close (in blocks) the feet must get to the target point.
const ARRIVAL_DISTANCE: f64 = BOT_HALF_WIDTH - 0.1;
/// Vertical tolerance for being "on the same level" as the target.
const ARRIVAL_HEIGHT: f64 = 0.25;
/// Vanilla step height; anything higher needs a jump.
const STEP_HEIGHT: f64 = 0.6;
/// Diagonal walks jump once every this many ticks.
const DIAGONAL_JUMP_INTERVAL: u32 = 4;

pub trait WorldAction: fmt::Display + Send {
    fn is_completed(&self, bot: &dyn BotConnection) -> bool;

    fn tick(&mut self, bot: &mut dyn BotConnection) -> Result<(), ExecutionError>;

    fn allowed_ticks(&self) -> u32;

    /// The block the feet should end up in, for drift checks.
    fn target_position(&self) -> Option<Vec3i>;

    /// Reaching this step means the route was partial: plan again.
    fn is_recalculate_marker(&self) -> bool {
        false
    }
}

impl PlannedAction {
    pub fn into_world_action(self, config: &NavConfig) -> Box<dyn WorldAction> {
        let threshold = config.yaw_noise_threshold_degrees;
        match self {
            PlannedAction::Move { target, diagonal } => {
                Box::new(MovementAction::new(target, diagonal, threshold))
            }
            PlannedAction::GapJump { target } => Box::new(GapJumpAction::new(target, threshold)),
            PlannedAction::Break { pos, face } => Box::new(BlockBreakAction::new(pos, face)),
            PlannedAction::Place { pos, against, face } => {
                Box::new(BlockPlaceAction::new(pos, against, face))
            }
            PlannedAction::JumpAndPlaceBelow { pos, against, face } => {
                Box::new(JumpAndPlaceBelowAction::new(pos, against, face))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared movement helpers
// ---------------------------------------------------------------------------

/// The point the feet aim for: centre of the target block's walkable top.
pub(crate) fn top_middle_of(bot: &dyn BotConnection, pos: Vec3i) -> Vec3d {
    let top = bot.registry().top_of_shape(bot.level().block_state(pos));
    pos.bottom_center().offset(0.0, top, 0.0)
}

pub(crate) fn has_arrived(bot: &dyn BotConnection, target: Vec3i) -> bool {
    let point = top_middle_of(bot, target);
    let position = bot.pose().position;
    (position.y - point.y).abs() <= ARRIVAL_HEIGHT && position.distance(point) < ARRIVAL_DISTANCE
}

/// Yaw tracking shared by the walking actions. Small corrections are
/// swallowed so the bot does not jitter around the path line.
#[derive(Clone, Copy, Debug)]
struct Steering {
    threshold: f32,
    looked: bool,
}

impl Steering {
    fn new(threshold: f32) -> Self {
        Self {
            threshold,
            looked: false,
        }
    }

    /// Face `point` horizontally and press forward unless already above it.
    fn walk_towards(&mut self, bot: &mut dyn BotConnection, point: Vec3d) {
        let pose = bot.pose();
        let (yaw, _) = pose.eye_position().rotation_towards(point);
        if !self.looked || wrap_degrees(yaw - pose.yaw).abs() > self.threshold {
            bot.set_rotation(yaw, 0.0);
            self.looked = true;
        }
        if pose.position.horizontal_distance(point) >= ARRIVAL_DISTANCE {
            bot.controls().forward = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Walk, step up, jump up or fall into `target`.
pub struct MovementAction {
    target: Vec3i,
    /// Diagonal moves only hop occasionally; jumping every tick against a
    /// corner makes the bot bounce off it.
    diagonal: bool,
    steering: Steering,
    ticks_without_jump: u32,
}

impl MovementAction {
    pub fn new(target: Vec3i, diagonal: bool, yaw_threshold: f32) -> Self {
        Self {
            target,
            diagonal,
            steering: Steering::new(yaw_threshold),
            ticks_without_jump: 0,
        }
    }

    fn should_jump(&mut self) -> bool {
        if !self.diagonal {
            return true;
        }
        if self.ticks_without_jump + 1 < DIAGONAL_JUMP_INTERVAL {
            self.ticks_without_jump += 1;
            false
        } else {
            self.ticks_without_jump = 0;
            true
        }
    }
}

impl WorldAction for MovementAction {
    fn is_completed(&self, bot: &dyn BotConnection) -> bool {
        has_arrived(bot, self.target)
    }

    fn tick(&mut self, bot: &mut dyn BotConnection) -> Result<(), ExecutionError> {
        bot.controls().reset();
        let point = top_middle_of(bot, self.target);
        self.steering.walk_towards(bot, point);
        if point.y - STEP_HEIGHT > bot.pose().position.y && self.should_jump() {
            bot.controls().jumping = true;
        }
        Ok(())
    }

    fn allowed_ticks(&self) -> u32 {
        MOVEMENT_ALLOWED_TICKS
    }

    fn target_position(&self) -> Option<Vec3i> {
        Some(self.target)
    }
}

impl fmt::Display for MovementAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.diagonal {
            write!(f, "move diagonally to {}", self.target)
        } else {
            write!(f, "move to {}", self.target)
        }
    }
}

/// Sprint-free jump across a one block gap.
pub struct GapJumpAction {
    target: Vec3i,
    steering: Steering,
    jump_next: bool,
}

impl GapJumpAction {
    pub fn new(target: Vec3i, yaw_threshold: f32) -> Self {
        Self {
            target,
            steering: Steering::new(yaw_threshold),
            jump_next: true,
        }
    }
}

impl WorldAction for GapJumpAction {
    fn is_completed(&self, bot: &dyn BotConnection) -> bool {
        has_arrived(bot, self.target)
    }

    fn tick(&mut self, bot: &mut dyn BotConnection) -> Result<(), ExecutionError> {
        bot.controls().reset();
        let point = top_middle_of(bot, self.target);
        self.steering.walk_towards(bot, point);
        bot.controls().jumping = self.jump_next;
        self.jump_next = !self.jump_next;
        Ok(())
    }

    fn allowed_ticks(&self) -> u32 {
        MOVEMENT_ALLOWED_TICKS
    }

    fn target_position(&self) -> Option<Vec3i> {
        Some(self.target)
    }
}

impl fmt::Display for GapJumpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "jump across the gap to {}", self.target)
    }
}

// ---------------------------------------------------------------------------
// Recalculate marker
// ---------------------------------------------------------------------------

/// Appended to partial routes. Never completes; the executor stops on it.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecalculatePathAction;

impl WorldAction for RecalculatePathAction {
    fn is_completed(&self, _bot: &dyn BotConnection) -> bool {
        false
    }

    fn tick(&mut self, _bot: &mut dyn BotConnection) -> Result<(), ExecutionError> {
        Ok(())
    }

    fn allowed_ticks(&self) -> u32 {
        0
    }

    fn target_position(&self) -> Option<Vec3i> {
        None
    }

    fn is_recalculate_marker(&self) -> bool {
        true
    }
}

impl fmt::Display for RecalculatePathAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("recalculate path")
    }
}
