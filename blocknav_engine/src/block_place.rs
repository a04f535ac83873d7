// Placing blocks: bridging a hole and towering up.
//
// Both actions pick the softest safe full block the bot carries
// (`equip::cheapest_block_slot`), bring it into the hand and click one
// face of a neighboring block exactly once. Having nothing to place is a
// fatal `ExecutionError::MissingItem`: the graph only emits placements
// when the projected inventory had a block, so the plan and the live
// inventory disagree and replanning from the same inventory cannot help.
//
// - `BlockPlaceAction` places at a position next to the bot (the floor of
//   the next column), clicking `face` of `against`.
// - `JumpAndPlaceBelowAction` holds jump and, once the feet have risen a
//   full block, places into the position it just left. The bot lands on
//   the new block one level higher.
//
// Both complete when the level shows a full block at the position.
//
// See also: `equip.rs`, `world_action.rs`, `graph.rs` for where the
// `against` neighbor is chosen.

use crate::bot::{BotConnection, look_at};
use crate::equip::{Equipped, cheapest_block_slot, equip_slot};
use crate::error::ExecutionError;
use crate::types::{BlockFace, Vec3i};
use crate::world_action::{MOVEMENT_ALLOWED_TICKS, PLACE_ALLOWED_TICKS, WorldAction};
use std::fmt;

const WANTED_BLOCK: &str = "a safe full block";

/// Get a placeable block into the hand. `Ok(false)` when the swap spent
/// the tick.
fn ready_block(
    bot: &mut dyn BotConnection,
    action: &dyn fmt::Display,
) -> Result<bool, ExecutionError> {
    let Some(slot) = cheapest_block_slot(bot) else {
        return Err(ExecutionError::MissingItem {
            action: action.to_string(),
            wanted: WANTED_BLOCK.to_string(),
        });
    };
    Ok(equip_slot(bot, slot) == Equipped::Ready)
}

fn is_full_block_at(bot: &dyn BotConnection, pos: Vec3i) -> bool {
    bot.registry().is_full_block(bot.level().block_state(pos))
}

// ---------------------------------------------------------------------------
// Place against a neighbor
// ---------------------------------------------------------------------------

pub struct BlockPlaceAction {
    pos: Vec3i,
    against: Vec3i,
    face: BlockFace,
    placed: bool,
}

impl BlockPlaceAction {
    pub fn new(pos: Vec3i, against: Vec3i, face: BlockFace) -> Self {
        Self {
            pos,
            against,
            face,
            placed: false,
        }
    }
}

impl WorldAction for BlockPlaceAction {
    fn is_completed(&self, bot: &dyn BotConnection) -> bool {
        is_full_block_at(bot, self.pos)
    }

    fn tick(&mut self, bot: &mut dyn BotConnection) -> Result<(), ExecutionError> {
        bot.controls().reset();
        if self.placed {
            return Ok(());
        }
        if !ready_block(bot, &*self)? {
            return Ok(());
        }
        if look_at(bot, self.face.middle_of_face(self.against)) {
            bot.send_rotation();
        }
        log::debug!("{self}");
        bot.place_against(self.against, self.face);
        self.placed = true;
        Ok(())
    }

    fn allowed_ticks(&self) -> u32 {
        PLACE_ALLOWED_TICKS
    }

    fn target_position(&self) -> Option<Vec3i> {
        None
    }
}

impl fmt::Display for BlockPlaceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "place block at {} against {} {:?}",
            self.pos, self.against, self.face
        )
    }
}

// ---------------------------------------------------------------------------
// Tower
// ---------------------------------------------------------------------------

pub struct JumpAndPlaceBelowAction {
    pos: Vec3i,
    against: Vec3i,
    face: BlockFace,
    looked_down: bool,
    placed: bool,
}

impl JumpAndPlaceBelowAction {
    pub fn new(pos: Vec3i, against: Vec3i, face: BlockFace) -> Self {
        Self {
            pos,
            against,
            face,
            looked_down: false,
            placed: false,
        }
    }
}

impl WorldAction for JumpAndPlaceBelowAction {
    fn is_completed(&self, bot: &dyn BotConnection) -> bool {
        is_full_block_at(bot, self.pos)
    }

    fn tick(&mut self, bot: &mut dyn BotConnection) -> Result<(), ExecutionError> {
        bot.controls().reset();
        if self.placed {
            return Ok(());
        }
        if !ready_block(bot, &*self)? {
            return Ok(());
        }
        if !self.looked_down {
            self.looked_down = true;
            let yaw = bot.pose().yaw;
            bot.set_rotation(yaw, 90.0);
            bot.send_rotation();
        }
        bot.controls().jumping = true;
        if bot.pose().position.y >= f64::from(self.pos.y + 1) {
            log::debug!("{self}");
            bot.place_against(self.against, self.face);
            self.placed = true;
        }
        Ok(())
    }

    fn allowed_ticks(&self) -> u32 {
        MOVEMENT_ALLOWED_TICKS
    }

    fn target_position(&self) -> Option<Vec3i> {
        Some(self.pos.add(0, 1, 0))
    }
}

impl fmt::Display for JumpAndPlaceBelowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "jump and place block at {}", self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockRegistry;
    use crate::testing::{BotEvent, RecordingBot};
    use crate::types::Vec3d;
    use crate::world::BlockGrid;
    use std::sync::Arc;

    fn bot_at_hole() -> RecordingBot {
        let registry = Arc::new(BlockRegistry::standard());
        let stone = registry.state_by_name("stone").unwrap();
        let mut level = BlockGrid::new(Vec3i::new(-3, -3, -3), 7, 7, 7);
        level.fill(Vec3i::new(-3, -1, -3), Vec3i::new(3, -1, 3), stone);
        level.set(Vec3i::new(0, -1, 1), registry.state_by_name("air").unwrap());
        RecordingBot::new(registry, level, Vec3i::ZERO)
    }

    const HOLE: Vec3i = Vec3i::new(0, -1, 1);
    const BELOW_HOLE: Vec3i = Vec3i::new(0, -2, 1);

    #[test]
    fn bridges_the_hole_with_the_softest_block() {
        let mut bot = bot_at_hole();
        let stone = bot.registry.state_by_name("stone").unwrap();
        bot.level.set(BELOW_HOLE, stone);
        bot.give("cobblestone", 10);
        bot.give("dirt", 3);
        let mut action = BlockPlaceAction::new(HOLE, BELOW_HOLE, BlockFace::Top);

        // First tick selects the dirt.
        action.tick(&mut bot).unwrap();
        assert_eq!(bot.events, vec![BotEvent::SelectHotbar(1)]);
        assert!(!action.is_completed(&bot));

        action.tick(&mut bot).unwrap();
        assert!(bot.events.contains(&BotEvent::Place {
            against: BELOW_HOLE,
            face: BlockFace::Top
        }));
        assert!(action.is_completed(&bot));
        assert_eq!(bot.level.get(HOLE), bot.registry.state_by_name("dirt").unwrap());
        assert_eq!(bot.inventory.get(1).map(|s| s.count), Some(2));
    }

    #[test]
    fn places_only_once() {
        let mut bot = bot_at_hole();
        bot.give("dirt", 3);
        // Nothing below the hole to click: the place goes nowhere.
        let mut action = BlockPlaceAction::new(HOLE, Vec3i::new(0, -1, 2), BlockFace::North);
        bot.level.set(Vec3i::new(0, -1, 2), bot.registry.state_by_name("air").unwrap());
        for _ in 0..5 {
            action.tick(&mut bot).unwrap();
        }
        let places = bot
            .events
            .iter()
            .filter(|e| matches!(e, BotEvent::Place { .. }))
            .count();
        assert_eq!(places, 1);
    }

    #[test]
    fn missing_block_is_fatal() {
        let mut bot = bot_at_hole();
        bot.give("iron_pickaxe", 1);
        bot.give("sand", 64);
        let mut action = BlockPlaceAction::new(HOLE, BELOW_HOLE, BlockFace::Top);
        let err = action.tick(&mut bot).unwrap_err();
        assert!(matches!(err, ExecutionError::MissingItem { .. }));
        assert!(err.to_string().contains("place block at (0, -1, 1)"));
    }

    #[test]
    fn tower_places_once_the_feet_clear_the_block() {
        let mut bot = bot_at_hole();
        bot.give("dirt", 3);
        let feet = Vec3i::ZERO;
        let mut action = JumpAndPlaceBelowAction::new(feet, feet.sub(0, 1, 0), BlockFace::Top);
        assert_eq!(action.target_position(), Some(Vec3i::new(0, 1, 0)));

        action.tick(&mut bot).unwrap();
        assert!(bot.controls.jumping);
        assert_eq!(bot.pose.pitch, 90.0);
        assert!(!bot.events.iter().any(|e| matches!(e, BotEvent::Place { .. })));

        bot.teleport(Vec3d::new(0.5, 0.6, 0.5));
        action.tick(&mut bot).unwrap();
        assert!(!action.is_completed(&bot));

        bot.teleport(Vec3d::new(0.5, 1.1, 0.5));
        action.tick(&mut bot).unwrap();
        assert!(action.is_completed(&bot));
        assert!(bot.inventory.held().is_some_and(|s| s.count == 2));
    }

    #[test]
    fn tower_without_blocks_is_fatal() {
        let mut bot = bot_at_hole();
        let mut action =
            JumpAndPlaceBelowAction::new(Vec3i::ZERO, Vec3i::new(0, -1, 0), BlockFace::Top);
        assert!(matches!(
            action.tick(&mut bot),
            Err(ExecutionError::MissingItem { .. })
        ));
    }
}
