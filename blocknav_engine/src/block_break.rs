// Digging one block out of the way.
//
// `BlockBreakAction` runs in three phases, one or more ticks each:
//
// 1. Aim. The first tick turns the eyes to the middle of the dig face and
//    sends the rotation right away if it changed.
// 2. Equip. The fastest tool (or the empty hand) is brought into the hand
//    via `equip.rs`. A swap spends the tick.
// 3. Dig. Dig start is sent with the live tick count for the held item and
//    the bot's current mining environment. Each later tick counts down and
//    sends dig progress; the tick reaching zero sends dig completion. A
//    block that breaks in zero ticks is done on start.
//
// The action is complete once the level shows the position as free. The
// tick count is recomputed here instead of trusting the plan: the plan
// assumed an on-ground, effect-free bot.
//
// See also: `equip.rs` for tool choice, `costs.rs` for the tick formula,
// `world_action.rs` for the trait.

use crate::bot::{BotConnection, look_at};
use crate::costs::required_mining_ticks;
use crate::equip::{Equipped, best_tool_slot, equip_slot};
use crate::error::ExecutionError;
use crate::types::{BlockFace, Vec3i};
use crate::world_action::{BREAK_ALLOWED_TICKS, WorldAction};
use std::fmt;

pub struct BlockBreakAction {
    pos: Vec3i,
    face: BlockFace,
    aimed: bool,
    /// Dig ticks left; `None` until dig start has been sent.
    remaining: Option<u32>,
}

impl BlockBreakAction {
    pub fn new(pos: Vec3i, face: BlockFace) -> Self {
        Self {
            pos,
            face,
            aimed: false,
            remaining: None,
        }
    }
}

impl WorldAction for BlockBreakAction {
    fn is_completed(&self, bot: &dyn BotConnection) -> bool {
        bot.registry().is_free(bot.level().block_state(self.pos))
    }

    fn tick(&mut self, bot: &mut dyn BotConnection) -> Result<(), ExecutionError> {
        bot.controls().reset();
        if !self.aimed {
            self.aimed = true;
            if look_at(bot, self.face.middle_of_face(self.pos)) {
                bot.send_rotation();
            }
        }

        let state = bot.level().block_state(self.pos);
        let block = bot.registry().block_type_of(state).id;

        if self.remaining.is_none()
            && let Some(slot) = best_tool_slot(bot, block)
            && equip_slot(bot, slot) == Equipped::Swapped
        {
            return Ok(());
        }

        match self.remaining {
            None => {
                let env = bot.mining_environment();
                let Some(result) =
                    required_mining_ticks(bot.registry(), bot.inventory().held(), block, &env)
                else {
                    // Left to time out; the level changed under the plan.
                    log::warn!("{self}: block at {} cannot be broken", self.pos);
                    return Ok(());
                };
                log::debug!("{self}: digging for {} ticks", result.ticks);
                bot.start_breaking(self.pos, self.face);
                self.remaining = Some(result.ticks);
            }
            Some(0) => {}
            Some(ticks) => {
                let left = ticks - 1;
                if left == 0 {
                    bot.finish_breaking(self.pos, self.face);
                } else {
                    bot.continue_breaking();
                }
                self.remaining = Some(left);
            }
        }
        Ok(())
    }

    fn allowed_ticks(&self) -> u32 {
        BREAK_ALLOWED_TICKS
    }

    fn target_position(&self) -> Option<Vec3i> {
        None
    }
}

impl fmt::Display for BlockBreakAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "break block at {} from {:?}", self.pos, self.face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockRegistry;
    use crate::testing::{BotEvent, RecordingBot};
    use crate::world::BlockGrid;
    use std::sync::Arc;

    const WALL: Vec3i = Vec3i::new(0, 0, 1);

    fn bot_facing(name: &str) -> RecordingBot {
        let registry = Arc::new(BlockRegistry::standard());
        let state = registry.state_by_name(name).unwrap();
        let mut level = BlockGrid::new(Vec3i::new(-2, -2, -2), 5, 5, 5);
        level.set(WALL, state);
        RecordingBot::new(registry, level, Vec3i::ZERO)
    }

    /// Tick until done, returning the number of ticks spent.
    fn run(action: &mut BlockBreakAction, bot: &mut RecordingBot, limit: u32) -> u32 {
        let mut ticks = 0;
        while !action.is_completed(bot) {
            assert!(ticks < limit, "{action} did not finish in {limit} ticks");
            action.tick(bot).unwrap();
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn digs_dirt_by_hand() {
        let mut bot = bot_facing("dirt");
        let mut action = BlockBreakAction::new(WALL, BlockFace::North);
        // 15 dig ticks: start, 14 progress ticks, the last one finishing.
        assert_eq!(run(&mut action, &mut bot, 50), 16);

        assert_eq!(bot.events[0], BotEvent::Rotate { yaw: bot.pose.yaw, pitch: bot.pose.pitch });
        assert_eq!(bot.events[1], BotEvent::SendRotation);
        assert_eq!(bot.events[2], BotEvent::StartBreak(WALL, BlockFace::North));
        let progress = bot
            .events
            .iter()
            .filter(|e| **e == BotEvent::BreakProgress)
            .count();
        assert_eq!(progress, 14);
        assert_eq!(bot.events.last(), Some(&BotEvent::FinishBreak(WALL, BlockFace::North)));
    }

    #[test]
    fn swaps_to_the_pickaxe_first() {
        let mut bot = bot_facing("stone");
        bot.give("dirt", 4);
        bot.give("iron_pickaxe", 1);
        let mut action = BlockBreakAction::new(WALL, BlockFace::North);

        action.tick(&mut bot).unwrap();
        assert!(bot.events.contains(&BotEvent::SelectHotbar(1)));
        assert!(!bot.events.iter().any(|e| matches!(e, BotEvent::StartBreak(..))));

        bot.clear_events();
        action.tick(&mut bot).unwrap();
        assert_eq!(bot.events, vec![BotEvent::StartBreak(WALL, BlockFace::North)]);

        // 8 ticks with an iron pickaxe, one already spent on the start.
        for _ in 0..8 {
            action.tick(&mut bot).unwrap();
        }
        assert!(action.is_completed(&bot));
    }

    #[test]
    fn pickaxe_in_storage_is_clicked_into_the_hand() {
        let mut bot = bot_facing("stone");
        let pickaxe = bot.registry.item_by_name("iron_pickaxe").unwrap();
        bot.inventory.storage[30] = Some(crate::inventory::ItemStack::new(pickaxe, 1));
        let mut action = BlockBreakAction::new(WALL, BlockFace::North);

        action.tick(&mut bot).unwrap();
        assert!(bot.events.ends_with(&[BotEvent::Click(30), BotEvent::Click(0)]));
        assert_eq!(bot.inventory.held().map(|s| s.item), Some(pickaxe));
    }

    #[test]
    fn glass_by_hand_takes_nine_dig_ticks() {
        let mut bot = bot_facing("glass");
        let mut action = BlockBreakAction::new(WALL, BlockFace::North);
        assert_eq!(run(&mut action, &mut bot, 20), 10);
    }

    #[test]
    fn instant_blocks_finish_on_start() {
        let mut bot = bot_facing("dirt");
        bot.give("iron_shovel", 1);
        bot.environment.haste = Some(1);
        bot.inventory.storage[0] = bot.inventory.storage[0].take().map(|s| s.with_efficiency(5));
        let mut action = BlockBreakAction::new(WALL, BlockFace::North);
        assert_eq!(run(&mut action, &mut bot, 5), 1);
        assert!(!bot.events.iter().any(|e| matches!(e, BotEvent::FinishBreak(..))));
    }

    #[test]
    fn live_environment_slows_digging() {
        let mut bot = bot_facing("dirt");
        bot.environment.on_ground = false;
        let mut action = BlockBreakAction::new(WALL, BlockFace::North);
        // 75 dig ticks after the start tick.
        assert_eq!(run(&mut action, &mut bot, 200), 76);
    }

    #[test]
    fn unbreakable_block_waits_for_timeout() {
        let mut bot = bot_facing("bedrock");
        let mut action = BlockBreakAction::new(WALL, BlockFace::North);
        for _ in 0..5 {
            action.tick(&mut bot).unwrap();
        }
        assert!(!action.is_completed(&bot));
        assert!(!bot.events.iter().any(|e| matches!(e, BotEvent::StartBreak(..))));
    }
}
