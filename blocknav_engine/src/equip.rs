// Item selection and swapping for dig and place steps.
//
// Choosing what to hold is separate from getting it into the hand:
//
// - `best_tool_slot` scores every stack in the live inventory plus the
//   empty hand with `costs::required_mining_ticks`. The empty hand is
//   scored first and only a strictly faster stack replaces it, so ties
//   never waste a swap.
// - `cheapest_block_slot` picks the safe full block with the lowest
//   hardness: the least valuable thing to leave behind in a bridge.
// - `equip_slot` moves a slot into the hand. A hotbar slot is one held
//   slot change. A main storage slot takes the container click sequence
//   slot, held slot, and slot again if something is left on the cursor.
//
// Every swap costs the calling action its tick. The server applies the
// swap before the next dig or place packet is meaningful.
//
// See also: `block_break.rs` and `block_place.rs`, the only callers,
// `inventory.rs` for the slot layout.

use crate::block::BlockTypeId;
use crate::bot::BotConnection;
use crate::costs::required_mining_ticks;
use crate::inventory::PlayerInventory;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Equipped {
    /// Already in hand; the action can act this tick.
    Ready,
    /// A swap was sent; act next tick.
    Swapped,
}

/// Slot of the stack that breaks `block` fastest, or `None` when the
/// empty hand is at least as fast as anything carried (or nothing can
/// break it).
pub fn best_tool_slot(bot: &dyn BotConnection, block: BlockTypeId) -> Option<usize> {
    let registry = bot.registry();
    let env = bot.mining_environment();
    let mut best_ticks = required_mining_ticks(registry, None, block, &env).map(|r| r.ticks);
    let mut best_slot = None;
    for (slot, stack) in bot.inventory().storage.iter().enumerate() {
        let Some(stack) = stack else { continue };
        let Some(result) = required_mining_ticks(registry, Some(stack), block, &env) else {
            continue;
        };
        if best_ticks.is_none_or(|best| result.ticks < best) {
            best_ticks = Some(result.ticks);
            best_slot = Some(slot);
        }
    }
    best_slot
}

/// Slot holding the softest safe full block, first slot on ties.
pub fn cheapest_block_slot(bot: &dyn BotConnection) -> Option<usize> {
    let registry = bot.registry();
    bot.inventory()
        .storage
        .iter()
        .enumerate()
        .filter_map(|(slot, stack)| {
            let stack = stack.as_ref()?;
            if !registry.is_safe_full_block_item(stack.item) {
                return None;
            }
            Some((slot, registry.placed_block_hardness(stack.item)?))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(slot, _)| slot)
}

/// Bring `slot` into the hand.
pub fn equip_slot(bot: &mut dyn BotConnection, slot: usize) -> Equipped {
    let held = bot.inventory().selected;
    if slot == held {
        return Equipped::Ready;
    }
    if PlayerInventory::is_hotbar(slot) {
        log::debug!("selecting hotbar slot {slot}");
        bot.select_hotbar_slot(slot);
        return Equipped::Swapped;
    }
    log::debug!("swapping storage slot {slot} into hotbar slot {held}");
    bot.click_slot(slot);
    bot.click_slot(held);
    if bot.inventory().cursor.is_some() {
        bot.click_slot(slot);
    }
    Equipped::Swapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockRegistry;
    use crate::testing::{BotEvent, RecordingBot};
    use crate::types::Vec3i;
    use crate::world::BlockGrid;
    use std::sync::Arc;

    fn bot() -> RecordingBot {
        let registry = Arc::new(BlockRegistry::standard());
        let level = BlockGrid::new(Vec3i::new(-2, -2, -2), 5, 5, 5);
        RecordingBot::new(registry, level, Vec3i::ZERO)
    }

    #[test]
    fn fastest_tool_wins() {
        let mut bot = bot();
        bot.give("wooden_pickaxe", 1);
        bot.give("iron_pickaxe", 1);
        bot.give("iron_shovel", 1);
        let stone = bot.registry.block_by_name("stone").unwrap();
        assert_eq!(best_tool_slot(&bot, stone), Some(1));
    }

    #[test]
    fn empty_hand_wins_ties() {
        let mut bot = bot();
        bot.give("stick", 1);
        bot.give("wooden_pickaxe", 1);
        // Pickaxes do nothing for dirt, and neither does a stick.
        let dirt = bot.registry.block_by_name("dirt").unwrap();
        assert_eq!(best_tool_slot(&bot, dirt), None);
    }

    #[test]
    fn unbreakable_blocks_have_no_tool() {
        let mut bot = bot();
        bot.give("diamond_pickaxe", 1);
        let bedrock = bot.registry.block_by_name("bedrock").unwrap();
        assert_eq!(best_tool_slot(&bot, bedrock), None);
    }

    #[test]
    fn softest_block_is_placed_first() {
        let mut bot = bot();
        bot.give("iron_pickaxe", 1);
        bot.give("cobblestone", 32);
        bot.give("sand", 16);
        bot.give("dirt", 8);
        bot.give("oak_planks", 8);
        // Sand falls, so dirt (0.5) beats planks and cobblestone (2.0).
        assert_eq!(cheapest_block_slot(&bot), Some(3));
    }

    #[test]
    fn no_block_means_no_slot() {
        let mut bot = bot();
        bot.give("iron_pickaxe", 1);
        bot.give("sand", 16);
        assert_eq!(cheapest_block_slot(&bot), None);
    }

    #[test]
    fn held_slot_needs_no_swap() {
        let mut bot = bot();
        bot.give("dirt", 1);
        assert_eq!(equip_slot(&mut bot, 0), Equipped::Ready);
        assert!(bot.events.is_empty());
    }

    #[test]
    fn hotbar_slot_is_selected() {
        let mut bot = bot();
        bot.give("stick", 1);
        bot.give("dirt", 1);
        assert_eq!(equip_slot(&mut bot, 1), Equipped::Swapped);
        assert_eq!(bot.events, vec![BotEvent::SelectHotbar(1)]);
        assert_eq!(bot.inventory.held().map(|s| s.count), Some(1));
    }

    #[test]
    fn storage_slot_is_swapped_through_the_cursor() {
        let mut bot = bot();
        let stick = bot.registry.item_by_name("stick").unwrap();
        let dirt = bot.registry.item_by_name("dirt").unwrap();
        bot.give("stick", 1);
        bot.inventory.storage[20] = Some(crate::inventory::ItemStack::new(dirt, 5));

        assert_eq!(equip_slot(&mut bot, 20), Equipped::Swapped);
        assert_eq!(
            bot.events,
            vec![BotEvent::Click(20), BotEvent::Click(0), BotEvent::Click(20)]
        );
        assert_eq!(bot.inventory.held().map(|s| s.item), Some(dirt));
        assert_eq!(bot.inventory.get(20).map(|s| s.item), Some(stick));
        assert_eq!(bot.inventory.cursor, None);
    }

    #[test]
    fn storage_swap_into_empty_hand_takes_two_clicks() {
        let mut bot = bot();
        let dirt = bot.registry.item_by_name("dirt").unwrap();
        bot.inventory.storage[20] = Some(crate::inventory::ItemStack::new(dirt, 5));

        equip_slot(&mut bot, 20);
        assert_eq!(bot.events, vec![BotEvent::Click(20), BotEvent::Click(0)]);
        assert_eq!(bot.inventory.held().map(|s| s.count), Some(5));
        assert_eq!(bot.inventory.get(20), None);
    }
}
